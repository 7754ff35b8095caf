use chrono::NaiveDate;
use serde::Deserialize;
use std::env;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::DataLoadError;
use crate::models::{MatchOutcome, MatchRecord, MatchStats, Scope, Season, FIRST_COMPLETE_SEASON};

pub const DEFAULT_DATASET_PATH: &str = "data/england.csv";
pub const DATE_FORMAT: &str = "%d/%m/%Y";
pub const UNKNOWN_REFEREE: &str = "Unknown";

/// Historical club renamings. Applied to both team columns before any
/// grouping, otherwise a club's history splits across two names.
pub const TEAM_ALIASES: &[(&str, &str)] = &[
    ("Brighton", "Brighton & Hove Albion"),
    ("Ipswich", "Ipswich Town"),
];

/// Every header the source must carry. Values of the statistical columns,
/// the half-time columns and the referee may be blank.
pub const REQUIRED_COLUMNS: [&str; 23] = [
    "Date",
    "Season",
    "HomeTeam",
    "AwayTeam",
    "FTH Goals",
    "FTA Goals",
    "FT Result",
    "HTH Goals",
    "HTA Goals",
    "HT Result",
    "H Shots",
    "A Shots",
    "H SOT",
    "A SOT",
    "H Fouls",
    "A Fouls",
    "H Corners",
    "A Corners",
    "H Yellow",
    "A Yellow",
    "H Red",
    "A Red",
    "Referee",
];

static DATASET: OnceLock<MatchTable> = OnceLock::new();

/// Resolve the dataset location: explicit flag, then `PLSTATS_DATASET`,
/// then the bundled default.
pub fn dataset_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| env::var("PLSTATS_DATASET").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET_PATH))
}

/// Load the table on first use and hand out the same instance for the rest
/// of the process.
pub fn global(path: &Path) -> Result<&'static MatchTable, DataLoadError> {
    if let Some(table) = DATASET.get() {
        return Ok(table);
    }
    let table = load_matches(path)?;
    Ok(DATASET.get_or_init(|| table))
}

/// The normalized, immutable match table.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchTable {
    records: Vec<MatchRecord>,
}

impl MatchTable {
    pub fn new(records: Vec<MatchRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Read-only view of the rows in `scope`.
    pub fn select(&self, scope: Scope) -> Vec<&MatchRecord> {
        self.select_from(scope, None)
    }

    /// Read-only view of the rows in `scope` from season `from` onwards.
    pub fn select_from(&self, scope: Scope, from: Option<Season>) -> Vec<&MatchRecord> {
        self.records
            .iter()
            .filter(|r| scope.includes(r))
            .filter(|r| from.map_or(true, |season| r.season >= season))
            .collect()
    }
}

// ── raw CSV row ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawMatch {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Season")]
    season: String,
    #[serde(rename = "HomeTeam")]
    home_team: String,
    #[serde(rename = "AwayTeam")]
    away_team: String,
    #[serde(rename = "FTH Goals")]
    home_goals: u32,
    #[serde(rename = "FTA Goals")]
    away_goals: u32,
    #[serde(rename = "FT Result")]
    result: String,
    #[serde(rename = "HTH Goals")]
    half_time_home_goals: Option<u32>,
    #[serde(rename = "HTA Goals")]
    half_time_away_goals: Option<u32>,
    #[serde(rename = "HT Result")]
    half_time_result: Option<String>,
    #[serde(rename = "H Shots")]
    home_shots: Option<u32>,
    #[serde(rename = "A Shots")]
    away_shots: Option<u32>,
    #[serde(rename = "H SOT")]
    home_shots_on_target: Option<u32>,
    #[serde(rename = "A SOT")]
    away_shots_on_target: Option<u32>,
    #[serde(rename = "H Fouls")]
    home_fouls: Option<u32>,
    #[serde(rename = "A Fouls")]
    away_fouls: Option<u32>,
    #[serde(rename = "H Corners")]
    home_corners: Option<u32>,
    #[serde(rename = "A Corners")]
    away_corners: Option<u32>,
    #[serde(rename = "H Yellow")]
    home_yellow_cards: Option<u32>,
    #[serde(rename = "A Yellow")]
    away_yellow_cards: Option<u32>,
    #[serde(rename = "H Red")]
    home_red_cards: Option<u32>,
    #[serde(rename = "A Red")]
    away_red_cards: Option<u32>,
    #[serde(rename = "Referee")]
    referee: Option<String>,
}

// ── loading ─────────────────────────────────────────────────────────────────

pub fn load_matches(path: &Path) -> Result<MatchTable, DataLoadError> {
    let file = File::open(path).map_err(|source| DataLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let table = load_matches_from_reader(file)?;
    tracing::info!("Loaded {} matches from {}", table.len(), path.display());
    Ok(table)
}

pub fn load_matches_from_reader<R: Read>(rdr: R) -> Result<MatchTable, DataLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(rdr);

    let headers = reader.headers()?.clone();
    if let Some(missing) = REQUIRED_COLUMNS
        .iter()
        .find(|column| !headers.iter().any(|h| h == **column))
    {
        return Err(DataLoadError::MissingColumn(missing.to_string()));
    }

    let mut records = Vec::new();
    for (index, result) in reader.deserialize::<RawMatch>().enumerate() {
        // Header occupies line 1
        let row = index + 2;
        records.push(normalize(result?, row)?);
    }

    let incomplete = records.iter().filter(|r| !r.statistics_complete).count();
    if incomplete > 0 {
        tracing::debug!("{} matches lack detailed statistics", incomplete);
    }

    Ok(MatchTable::new(records))
}

/// Map a raw team name through the alias table.
pub fn normalize_team(raw: &str) -> String {
    let name = raw.trim();
    TEAM_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| name.to_string())
}

fn normalize(raw: RawMatch, row: usize) -> Result<MatchRecord, DataLoadError> {
    let referee = raw
        .referee
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_REFEREE.to_string());

    let stats = MatchStats {
        home_shots: raw.home_shots,
        away_shots: raw.away_shots,
        home_shots_on_target: raw.home_shots_on_target,
        away_shots_on_target: raw.away_shots_on_target,
        home_fouls: raw.home_fouls,
        away_fouls: raw.away_fouls,
        home_corners: raw.home_corners,
        away_corners: raw.away_corners,
        home_yellow_cards: raw.home_yellow_cards,
        away_yellow_cards: raw.away_yellow_cards,
        home_red_cards: raw.home_red_cards,
        away_red_cards: raw.away_red_cards,
    };

    let goal_difference = raw.home_goals as i32 - raw.away_goals as i32;
    let total_goals = raw.home_goals + raw.away_goals;
    let home_win = goal_difference > 0;
    let draw = goal_difference == 0;
    let away_win = goal_difference < 0;
    let offensive_intensity = sum_pair(stats.home_shots_on_target, stats.away_shots_on_target);
    let total_fouls = sum_pair(stats.home_fouls, stats.away_fouls);
    let total_red_cards = sum_pair(stats.home_red_cards, stats.away_red_cards);

    let date = NaiveDate::parse_from_str(&raw.date, DATE_FORMAT).map_err(|_| {
        DataLoadError::InvalidDate {
            row,
            value: raw.date.clone(),
        }
    })?;

    let result = MatchOutcome::from_code(&raw.result).ok_or_else(|| DataLoadError::InvalidResult {
        row,
        value: raw.result.clone(),
    })?;
    if result != MatchOutcome::from_goals(raw.home_goals, raw.away_goals) {
        return Err(DataLoadError::InconsistentResult { row });
    }

    let half_time_result = match raw.half_time_result.as_deref().filter(|code| !code.is_empty()) {
        Some(code) => Some(MatchOutcome::from_code(code).ok_or_else(|| {
            DataLoadError::InvalidResult {
                row,
                value: code.to_string(),
            }
        })?),
        None => None,
    };

    let home_team = normalize_team(&raw.home_team);
    let away_team = normalize_team(&raw.away_team);
    if home_team.is_empty() || away_team.is_empty() {
        return Err(DataLoadError::EmptyTeamName { row });
    }

    let season: Season = raw
        .season
        .parse()
        .map_err(|reason| DataLoadError::InvalidSeason { row, reason })?;

    let statistics_complete = stats.is_complete();
    let complete_period = season >= FIRST_COMPLETE_SEASON;

    Ok(MatchRecord {
        date,
        season,
        home_team,
        away_team,
        home_goals: raw.home_goals,
        away_goals: raw.away_goals,
        result,
        half_time_home_goals: raw.half_time_home_goals,
        half_time_away_goals: raw.half_time_away_goals,
        half_time_result,
        stats,
        referee,
        goal_difference,
        total_goals,
        home_win,
        draw,
        away_win,
        offensive_intensity,
        total_fouls,
        total_red_cards,
        statistics_complete,
        complete_period,
    })
}

fn sum_pair(home: Option<u32>, away: Option<u32>) -> Option<u32> {
    Some(home? + away?)
}
