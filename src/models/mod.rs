use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// First season with full in-match statistics (shots, fouls, cards, corners).
pub const FIRST_COMPLETE_SEASON: Season = Season(2000);

/// Full-time (or half-time) outcome of a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MatchOutcome {
    HomeWin,
    Draw,
    AwayWin,
}

impl MatchOutcome {
    /// Parse a raw result code ("H", "A" or "D").
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "H" => Some(MatchOutcome::HomeWin),
            "A" => Some(MatchOutcome::AwayWin),
            "D" => Some(MatchOutcome::Draw),
            _ => None,
        }
    }

    pub fn from_goals(home_goals: u32, away_goals: u32) -> Self {
        match home_goals.cmp(&away_goals) {
            std::cmp::Ordering::Greater => MatchOutcome::HomeWin,
            std::cmp::Ordering::Equal => MatchOutcome::Draw,
            std::cmp::Ordering::Less => MatchOutcome::AwayWin,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MatchOutcome::HomeWin => "Home win",
            MatchOutcome::Draw => "Draw",
            MatchOutcome::AwayWin => "Away win",
        }
    }
}

impl fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A competition year labelled "YYYY/YY", stored as its starting year.
///
/// Ordering is by start year, which agrees with the lexicographic order of
/// the zero-padded labels across the 1999/00 -> 2000/01 boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Season(pub u16);

impl Season {
    pub fn label(&self) -> String {
        format!("{:04}/{:02}", self.0, (self.0 + 1) % 100)
    }
}

impl FromStr for Season {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (start, end) = s
            .split_once('/')
            .ok_or_else(|| format!("season '{}' is not in YYYY/YY form", s))?;
        if start.len() != 4 || end.len() != 2 {
            return Err(format!("season '{}' is not in YYYY/YY form", s));
        }
        let start: u16 = start
            .parse()
            .map_err(|_| format!("season '{}' has a non-numeric start year", s))?;
        let end: u16 = end
            .parse()
            .map_err(|_| format!("season '{}' has a non-numeric end year", s))?;
        if (start + 1) % 100 != end {
            return Err(format!("season '{}' does not span consecutive years", s));
        }
        Ok(Season(start))
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl Serialize for Season {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

impl<'de> Deserialize<'de> for Season {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Detailed in-match statistics. Every field is absent for seasons before
/// 2000/01 and may be individually absent afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStats {
    pub home_shots: Option<u32>,
    pub away_shots: Option<u32>,
    pub home_shots_on_target: Option<u32>,
    pub away_shots_on_target: Option<u32>,
    pub home_fouls: Option<u32>,
    pub away_fouls: Option<u32>,
    pub home_corners: Option<u32>,
    pub away_corners: Option<u32>,
    pub home_yellow_cards: Option<u32>,
    pub away_yellow_cards: Option<u32>,
    pub home_red_cards: Option<u32>,
    pub away_red_cards: Option<u32>,
}

impl MatchStats {
    pub fn fields(&self) -> [Option<u32>; 12] {
        [
            self.home_shots,
            self.away_shots,
            self.home_shots_on_target,
            self.away_shots_on_target,
            self.home_fouls,
            self.away_fouls,
            self.home_corners,
            self.away_corners,
            self.home_yellow_cards,
            self.away_yellow_cards,
            self.home_red_cards,
            self.away_red_cards,
        ]
    }

    pub fn is_complete(&self) -> bool {
        self.fields().iter().all(Option::is_some)
    }
}

/// One normalized fixture. Built by the dataset loader and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub date: NaiveDate,
    pub season: Season,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u32,
    pub away_goals: u32,
    pub result: MatchOutcome,
    pub half_time_home_goals: Option<u32>,
    pub half_time_away_goals: Option<u32>,
    pub half_time_result: Option<MatchOutcome>,
    pub stats: MatchStats,
    pub referee: String,

    // Derived at load time
    pub goal_difference: i32,
    pub total_goals: u32,
    pub home_win: bool,
    pub draw: bool,
    pub away_win: bool,
    pub offensive_intensity: Option<u32>,
    pub total_fouls: Option<u32>,
    pub total_red_cards: Option<u32>,
    pub statistics_complete: bool,
    pub complete_period: bool,
}

impl MatchRecord {
    pub fn involves(&self, team: &str) -> bool {
        self.home_team == team || self.away_team == team
    }

    /// Whether `team` won this fixture, from either side.
    pub fn won_by(&self, team: &str) -> bool {
        (self.home_team == team && self.result == MatchOutcome::HomeWin)
            || (self.away_team == team && self.result == MatchOutcome::AwayWin)
    }

    pub fn goals_for(&self, team: &str) -> u32 {
        if self.home_team == team {
            self.home_goals
        } else if self.away_team == team {
            self.away_goals
        } else {
            0
        }
    }

    pub fn goals_against(&self, team: &str) -> u32 {
        if self.home_team == team {
            self.away_goals
        } else if self.away_team == team {
            self.home_goals
        } else {
            0
        }
    }
}

/// Which rows of the table an analysis runs over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Every season in the dataset (1993/94 onwards)
    #[default]
    Full,
    /// Only seasons with detailed statistics (2000/01 onwards)
    Detailed,
}

impl Scope {
    pub fn includes(&self, record: &MatchRecord) -> bool {
        match self {
            Scope::Full => true,
            Scope::Detailed => record.complete_period,
        }
    }
}

// Aggregation outputs

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonValue {
    pub season: Season,
    pub mean: f64,
    pub total: f64,
    pub matches: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamValue {
    pub team: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonChampion {
    pub season: Season,
    pub team: String,
    pub home_wins: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultDistribution {
    pub home_wins: usize,
    pub draws: usize,
    pub away_wins: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub matches: usize,
    pub seasons: usize,
    pub teams: usize,
    pub first_season: Season,
    pub last_season: Season,
    pub results: ResultDistribution,
    pub mean_home_goals: f64,
    pub mean_away_goals: f64,
    pub mean_total_goals: f64,
    pub includes_partial_seasons: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonPerformance {
    pub season: Season,
    pub games: usize,
    pub wins: usize,
    pub draws: usize,
    pub performance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvancedStats {
    pub shots_on_target: u32,
    pub efficiency: f64,
    pub yellow_cards: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamProfile {
    pub team: String,
    pub games: usize,
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
    pub performance: f64,
    pub goals_scored: u32,
    pub goals_conceded: u32,
    pub goal_difference: i64,
    pub results: ResultDistribution,
    pub seasons: Vec<SeasonPerformance>,
    pub advanced: Option<AdvancedStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meeting {
    pub date: NaiveDate,
    pub season: Season,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u32,
    pub away_goals: u32,
    pub result: MatchOutcome,
}

impl From<&MatchRecord> for Meeting {
    fn from(record: &MatchRecord) -> Self {
        Self {
            date: record.date,
            season: record.season,
            home_team: record.home_team.clone(),
            away_team: record.away_team.clone(),
            home_goals: record.home_goals,
            away_goals: record.away_goals,
            result: record.result,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadToHeadRecord {
    pub team: String,
    pub opponent: String,
    pub meetings: usize,
    pub team_wins: usize,
    pub draws: usize,
    pub opponent_wins: usize,
    pub recent: Vec<Meeting>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamComparison {
    pub first: TeamProfile,
    pub second: TeamProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TTestResult {
    pub t_statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom: f64,
    pub champions_mean: f64,
    pub others_mean: f64,
    pub champions_n: usize,
    pub others_n: usize,
    pub champions: Vec<SeasonChampion>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZTestResult {
    pub z_statistic: f64,
    pub p_value: f64,
    pub home_wins: usize,
    pub away_wins: usize,
    pub home_share: f64,
    pub away_share: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationStrength {
    Weak,
    Moderate,
    Strong,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationResult {
    pub r: f64,
    pub p_value: f64,
    pub r_squared: f64,
    pub n: usize,
    pub slope: f64,
    pub intercept: f64,
    pub strength: CorrelationStrength,
}

pub type Distribution = BTreeMap<u32, usize>;

// API Response types
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_round_trips_label() {
        let season: Season = "1999/00".parse().unwrap();
        assert_eq!(season, Season(1999));
        assert_eq!(season.to_string(), "1999/00");
        assert_eq!("2000/01".parse::<Season>().unwrap().label(), "2000/01");
    }

    #[test]
    fn test_season_order_crosses_century() {
        let late: Season = "1999/00".parse().unwrap();
        let early: Season = "2000/01".parse().unwrap();
        assert!(late < early);
        assert!(late < FIRST_COMPLETE_SEASON);
        assert_eq!(early, FIRST_COMPLETE_SEASON);
    }

    #[test]
    fn test_season_rejects_malformed_labels() {
        assert!("2000-01".parse::<Season>().is_err());
        assert!("2000/02".parse::<Season>().is_err());
        assert!("00/01".parse::<Season>().is_err());
        assert!("abcd/01".parse::<Season>().is_err());
    }

    #[test]
    fn test_outcome_codes() {
        assert_eq!(MatchOutcome::from_code("H"), Some(MatchOutcome::HomeWin));
        assert_eq!(MatchOutcome::from_code("A"), Some(MatchOutcome::AwayWin));
        assert_eq!(MatchOutcome::from_code("D"), Some(MatchOutcome::Draw));
        assert_eq!(MatchOutcome::from_code("X"), None);
        assert_eq!(MatchOutcome::from_goals(1, 1), MatchOutcome::Draw);
        assert_eq!(MatchOutcome::from_goals(0, 3), MatchOutcome::AwayWin);
    }

    #[test]
    fn test_stats_completeness() {
        let mut stats = MatchStats::default();
        assert!(!stats.is_complete());
        stats = MatchStats {
            home_shots: Some(1),
            away_shots: Some(1),
            home_shots_on_target: Some(1),
            away_shots_on_target: Some(1),
            home_fouls: Some(1),
            away_fouls: Some(1),
            home_corners: Some(1),
            away_corners: Some(1),
            home_yellow_cards: Some(1),
            away_yellow_cards: Some(1),
            home_red_cards: Some(0),
            away_red_cards: None,
        };
        assert!(!stats.is_complete());
        stats.away_red_cards = Some(0);
        assert!(stats.is_complete());
    }
}
