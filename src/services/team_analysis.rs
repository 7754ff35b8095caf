use crate::dataset::{normalize_team, TEAM_ALIASES};
use crate::error::AggregationError;
use crate::models::{
    AdvancedStats, HeadToHeadRecord, MatchOutcome, MatchRecord, Meeting, SeasonPerformance,
    TeamComparison, TeamProfile,
};
use crate::services::aggregations::{group_by_season, head_to_head, result_distribution, team_matches, teams};
use crate::utils::{closest_names, efficiency, performance_percentage};

const RECENT_MEETINGS: usize = 5;
const MAX_SUGGESTIONS: usize = 3;

/// Map user input onto a team name present in the slice: exact name, alias,
/// then case-insensitive. Unknown names come back with the closest matches.
pub fn resolve_team(rows: &[&MatchRecord], query: &str) -> Result<String, AggregationError> {
    let names = teams(rows);
    let query = query.trim();

    if names.iter().any(|n| n == query) {
        return Ok(query.to_string());
    }

    let aliased = normalize_team(query);
    if names.contains(&aliased) {
        return Ok(aliased);
    }

    if let Some(name) = names.iter().find(|n| n.eq_ignore_ascii_case(query)) {
        return Ok(name.clone());
    }

    if let Some((_, canonical)) = TEAM_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(query))
    {
        if names.iter().any(|n| n == canonical) {
            return Ok(canonical.to_string());
        }
    }

    Err(AggregationError::UnknownTeam {
        query: query.to_string(),
        suggestions: closest_names(query, names.iter().map(String::as_str), MAX_SUGGESTIONS),
    })
}

fn count_wins(games: &[&MatchRecord], team: &str) -> usize {
    games.iter().filter(|r| r.won_by(team)).count()
}

fn count_draws(games: &[&MatchRecord]) -> usize {
    games.iter().filter(|r| r.result == MatchOutcome::Draw).count()
}

/// Performance of `team` in each season it played.
pub fn season_performance(rows: &[&MatchRecord], team: &str) -> Result<Vec<SeasonPerformance>, AggregationError> {
    let games = team_matches(rows, team);
    group_by_season(&games)
        .into_iter()
        .map(|(season, season_games)| {
            let wins = count_wins(&season_games, team);
            let draws = count_draws(&season_games);
            Ok(SeasonPerformance {
                season,
                games: season_games.len(),
                wins,
                draws,
                performance: performance_percentage(wins, draws, season_games.len())?,
            })
        })
        .collect()
}

/// Shots on target, conversion and bookings. Only meaningful on a slice
/// with detailed statistics; missing values count as zero.
pub fn advanced_stats(rows: &[&MatchRecord], team: &str) -> AdvancedStats {
    let mut goals = 0;
    let mut shots_on_target = 0;
    let mut yellow_cards = 0;
    for record in rows {
        if record.home_team == team {
            goals += record.home_goals;
            shots_on_target += record.stats.home_shots_on_target.unwrap_or(0);
            yellow_cards += record.stats.home_yellow_cards.unwrap_or(0);
        } else if record.away_team == team {
            goals += record.away_goals;
            shots_on_target += record.stats.away_shots_on_target.unwrap_or(0);
            yellow_cards += record.stats.away_yellow_cards.unwrap_or(0);
        }
    }

    AdvancedStats {
        shots_on_target,
        efficiency: efficiency(goals, shots_on_target),
        yellow_cards,
    }
}

pub fn team_profile(rows: &[&MatchRecord], team: &str, detailed: bool) -> Result<TeamProfile, AggregationError> {
    let games = team_matches(rows, team);
    let wins = count_wins(&games, team);
    let draws = count_draws(&games);
    let performance = performance_percentage(wins, draws, games.len())?;

    let goals_scored: u32 = games.iter().map(|r| r.goals_for(team)).sum();
    let goals_conceded: u32 = games.iter().map(|r| r.goals_against(team)).sum();

    Ok(TeamProfile {
        team: team.to_string(),
        games: games.len(),
        wins,
        draws,
        losses: games.len() - wins - draws,
        performance,
        goals_scored,
        goals_conceded,
        goal_difference: i64::from(goals_scored) - i64::from(goals_conceded),
        results: result_distribution(&games),
        seasons: season_performance(&games, team)?,
        advanced: detailed.then(|| advanced_stats(&games, team)),
    })
}

/// Direct meetings between two teams. No meetings is a valid, empty record.
pub fn head_to_head_record(rows: &[&MatchRecord], team: &str, opponent: &str) -> HeadToHeadRecord {
    let mut meetings = head_to_head(rows, team, opponent);
    let team_wins = count_wins(&meetings, team);
    let draws = count_draws(&meetings);

    meetings.sort_by(|a, b| b.date.cmp(&a.date));
    let recent = meetings
        .iter()
        .take(RECENT_MEETINGS)
        .map(|r| Meeting::from(*r))
        .collect();

    HeadToHeadRecord {
        team: team.to_string(),
        opponent: opponent.to_string(),
        meetings: meetings.len(),
        team_wins,
        draws,
        opponent_wins: meetings.len() - team_wins - draws,
        recent,
    }
}

pub fn compare_teams(
    rows: &[&MatchRecord],
    first: &str,
    second: &str,
    detailed: bool,
) -> Result<TeamComparison, AggregationError> {
    Ok(TeamComparison {
        first: team_profile(rows, first, detailed)?,
        second: team_profile(rows, second, detailed)?,
    })
}
