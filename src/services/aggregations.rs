use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::AggregationError;
use crate::models::{
    Distribution, MatchRecord, Overview, ResultDistribution, Season, SeasonChampion, SeasonValue,
    TeamValue,
};
use crate::services::Metric;
use crate::utils::mean;

/// Rows grouped by season, in season order.
pub fn group_by_season<'a>(rows: &[&'a MatchRecord]) -> BTreeMap<Season, Vec<&'a MatchRecord>> {
    let mut groups: BTreeMap<Season, Vec<&MatchRecord>> = BTreeMap::new();
    for record in rows.iter().copied() {
        groups.entry(record.season).or_default().push(record);
    }
    groups
}

/// Per-season mean and total of a metric.
///
/// Goals use the per-match total. Other metrics average the home-side and
/// away-side means, each skipping missing values; seasons without any
/// observation are left out.
pub fn season_trend(rows: &[&MatchRecord], metric: Metric) -> Result<Vec<SeasonValue>, AggregationError> {
    if !rows.is_empty() && !metric.observed_in(rows) {
        return Err(AggregationError::StatisticUnavailable(metric));
    }

    let mut trend = Vec::new();
    for (season, games) in group_by_season(rows) {
        let home: Vec<f64> = games.iter().filter_map(|r| metric.home_value(r)).map(f64::from).collect();
        let away: Vec<f64> = games.iter().filter_map(|r| metric.away_value(r)).map(f64::from).collect();

        let value = match metric {
            Metric::Goals => {
                let totals: Vec<f64> = games.iter().map(|r| f64::from(r.total_goals)).collect();
                mean(&totals)
            }
            _ => {
                let side_means: Vec<f64> = [mean(&home), mean(&away)].into_iter().flatten().collect();
                mean(&side_means)
            }
        };

        if let Some(value) = value {
            trend.push(SeasonValue {
                season,
                mean: value,
                total: home.iter().sum::<f64>() + away.iter().sum::<f64>(),
                matches: games.len(),
            });
        }
    }

    Ok(trend)
}

/// Metric totals per team, merging home-role and away-role contributions.
/// A team seen in only one role keeps zero for the other. Sorted by value,
/// highest first, then by name.
pub fn team_totals(rows: &[&MatchRecord], metric: Metric) -> Result<Vec<TeamValue>, AggregationError> {
    if !rows.is_empty() && !metric.observed_in(rows) {
        return Err(AggregationError::StatisticUnavailable(metric));
    }

    let mut totals: HashMap<&str, f64> = HashMap::new();
    for record in rows {
        *totals.entry(record.home_team.as_str()).or_insert(0.0) +=
            metric.home_value(record).map_or(0.0, f64::from);
        *totals.entry(record.away_team.as_str()).or_insert(0.0) +=
            metric.away_value(record).map_or(0.0, f64::from);
    }

    let mut ranked: Vec<TeamValue> = totals
        .into_iter()
        .map(|(team, value)| TeamValue {
            team: team.to_string(),
            value,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.team.cmp(&b.team))
    });
    Ok(ranked)
}

pub fn top_teams(rows: &[&MatchRecord], metric: Metric, limit: usize) -> Result<Vec<TeamValue>, AggregationError> {
    let mut ranked = team_totals(rows, metric)?;
    ranked.truncate(limit);
    Ok(ranked)
}

/// Value counts of the metric's distribution column.
pub fn distribution(rows: &[&MatchRecord], metric: Metric) -> Result<Distribution, AggregationError> {
    let mut counts = Distribution::new();
    for value in rows.iter().filter_map(|r| metric.distribution_value(r)) {
        *counts.entry(value).or_insert(0) += 1;
    }
    if counts.is_empty() && !rows.is_empty() {
        return Err(AggregationError::StatisticUnavailable(metric));
    }
    Ok(counts)
}

/// Per season, the team with the most home wins. Ties go to the
/// alphabetically first team.
pub fn season_champions(rows: &[&MatchRecord]) -> Vec<SeasonChampion> {
    let mut home_wins: BTreeMap<Season, BTreeMap<&str, u32>> = BTreeMap::new();
    for record in rows {
        *home_wins
            .entry(record.season)
            .or_default()
            .entry(record.home_team.as_str())
            .or_insert(0) += u32::from(record.home_win);
    }

    home_wins
        .into_iter()
        .filter_map(|(season, teams)| {
            let mut best: Option<(&str, u32)> = None;
            for (team, wins) in teams {
                if best.map_or(true, |(_, top)| wins > top) {
                    best = Some((team, wins));
                }
            }
            best.map(|(team, wins)| SeasonChampion {
                season,
                team: team.to_string(),
                home_wins: wins,
            })
        })
        .collect()
}

/// Teams that were champion in at least one season of the slice.
pub fn champion_teams(rows: &[&MatchRecord]) -> BTreeSet<String> {
    season_champions(rows).into_iter().map(|c| c.team).collect()
}

/// Matches between two teams, in either home/away order.
pub fn head_to_head<'a>(rows: &[&'a MatchRecord], team_a: &str, team_b: &str) -> Vec<&'a MatchRecord> {
    rows.iter()
        .copied()
        .filter(|r| {
            (r.home_team == team_a && r.away_team == team_b)
                || (r.home_team == team_b && r.away_team == team_a)
        })
        .collect()
}

/// Matches played by one team.
pub fn team_matches<'a>(rows: &[&'a MatchRecord], team: &str) -> Vec<&'a MatchRecord> {
    rows.iter().copied().filter(|r| r.involves(team)).collect()
}

/// Sorted unique team names from both columns.
pub fn teams(rows: &[&MatchRecord]) -> Vec<String> {
    let names: BTreeSet<&str> = rows
        .iter()
        .flat_map(|r| [r.home_team.as_str(), r.away_team.as_str()])
        .collect();
    names.into_iter().map(String::from).collect()
}

pub fn result_distribution(rows: &[&MatchRecord]) -> ResultDistribution {
    ResultDistribution {
        home_wins: rows.iter().filter(|r| r.home_win).count(),
        draws: rows.iter().filter(|r| r.draw).count(),
        away_wins: rows.iter().filter(|r| r.away_win).count(),
    }
}

/// True when the slice reaches back before detailed statistics were kept.
pub fn includes_partial_seasons(rows: &[&MatchRecord]) -> bool {
    rows.iter().any(|r| !r.complete_period)
}

pub fn overview(rows: &[&MatchRecord]) -> Result<Overview, AggregationError> {
    let first_season = rows.iter().map(|r| r.season).min().ok_or(AggregationError::NoGames)?;
    let last_season = rows.iter().map(|r| r.season).max().ok_or(AggregationError::NoGames)?;

    let home: Vec<f64> = rows.iter().map(|r| f64::from(r.home_goals)).collect();
    let away: Vec<f64> = rows.iter().map(|r| f64::from(r.away_goals)).collect();
    let mean_home_goals = mean(&home).ok_or(AggregationError::NoGames)?;
    let mean_away_goals = mean(&away).ok_or(AggregationError::NoGames)?;

    Ok(Overview {
        matches: rows.len(),
        seasons: group_by_season(rows).len(),
        teams: teams(rows).len(),
        first_season,
        last_season,
        results: result_distribution(rows),
        mean_home_goals,
        mean_away_goals,
        mean_total_goals: mean_home_goals + mean_away_goals,
        includes_partial_seasons: includes_partial_seasons(rows),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::sample_table;
    use crate::models::Scope;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_goals_trend_per_season() {
        let table = sample_table();
        let rows = table.select(Scope::Full);
        let trend = season_trend(&rows, Metric::Goals).unwrap();
        let labels: Vec<String> = trend.iter().map(|s| s.season.label()).collect();
        assert_eq!(labels, vec!["1999/00", "2000/01", "2001/02"]);
        assert!(approx(trend[0].mean, 2.5));
        assert!(approx(trend[0].total, 10.0));
        assert_eq!(trend[0].matches, 4);
        assert!(approx(trend[1].mean, 2.25));
        assert!(approx(trend[2].mean, 2.2));
    }

    #[test]
    fn test_stat_trend_skips_seasons_without_data() {
        let table = sample_table();
        let rows = table.select(Scope::Full);
        let trend = season_trend(&rows, Metric::Corners).unwrap();
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].season, Season(2000));
        // home mean 5.25, away mean 3.75
        assert!(approx(trend[0].mean, 4.5));
        assert!(approx(trend[0].total, 36.0));
    }

    #[test]
    fn test_trend_unavailable_without_statistics() {
        let table = sample_table();
        let rows: Vec<_> = table.records()[..4].iter().collect();
        assert_eq!(
            season_trend(&rows, Metric::Fouls),
            Err(AggregationError::StatisticUnavailable(Metric::Fouls))
        );
        assert!(team_totals(&rows, Metric::YellowCards).is_err());
    }

    #[test]
    fn test_team_totals_merge_home_and_away() {
        let table = sample_table();
        let rows = table.select(Scope::Full);
        let totals = team_totals(&rows, Metric::Goals).unwrap();
        let ranked: Vec<(&str, f64)> = totals.iter().map(|t| (t.team.as_str(), t.value)).collect();
        assert_eq!(
            ranked,
            vec![
                ("Arsenal", 13.0),
                ("Chelsea", 9.0),
                ("Brighton & Hove Albion", 3.0),
                ("Liverpool", 3.0),
                ("Ipswich Town", 2.0),
            ]
        );
        assert_eq!(top_teams(&rows, Metric::Goals, 2).unwrap().len(), 2);
    }

    #[test]
    fn test_team_in_one_role_is_kept() {
        let table = sample_table();
        let rows = vec![&table.records()[7]];
        let totals = team_totals(&rows, Metric::Goals).unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].team, "Ipswich Town");
        assert_eq!(totals[0].value, 1.0);
        assert_eq!(totals[1].team, "Brighton & Hove Albion");
        assert_eq!(totals[1].value, 0.0);
    }

    #[test]
    fn test_alias_totals_equal_sum_of_raw_names() {
        let raw = crate::dataset::fixtures::SAMPLE_CSV;
        let mut per_raw_name: HashMap<String, u32> = HashMap::new();
        for line in raw.lines().skip(1) {
            let fields: Vec<&str> = line.split(',').collect();
            *per_raw_name.entry(fields[2].to_string()).or_default() += fields[4].parse::<u32>().unwrap();
            *per_raw_name.entry(fields[3].to_string()).or_default() += fields[5].parse::<u32>().unwrap();
        }
        let raw_sum = per_raw_name["Brighton"] + per_raw_name["Brighton & Hove Albion"];

        let table = sample_table();
        let rows = table.select(Scope::Full);
        let totals = team_totals(&rows, Metric::Goals).unwrap();
        let merged = totals.iter().find(|t| t.team == "Brighton & Hove Albion").unwrap();
        assert_eq!(merged.value, f64::from(raw_sum));
        assert!(totals.iter().all(|t| t.team != "Brighton"));
    }

    #[test]
    fn test_distribution_counts() {
        let table = sample_table();
        let rows = table.select(Scope::Full);
        let counts = distribution(&rows, Metric::Goals).unwrap();
        assert_eq!(counts.get(&0), Some(&3));
        assert_eq!(counts.get(&1), Some(&4));
        assert_eq!(counts.get(&2), Some(&3));
        assert_eq!(counts.get(&3), Some(&2));
        assert_eq!(counts.get(&4), Some(&1));

        let early: Vec<_> = table.records()[..4].iter().collect();
        assert!(distribution(&early, Metric::RedCards).is_err());
    }

    #[test]
    fn test_champions_per_season() {
        let table = sample_table();
        let rows = table.select(Scope::Full);
        let champions = season_champions(&rows);
        let winners: Vec<(String, &str, u32)> = champions
            .iter()
            .map(|c| (c.season.label(), c.team.as_str(), c.home_wins))
            .collect();
        assert_eq!(
            winners,
            vec![
                ("1999/00".to_string(), "Arsenal", 2),
                ("2000/01".to_string(), "Chelsea", 2),
                // Arsenal and Liverpool tie on one home win
                ("2001/02".to_string(), "Arsenal", 1),
            ]
        );
    }

    #[test]
    fn test_champion_flag_spans_seasons() {
        let table = sample_table();
        let rows = table.select(Scope::Full);
        let champions = champion_teams(&rows);
        assert!(champions.contains("Arsenal"));
        assert!(champions.contains("Chelsea"));
        assert!(!champions.contains("Liverpool"));
        assert!(!champions.contains("Ipswich Town"));
    }

    #[test]
    fn test_champion_two_seasons_two_teams() {
        let first = sample_table().records()[0].clone();
        let mut second = first.clone();
        second.season = Season(2000);
        second.home_team = "Leeds".to_string();
        let rows = vec![&first, &second];
        let champions = champion_teams(&rows);
        assert!(champions.contains("Arsenal"));
        assert!(champions.contains("Leeds"));
        assert!(!champions.contains("Chelsea"));
    }

    #[test]
    fn test_head_to_head_is_symmetric() {
        let table = sample_table();
        let rows = table.select(Scope::Full);
        let ab = head_to_head(&rows, "Arsenal", "Chelsea");
        let ba = head_to_head(&rows, "Chelsea", "Arsenal");
        assert_eq!(ab.len(), 4);
        assert_eq!(ab, ba);
        assert!(head_to_head(&rows, "Ipswich Town", "Arsenal").is_empty());
    }

    #[test]
    fn test_teams_and_overview() {
        let table = sample_table();
        let rows = table.select(Scope::Full);
        assert_eq!(
            teams(&rows),
            vec!["Arsenal", "Brighton & Hove Albion", "Chelsea", "Ipswich Town", "Liverpool"]
        );

        let summary = overview(&rows).unwrap();
        assert_eq!(summary.matches, 13);
        assert_eq!(summary.seasons, 3);
        assert_eq!(summary.teams, 5);
        assert_eq!(summary.first_season.label(), "1999/00");
        assert_eq!(summary.last_season.label(), "2001/02");
        assert_eq!(summary.results.home_wins, 6);
        assert_eq!(summary.results.draws, 4);
        assert_eq!(summary.results.away_wins, 3);
        assert!(approx(summary.mean_home_goals, 20.0 / 13.0));
        assert!(approx(summary.mean_away_goals, 10.0 / 13.0));
        assert!(summary.includes_partial_seasons);

        let detailed = table.select(Scope::Detailed);
        assert!(!includes_partial_seasons(&detailed));
    }

    #[test]
    fn test_overview_of_empty_slice() {
        assert_eq!(overview(&[]), Err(AggregationError::NoGames));
    }
}
