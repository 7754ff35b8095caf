use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{MatchRecord, Scope};

/// A per-match statistic the dashboard can chart. Each variant knows which
/// columns feed its home-side, away-side, per-match and distribution views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    Goals,
    YellowCards,
    RedCards,
    Fouls,
    ShotsOnTarget,
    Corners,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Goals,
        Metric::YellowCards,
        Metric::RedCards,
        Metric::Fouls,
        Metric::ShotsOnTarget,
        Metric::Corners,
    ];

    /// Metrics offered for a scope. Shots on target and corners are only
    /// meaningful once detailed statistics exist.
    pub fn available_in(scope: Scope) -> Vec<Metric> {
        match scope {
            Scope::Full => vec![
                Metric::Goals,
                Metric::YellowCards,
                Metric::RedCards,
                Metric::Fouls,
            ],
            Scope::Detailed => Metric::ALL.to_vec(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Goals => "goals",
            Metric::YellowCards => "yellow cards",
            Metric::RedCards => "red cards",
            Metric::Fouls => "fouls",
            Metric::ShotsOnTarget => "shots on target",
            Metric::Corners => "corners",
        }
    }

    pub fn home_value(&self, record: &MatchRecord) -> Option<u32> {
        let stats = &record.stats;
        match self {
            Metric::Goals => Some(record.home_goals),
            Metric::YellowCards => stats.home_yellow_cards,
            Metric::RedCards => stats.home_red_cards,
            Metric::Fouls => stats.home_fouls,
            Metric::ShotsOnTarget => stats.home_shots_on_target,
            Metric::Corners => stats.home_corners,
        }
    }

    pub fn away_value(&self, record: &MatchRecord) -> Option<u32> {
        let stats = &record.stats;
        match self {
            Metric::Goals => Some(record.away_goals),
            Metric::YellowCards => stats.away_yellow_cards,
            Metric::RedCards => stats.away_red_cards,
            Metric::Fouls => stats.away_fouls,
            Metric::ShotsOnTarget => stats.away_shots_on_target,
            Metric::Corners => stats.away_corners,
        }
    }

    /// The column a histogram of this metric is drawn from.
    pub fn distribution_value(&self, record: &MatchRecord) -> Option<u32> {
        match self {
            Metric::Goals => Some(record.home_goals),
            Metric::YellowCards => record.stats.home_yellow_cards,
            Metric::RedCards => record.total_red_cards,
            Metric::Fouls => record.total_fouls,
            Metric::ShotsOnTarget => record.stats.home_shots_on_target,
            Metric::Corners => record.stats.home_corners,
        }
    }

    /// Whether any row of the slice carries a value for this metric.
    pub fn observed_in(&self, rows: &[&MatchRecord]) -> bool {
        rows.iter()
            .any(|r| self.home_value(r).is_some() || self.away_value(r).is_some())
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::sample_table;

    #[test]
    fn test_availability_by_scope() {
        let full = Metric::available_in(Scope::Full);
        assert!(full.contains(&Metric::Fouls));
        assert!(!full.contains(&Metric::Corners));
        assert!(!full.contains(&Metric::ShotsOnTarget));
        assert_eq!(Metric::available_in(Scope::Detailed).len(), Metric::ALL.len());
    }

    #[test]
    fn test_values_follow_columns() {
        let table = sample_table();
        let record = &table.records()[4];
        assert_eq!(Metric::Goals.home_value(record), Some(2));
        assert_eq!(Metric::Corners.away_value(record), Some(4));
        assert_eq!(Metric::RedCards.distribution_value(record), Some(0));
        assert_eq!(Metric::Fouls.distribution_value(record), Some(27));
    }

    #[test]
    fn test_observed_in() {
        let table = sample_table();
        let rows: Vec<_> = table.records()[..4].iter().collect();
        assert!(Metric::Goals.observed_in(&rows));
        assert!(!Metric::Corners.observed_in(&rows));
    }

    #[test]
    fn test_serde_names() {
        let metric: Metric = serde_json::from_str("\"shots-on-target\"").unwrap();
        assert_eq!(metric, Metric::ShotsOnTarget);
        assert_eq!(serde_json::to_string(&Metric::YellowCards).unwrap(), "\"yellow-cards\"");
    }
}
