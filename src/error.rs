use thiserror::Error;

use crate::services::Metric;

/// Failure to build the match table. Always fatal: no partial table is
/// handed back.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("required column '{0}' is missing from the dataset")]
    MissingColumn(String),

    #[error("row {row}: unparseable date '{value}' (expected DD/MM/YYYY)")]
    InvalidDate { row: usize, value: String },

    #[error("row {row}: {reason}")]
    InvalidSeason { row: usize, reason: String },

    #[error("row {row}: invalid result code '{value}' (expected H, A or D)")]
    InvalidResult { row: usize, value: String },

    #[error("row {row}: result code disagrees with the final score")]
    InconsistentResult { row: usize },

    #[error("row {row}: empty team name")]
    EmptyTeamName { row: usize },
}

/// Recoverable failure of a single aggregation over a slice.
#[derive(Debug, Error, PartialEq)]
pub enum AggregationError {
    #[error("{0} data is not available for the selected period")]
    StatisticUnavailable(Metric),

    #[error("no games in the selected slice")]
    NoGames,

    #[error("not enough data: {0}")]
    InsufficientData(String),

    #[error("unknown team '{query}'{}", format_suggestions(.suggestions))]
    UnknownTeam {
        query: String,
        suggestions: Vec<String>,
    },
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}
