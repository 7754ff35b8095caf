pub mod aggregations;
pub mod hypothesis;
pub mod metrics;
pub mod team_analysis;

pub use aggregations::*;
pub use hypothesis::*;
pub use metrics::*;
pub use team_analysis::*;
