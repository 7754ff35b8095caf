use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

use crate::error::AggregationError;
use crate::models::{CorrelationResult, CorrelationStrength, MatchRecord, TTestResult, ZTestResult};
use crate::services::aggregations::{champion_teams, season_champions};
use crate::utils::{mean, sample_variance};

pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

pub fn is_significant(p_value: f64) -> bool {
    p_value < SIGNIFICANCE_LEVEL
}

impl CorrelationStrength {
    pub fn classify(r: f64) -> Self {
        let magnitude = r.abs();
        if magnitude > 0.7 {
            CorrelationStrength::Strong
        } else if magnitude > 0.3 {
            CorrelationStrength::Moderate
        } else {
            CorrelationStrength::Weak
        }
    }
}

fn students_t(df: f64) -> Result<StudentsT, AggregationError> {
    StudentsT::new(0.0, 1.0, df).map_err(|e| AggregationError::InsufficientData(e.to_string()))
}

/// Two-sided p-value of a t statistic.
fn two_sided_p(t: f64, df: f64) -> Result<f64, AggregationError> {
    let dist = students_t(df)?;
    Ok((2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0))
}

/// Welch's unequal-variance t-test between two samples.
/// Returns (t, two-sided p, Welch-Satterthwaite degrees of freedom).
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Result<(f64, f64, f64), AggregationError> {
    let (Some(var_a), Some(var_b)) = (sample_variance(a), sample_variance(b)) else {
        return Err(AggregationError::InsufficientData(
            "each group needs at least two observations".to_string(),
        ));
    };
    let (Some(mean_a), Some(mean_b)) = (mean(a), mean(b)) else {
        return Err(AggregationError::NoGames);
    };

    let se_a = var_a / a.len() as f64;
    let se_b = var_b / b.len() as f64;
    let se = (se_a + se_b).sqrt();
    if se == 0.0 {
        return Err(AggregationError::InsufficientData(
            "both groups have zero variance".to_string(),
        ));
    }

    let t = (mean_a - mean_b) / se;
    let df = (se_a + se_b).powi(2)
        / (se_a.powi(2) / (a.len() - 1) as f64 + se_b.powi(2) / (b.len() - 1) as f64);
    let p = two_sided_p(t, df)?;
    Ok((t, p, df))
}

/// Do champions score more at home? Splits home goals by whether the home
/// side was champion in any season of the slice and runs Welch's t-test.
pub fn champions_goals_test(rows: &[&MatchRecord]) -> Result<TTestResult, AggregationError> {
    let champions = champion_teams(rows);
    let (champion_rows, other_rows): (Vec<&MatchRecord>, Vec<&MatchRecord>) =
        rows.iter().copied().partition(|r| champions.contains(&r.home_team));

    let champion_goals: Vec<f64> = champion_rows.iter().map(|r| f64::from(r.home_goals)).collect();
    let other_goals: Vec<f64> = other_rows.iter().map(|r| f64::from(r.home_goals)).collect();

    let (t_statistic, p_value, degrees_of_freedom) = welch_t_test(&champion_goals, &other_goals)?;
    tracing::debug!(t_statistic, p_value, "champions goals t-test");

    Ok(TTestResult {
        t_statistic,
        p_value,
        degrees_of_freedom,
        champions_mean: mean(&champion_goals).unwrap_or(0.0),
        others_mean: mean(&other_goals).unwrap_or(0.0),
        champions_n: champion_goals.len(),
        others_n: other_goals.len(),
        champions: season_champions(rows),
    })
}

/// One-sided pooled two-proportion z-test: is the home win share larger
/// than the away win share? Both shares use decisive matches as the base.
pub fn home_advantage_test(rows: &[&MatchRecord]) -> Result<ZTestResult, AggregationError> {
    let home_wins = rows.iter().filter(|r| r.home_win).count();
    let away_wins = rows.iter().filter(|r| r.away_win).count();
    let n = (home_wins + away_wins) as f64;
    if n == 0.0 {
        return Err(AggregationError::InsufficientData(
            "no decisive matches in the slice".to_string(),
        ));
    }

    let home_share = home_wins as f64 / n;
    let away_share = away_wins as f64 / n;
    let pooled = (home_wins + away_wins) as f64 / (2.0 * n);
    let se = (pooled * (1.0 - pooled) * (2.0 / n)).sqrt();
    let z_statistic = (home_share - away_share) / se;

    let normal = Normal::new(0.0, 1.0).map_err(|e| AggregationError::InsufficientData(e.to_string()))?;
    let p_value = 1.0 - normal.cdf(z_statistic);

    Ok(ZTestResult {
        z_statistic,
        p_value,
        home_wins,
        away_wins,
        home_share,
        away_share,
    })
}

/// Ordinary least squares fit of `y = intercept + slope * x`.
pub fn ols_fit(x: &[f64], y: &[f64]) -> Result<(f64, f64), AggregationError> {
    let design = DMatrix::from_fn(x.len(), 2, |i, j| if j == 0 { 1.0 } else { x[i] });
    let target = DVector::from_column_slice(y);
    let normal_matrix = design.transpose() * &design;
    let moment = design.transpose() * target;
    let coefficients = normal_matrix
        .lu()
        .solve(&moment)
        .ok_or_else(|| AggregationError::InsufficientData("trendline is undetermined".to_string()))?;
    Ok((coefficients[0], coefficients[1]))
}

/// Pearson correlation between home shots on target and home goals, with
/// the OLS trendline. Needs a slice made only of seasons with detailed
/// statistics; rows missing the shot count are skipped.
pub fn shots_goals_correlation(rows: &[&MatchRecord]) -> Result<CorrelationResult, AggregationError> {
    if rows.iter().any(|r| !r.complete_period) {
        return Err(AggregationError::StatisticUnavailable(
            crate::services::Metric::ShotsOnTarget,
        ));
    }

    let (x, y): (Vec<f64>, Vec<f64>) = rows
        .iter()
        .filter_map(|r| {
            r.stats
                .home_shots_on_target
                .map(|shots| (f64::from(shots), f64::from(r.home_goals)))
        })
        .unzip();

    let n = x.len();
    if n < 3 {
        return Err(AggregationError::InsufficientData(
            "correlation needs at least three matches".to_string(),
        ));
    }

    let (Some(mean_x), Some(mean_y)) = (mean(&x), mean(&y)) else {
        return Err(AggregationError::NoGames);
    };
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (xi, yi) in x.iter().zip(&y) {
        sxy += (xi - mean_x) * (yi - mean_y);
        sxx += (xi - mean_x).powi(2);
        syy += (yi - mean_y).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return Err(AggregationError::InsufficientData(
            "correlation is undefined for a constant series".to_string(),
        ));
    }

    let r = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    let df = (n - 2) as f64;
    let p_value = if r.abs() >= 1.0 {
        0.0
    } else {
        let t = r * (df / (1.0 - r * r)).sqrt();
        two_sided_p(t, df)?
    };
    let (intercept, slope) = ols_fit(&x, &y)?;

    Ok(CorrelationResult {
        r,
        p_value,
        r_squared: r * r,
        n,
        slope,
        intercept,
        strength: CorrelationStrength::classify(r),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::sample_table;
    use crate::models::Scope;
    use crate::services::Metric;

    #[test]
    fn test_classify_strength() {
        assert_eq!(CorrelationStrength::classify(0.9), CorrelationStrength::Strong);
        assert_eq!(CorrelationStrength::classify(-0.5), CorrelationStrength::Moderate);
        assert_eq!(CorrelationStrength::classify(0.3), CorrelationStrength::Weak);
        assert!(is_significant(0.01));
        assert!(!is_significant(0.05));
    }

    #[test]
    fn test_welch_t_test_reference() {
        // scipy.stats.ttest_ind([1,2,3,4], [2,4,6,8], equal_var=False)
        let (t, p, df) = welch_t_test(&[1.0, 2.0, 3.0, 4.0], &[2.0, 4.0, 6.0, 8.0]).unwrap();
        assert!((t - (-1.7320508)).abs() < 1e-6);
        assert!((df - 4.4117647).abs() < 1e-6);
        assert!((p - 0.15158).abs() < 1e-3);
    }

    #[test]
    fn test_welch_needs_two_observations() {
        assert!(matches!(
            welch_t_test(&[1.0], &[1.0, 2.0]),
            Err(AggregationError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_champions_goals_test() {
        let table = sample_table();
        let rows = table.select(Scope::Full);
        let result = champions_goals_test(&rows).unwrap();
        assert_eq!(result.champions_n, 8);
        assert_eq!(result.others_n, 5);
        assert!((result.champions_mean - 2.125).abs() < 1e-9);
        assert!((result.others_mean - 0.6).abs() < 1e-9);
        assert!((result.t_statistic - 2.70226).abs() < 1e-3);
        assert!((result.degrees_of_freedom - 10.155188).abs() < 1e-4);
        assert!((result.p_value - 0.021946).abs() < 1e-3);
        assert_eq!(result.champions.len(), 3);
    }

    #[test]
    fn test_home_advantage_test() {
        let table = sample_table();
        let rows = table.select(Scope::Full);
        let result = home_advantage_test(&rows).unwrap();
        assert_eq!(result.home_wins, 6);
        assert_eq!(result.away_wins, 3);
        assert!((result.home_share - 2.0 / 3.0).abs() < 1e-9);
        assert!((result.z_statistic - std::f64::consts::SQRT_2).abs() < 1e-9);
        assert!((result.p_value - 0.0786496).abs() < 1e-5);
    }

    #[test]
    fn test_home_advantage_needs_decisive_matches() {
        let table = sample_table();
        let rows = vec![&table.records()[1]];
        assert!(home_advantage_test(&rows).is_err());
    }

    #[test]
    fn test_correlation_requires_detailed_slice() {
        let table = sample_table();
        let rows = table.select(Scope::Full);
        assert_eq!(
            shots_goals_correlation(&rows),
            Err(AggregationError::StatisticUnavailable(Metric::ShotsOnTarget))
        );
    }

    #[test]
    fn test_shots_goals_correlation() {
        let table = sample_table();
        let rows = table.select(Scope::Detailed);
        let result = shots_goals_correlation(&rows).unwrap();
        assert_eq!(result.n, 9);
        assert!((result.r - 0.968533).abs() < 1e-4);
        assert!((result.r_squared - result.r * result.r).abs() < 1e-12);
        assert!((result.slope - 27.333333 / 56.0).abs() < 1e-6);
        assert!((result.intercept - (-1.047619)).abs() < 1e-5);
        assert_eq!(result.strength, CorrelationStrength::Strong);
        assert!(is_significant(result.p_value));
    }

    #[test]
    fn test_ols_fit_exact_line() {
        let (intercept, slope) = ols_fit(&[0.0, 1.0, 2.0, 3.0], &[1.0, 3.0, 5.0, 7.0]).unwrap();
        assert!((intercept - 1.0).abs() < 1e-9);
        assert!((slope - 2.0).abs() < 1e-9);
    }
}
