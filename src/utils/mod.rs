use crate::error::AggregationError;

/// Points earned as a share of the points available: 3 per win, 1 per draw.
pub fn performance_percentage(wins: usize, draws: usize, games: usize) -> Result<f64, AggregationError> {
    if games == 0 {
        return Err(AggregationError::NoGames);
    }

    let points = wins * 3 + draws;
    Ok((points as f64) / ((games * 3) as f64) * 100.0)
}

/// Goals per shot on target, as a percentage. Zero shots yields 0.
pub fn efficiency(goals: u32, shots_on_target: u32) -> f64 {
    if shots_on_target == 0 {
        return 0.0;
    }
    goals as f64 / shots_on_target as f64 * 100.0
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Unbiased (n - 1) sample variance.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some(sum_sq / (values.len() - 1) as f64)
}

/// Names from `candidates` closest to `query`, best first.
pub fn closest_names<'a>(query: &str, candidates: impl IntoIterator<Item = &'a str>, limit: usize) -> Vec<String> {
    let query = query.to_lowercase();
    let mut scored: Vec<(f64, &str)> = candidates
        .into_iter()
        .map(|name| (strsim::jaro_winkler(&query, &name.to_lowercase()), name))
        .filter(|(score, _)| *score >= 0.7)
        .collect();
    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.cmp(b.1))
    });
    scored
        .into_iter()
        .take(limit)
        .map(|(_, name)| name.to_string())
        .collect()
}

/// Format a signed integer with an explicit sign (e.g. "+8", "-3", "0").
pub fn format_signed(value: i64) -> String {
    if value > 0 {
        format!("+{}", value)
    } else {
        value.to_string()
    }
}
