use serde::Serialize;

use crate::attribute::Attribute;
use crate::error::ScoreError;
use crate::record::{Scenario, ToolCard};

pub const ACCURACY_WEIGHT: f64 = 0.7;
pub const SPEED_WEIGHT: f64 = 0.3;

/// Everything the pick-submission handler persists about a scored pick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredResponse {
    pub latency_ms: u64,
    pub accuracy: f64,
    pub time_score: f64,
    pub score: f64,
}

/// Absolute rating-vs-target distance on the raw 1-5 (or 1-4) scale.
/// Shared with the heatmap aggregator so both report the same notion of
/// mismatch.
pub fn attribute_difference(tool: &ToolCard, scenario: &Scenario, attribute: Attribute) -> f64 {
    (tool.ratings.get(attribute) - scenario.targets.get(attribute)).abs()
}

/// Weighted, range-normalized similarity between a tool's ratings and a
/// scenario's target profile, in [0,1]. Both records are validated first;
/// an all-zero weight profile is a configuration error rather than a
/// silent division by zero.
pub fn calculate_accuracy(tool: &ToolCard, scenario: &Scenario) -> Result<f64, ScoreError> {
    tool.validate()?;
    scenario.validate()?;

    let mut weighted_differences = 0.0;
    let mut weighted_range = 0.0;
    for attribute in Attribute::ALL {
        let weight = scenario.weights.get(attribute);
        weighted_differences += weight * attribute_difference(tool, scenario, attribute);
        weighted_range += weight * attribute.range();
    }

    if weighted_range <= 0.0 {
        return Err(ScoreError::Configuration(format!(
            "scenario {}: all attribute weights are zero",
            scenario.id
        )));
    }

    Ok((1.0 - weighted_differences / weighted_range).clamp(0.0, 1.0))
}

/// Linear decay from 1.0 at zero latency to 0.0 at the scenario's time
/// budget. Latency is unsigned by construction, so no upper clamp is needed.
pub fn calculate_time_score(latency_ms: u64, tmax_seconds: f64) -> f64 {
    let tmax_ms = tmax_seconds * 1000.0;
    if tmax_ms <= 0.0 {
        return 0.0;
    }
    (1.0 - (latency_ms as f64) / tmax_ms).max(0.0)
}

/// Combined 0-100 score with the fixed 0.7 accuracy / 0.3 speed blend,
/// rounded to two decimals.
pub fn calculate_final_score(accuracy: f64, time_score: f64) -> f64 {
    calculate_final_score_with_weights(accuracy, time_score, ACCURACY_WEIGHT, SPEED_WEIGHT)
}

pub fn calculate_final_score_with_weights(
    accuracy: f64,
    time_score: f64,
    accuracy_weight: f64,
    speed_weight: f64,
) -> f64 {
    round2(100.0 * (accuracy_weight * accuracy + speed_weight * time_score))
}

/// Score a single pick. Timestamps are epoch milliseconds; a submission
/// earlier than the presentation is rejected instead of producing an
/// inflated time score.
pub fn score_response(
    tool: &ToolCard,
    scenario: &Scenario,
    presented_at_ms: u64,
    submitted_at_ms: u64,
) -> Result<ScoredResponse, ScoreError> {
    if submitted_at_ms < presented_at_ms {
        return Err(ScoreError::Input(format!(
            "submitted_at_ms {submitted_at_ms} precedes presented_at_ms {presented_at_ms}"
        )));
    }
    let latency_ms = submitted_at_ms - presented_at_ms;
    let accuracy = calculate_accuracy(tool, scenario)?;
    let time_score = calculate_time_score(latency_ms, scenario.tmax);
    let score = calculate_final_score(accuracy, time_score);
    Ok(ScoredResponse {
        latency_ms,
        accuracy,
        time_score,
        score,
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
