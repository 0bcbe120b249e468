use serde::{Deserialize, Serialize};

use crate::attribute::AttributeValues;
use crate::error::ScoreError;

pub const DEFAULT_TMAX_SECONDS: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolCategory {
    NoCode,
    LowCode,
    VibeCode,
    Code,
}

/// A playable tool card: one rating per attribute, immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCard {
    pub id: String,
    pub name: String,
    pub category: ToolCategory,
    pub ratings: AttributeValues,
    pub notes: String,
}

impl ToolCard {
    pub fn validate(&self) -> Result<(), ScoreError> {
        for (attribute, value) in self.ratings.iter() {
            if !value.is_finite()
                || value < attribute.min_rating()
                || value > attribute.max_rating()
            {
                return Err(ScoreError::Validation(format!(
                    "tool {}: {} rating {} outside {}..={}",
                    self.id,
                    attribute.name(),
                    value,
                    attribute.min_rating(),
                    attribute.max_rating()
                )));
            }
        }
        Ok(())
    }
}

/// A scenario: target attribute profile, per-attribute weights, and the
/// response-time budget in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub title: String,
    pub description: String,
    pub targets: AttributeValues,
    pub weights: AttributeValues,
    #[serde(default = "default_tmax")]
    pub tmax: f64,
}

fn default_tmax() -> f64 {
    DEFAULT_TMAX_SECONDS
}

impl Scenario {
    /// Targets share the tool rating domains. Weights are relative importance:
    /// any non-negative finite value, zero allowed per attribute, but at least
    /// one weight must be positive or accuracy is undefined.
    pub fn validate(&self) -> Result<(), ScoreError> {
        for (attribute, value) in self.targets.iter() {
            if !value.is_finite()
                || value < attribute.min_rating()
                || value > attribute.max_rating()
            {
                return Err(ScoreError::Validation(format!(
                    "scenario {}: {} target {} outside {}..={}",
                    self.id,
                    attribute.name(),
                    value,
                    attribute.min_rating(),
                    attribute.max_rating()
                )));
            }
        }

        let mut any_positive = false;
        for (attribute, weight) in self.weights.iter() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ScoreError::Validation(format!(
                    "scenario {}: {} weight {} must be finite and non-negative",
                    self.id,
                    attribute.name(),
                    weight
                )));
            }
            if weight > 0.0 {
                any_positive = true;
            }
        }
        if !any_positive {
            return Err(ScoreError::Configuration(format!(
                "scenario {}: all attribute weights are zero",
                self.id
            )));
        }

        if !self.tmax.is_finite() || self.tmax <= 0.0 {
            return Err(ScoreError::Validation(format!(
                "scenario {}: tmax {} must be positive",
                self.id, self.tmax
            )));
        }
        Ok(())
    }
}
