use std::collections::HashSet;
use std::fs;
use std::path::Path;

use rand::seq::SliceRandom;
use thiserror::Error;
use toolpick_core::{Scenario, ToolCard};

pub const BUILTIN_TOOLS_JSON: &str = include_str!("../../../content/deck.tools.json");
pub const BUILTIN_SCENARIOS_JSON: &str = include_str!("../../../content/scenarios.json");

pub const TOOLS_FILE: &str = "deck.tools.json";
pub const SCENARIOS_FILE: &str = "scenarios.json";

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("content parse error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid content: {0}")]
    Invalid(String),
}

/// Immutable snapshot of the playable decks, validated once at construction.
/// There is no ambient cache: callers own the snapshot and decide when to
/// build a fresh one via `load_from_dir`.
#[derive(Debug, Clone)]
pub struct ContentSet {
    tools: Vec<ToolCard>,
    scenarios: Vec<Scenario>,
}

impl ContentSet {
    /// The decks compiled into the binary.
    pub fn builtin() -> Result<Self, ContentError> {
        Self::from_json(BUILTIN_TOOLS_JSON, BUILTIN_SCENARIOS_JSON)
    }

    pub fn from_json(tools_json: &str, scenarios_json: &str) -> Result<Self, ContentError> {
        let tools: Vec<ToolCard> = serde_json::from_str(tools_json)?;
        let scenarios: Vec<Scenario> = serde_json::from_str(scenarios_json)?;
        Self::from_records(tools, scenarios)
    }

    /// Reload operation: read `deck.tools.json` and `scenarios.json` from a
    /// directory and build a new snapshot.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self, ContentError> {
        let dir = dir.as_ref();
        let tools_json = fs::read_to_string(dir.join(TOOLS_FILE))?;
        let scenarios_json = fs::read_to_string(dir.join(SCENARIOS_FILE))?;
        Self::from_json(&tools_json, &scenarios_json)
    }

    pub fn from_records(
        tools: Vec<ToolCard>,
        scenarios: Vec<Scenario>,
    ) -> Result<Self, ContentError> {
        if tools.is_empty() {
            return Err(ContentError::Invalid("tool deck is empty".to_string()));
        }
        if scenarios.is_empty() {
            return Err(ContentError::Invalid("scenario deck is empty".to_string()));
        }

        let mut seen = HashSet::new();
        for tool in &tools {
            if !seen.insert(tool.id.clone()) {
                return Err(ContentError::Invalid(format!(
                    "duplicate tool id: {}",
                    tool.id
                )));
            }
            tool.validate()
                .map_err(|err| ContentError::Invalid(err.to_string()))?;
        }

        let mut seen = HashSet::new();
        for scenario in &scenarios {
            if !seen.insert(scenario.id.clone()) {
                return Err(ContentError::Invalid(format!(
                    "duplicate scenario id: {}",
                    scenario.id
                )));
            }
            scenario
                .validate()
                .map_err(|err| ContentError::Invalid(err.to_string()))?;
        }

        Ok(Self { tools, scenarios })
    }

    pub fn tools(&self) -> &[ToolCard] {
        &self.tools
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn tool_by_id(&self, id: &str) -> Option<&ToolCard> {
        self.tools.iter().find(|tool| tool.id == id)
    }

    pub fn scenario_by_id(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|scenario| scenario.id == id)
    }

    /// Uniform draw over the scenarios not in `exclude_ids`; `None` once the
    /// pool is exhausted.
    pub fn random_scenario(&self, exclude_ids: &[String]) -> Option<&Scenario> {
        let pool: Vec<&Scenario> = self
            .scenarios
            .iter()
            .filter(|scenario| !exclude_ids.iter().any(|id| *id == scenario.id))
            .collect();
        pool.choose(&mut rand::thread_rng()).copied()
    }
}
