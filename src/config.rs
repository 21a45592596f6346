//! Flow configuration: the immutable state table
//!
//! Loaded once at engine construction and validated there; the engine never
//! re-reads or self-repairs configuration.

use crate::error::{DialogError, Result};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::path::Path;

/// State id the `oos` fallback behavior jumps to.
pub const OUT_OF_SCOPE_STATE: &str = "out_of_scope";

#[derive(Debug, Clone, Deserialize)]
pub struct FlowConfig {
    pub settings: Settings,
    pub states: HashMap<String, StateDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub start_state: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateKind {
    #[default]
    Normal,
    Action,
    Terminal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateDefinition {
    #[serde(rename = "type", default)]
    pub kind: StateKind,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub transitions: Transitions,
    #[serde(default)]
    pub slot_config: HashMap<String, SlotSpec>,
    #[serde(default)]
    pub slots_required: Vec<String>,
    #[serde(default)]
    pub slots_optional: Vec<String>,
    #[serde(default)]
    pub action_name: Option<String>,
    #[serde(default)]
    pub response_function: Option<String>,
    #[serde(default)]
    pub response_template: Option<String>,
    #[serde(default)]
    pub response_prompt: Option<String>,
    #[serde(default)]
    pub fallback_behavior: FallbackBehavior,
}

/// Normal states carry an ordered rule list; action states reinterpret
/// `transitions` as a result-code → state-id map. The shape is checked
/// against the state kind during validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Transitions {
    Rules(Vec<TransitionRule>),
    ActionResults(HashMap<String, String>),
}

impl Default for Transitions {
    fn default() -> Self {
        Transitions::Rules(Vec::new())
    }
}

impl Transitions {
    /// Ordered rules of a normal/terminal state; empty for action states.
    pub fn rules(&self) -> &[TransitionRule] {
        match self {
            Transitions::Rules(rules) => rules,
            Transitions::ActionResults(_) => &[],
        }
    }

    pub fn action_results(&self) -> Option<&HashMap<String, String>> {
        match self {
            Transitions::ActionResults(map) => Some(map),
            Transitions::Rules(_) => None,
        }
    }
}

/// Ordered transition rule; declaration order is the only tie-break, and
/// intents may repeat across rules to cascade condition checks.
#[derive(Debug, Clone, Deserialize)]
pub struct TransitionRule {
    pub intent: String,
    pub target: String,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub context_updates: Option<ContextUpdates>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContextUpdates {
    #[serde(default)]
    pub clear_slots: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlotSpec {
    #[serde(default)]
    pub validator: Option<String>,
    #[serde(default)]
    pub enricher: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// What to do when no transition rule matches the classified intent.
/// Unknown strings degrade to the generic confusion path instead of failing
/// the config load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackBehavior {
    Oos,
    AskReclassify,
    #[default]
    Confused,
}

impl<'de> Deserialize<'de> for FallbackBehavior {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "oos" => FallbackBehavior::Oos,
            "ask_reclassify" => FallbackBehavior::AskReclassify,
            _ => FallbackBehavior::Confused,
        })
    }
}

impl FlowConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: FlowConfig = serde_json::from_str(raw)?;
        Ok(config)
    }

    pub fn start_state(&self) -> &str {
        &self.settings.start_state
    }

    pub fn state(&self, id: &str) -> Option<&StateDefinition> {
        self.states.get(id)
    }

    /// Structural validation, run once at engine construction. Violations
    /// are fatal: the engine never attempts self-repair at turn time.
    pub fn validate(&self) -> Result<()> {
        if !self.states.contains_key(&self.settings.start_state) {
            return Err(DialogError::Config(format!(
                "start_state '{}' is not a defined state",
                self.settings.start_state
            )));
        }

        let mut needs_out_of_scope = false;

        for (id, state) in &self.states {
            match state.kind {
                StateKind::Action => {
                    if state.action_name.is_none() {
                        return Err(DialogError::Config(format!(
                            "action state '{}' has no action_name",
                            id
                        )));
                    }
                    let Some(results) = state.transitions.action_results() else {
                        return Err(DialogError::Config(format!(
                            "action state '{}' must map action results to states",
                            id
                        )));
                    };
                    for (result, target) in results {
                        if !self.states.contains_key(target) {
                            return Err(DialogError::Config(format!(
                                "action state '{}' result '{}' targets undefined state '{}'",
                                id, result, target
                            )));
                        }
                    }
                }
                StateKind::Normal | StateKind::Terminal => {
                    if state.transitions.action_results().is_some() {
                        return Err(DialogError::Config(format!(
                            "state '{}' is not an action state but declares a result map",
                            id
                        )));
                    }
                    for rule in state.transitions.rules() {
                        if !self.states.contains_key(&rule.target) {
                            return Err(DialogError::Config(format!(
                                "state '{}' transition on '{}' targets undefined state '{}'",
                                id, rule.intent, rule.target
                            )));
                        }
                    }
                }
            }

            if state.fallback_behavior == FallbackBehavior::Oos {
                needs_out_of_scope = true;
            }
        }

        if needs_out_of_scope && !self.states.contains_key(OUT_OF_SCOPE_STATE) {
            return Err(DialogError::Config(format!(
                "a state uses the 'oos' fallback but no '{}' state is defined",
                OUT_OF_SCOPE_STATE
            )));
        }

        Ok(())
    }
}
