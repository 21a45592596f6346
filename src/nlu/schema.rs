//! Extraction schema derived from a state definition
//!
//! Tells the NLU collaborator which slots to look for (with human-readable
//! descriptions) and which intent labels the current state permits.

use crate::config::StateDefinition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label the collaborator should use when the utterance matches none of the
/// permitted intents. Always part of the label set.
pub const UNKNOWN_INTENT: &str = "unknown";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSchema {
    /// Slot name → natural-language extraction description.
    pub entities: BTreeMap<String, String>,
    /// Permitted intent labels for the current state, `unknown` included.
    pub intent_labels: Vec<String>,
}

impl ExtractionSchema {
    pub fn for_state(state: &StateDefinition) -> Self {
        let mut entities = BTreeMap::new();
        for slot in state.slots_required.iter().chain(&state.slots_optional) {
            let description = state
                .slot_config
                .get(slot)
                .and_then(|spec| spec.description.clone())
                .unwrap_or_else(|| format!("Extract the {} from the text", slot));
            entities.insert(slot.clone(), description);
        }

        // Intents may repeat across rules (cascading conditions); the label
        // set carries each once, in declaration order.
        let mut intent_labels: Vec<String> = Vec::new();
        for rule in state.transitions.rules() {
            if !intent_labels.iter().any(|label| label == &rule.intent) {
                intent_labels.push(rule.intent.clone());
            }
        }
        if !intent_labels.iter().any(|label| label == UNKNOWN_INTENT) {
            intent_labels.push(UNKNOWN_INTENT.to_string());
        }

        Self {
            entities,
            intent_labels,
        }
    }
}
