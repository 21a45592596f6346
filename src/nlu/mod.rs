//! NLU collaborator contract
//!
//! The engine never performs language understanding itself: it hands the
//! utterance plus a state-derived extraction schema to an `NluClient` and
//! gets back an intent label and candidate entity extractions.

use crate::context::SlotValue;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

pub mod http;
pub mod schema;

pub use http::HttpNluClient;
pub use schema::ExtractionSchema;

/// One candidate extraction for a slot: the source span, an optional
/// pre-enriched value, and the extractor's confidence when it reports one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<SlotValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl Extraction {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: None,
            confidence: None,
        }
    }
}

/// Classification + extraction result for one utterance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NluPrediction {
    pub intent: String,
    #[serde(default)]
    pub entities: HashMap<String, Vec<Extraction>>,
}

impl NluPrediction {
    pub fn intent(intent: impl Into<String>) -> Self {
        Self {
            intent: intent.into(),
            entities: HashMap::new(),
        }
    }

    pub fn with_entity(mut self, slot: impl Into<String>, extraction: Extraction) -> Self {
        self.entities.entry(slot.into()).or_default().push(extraction);
        self
    }
}

/// Contract for the NLU/generation collaborator. `predict` drives intent
/// classification and entity extraction; `generate_response` backs the
/// delegated-generation response strategy only.
#[async_trait]
pub trait NluClient: Send + Sync {
    async fn predict(&self, utterance: &str, schema: &ExtractionSchema) -> Result<NluPrediction>;

    async fn generate_response(&self, prompt: &str) -> Result<String>;
}

/// Scripted NLU for development & testing: replays queued predictions in
/// order and falls back to an empty `unknown` classification when the
/// script runs out. `generate_response` echoes the prompt, matching an
/// extraction-only deployment.
#[derive(Default)]
pub struct ScriptedNlu {
    predictions: Mutex<VecDeque<NluPrediction>>,
}

impl ScriptedNlu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, prediction: NluPrediction) {
        self.predictions
            .lock()
            .expect("scripted NLU lock poisoned")
            .push_back(prediction);
    }
}

#[async_trait]
impl NluClient for ScriptedNlu {
    async fn predict(&self, _utterance: &str, _schema: &ExtractionSchema) -> Result<NluPrediction> {
        let next = self
            .predictions
            .lock()
            .expect("scripted NLU lock poisoned")
            .pop_front();
        Ok(next.unwrap_or_else(|| NluPrediction::intent(schema::UNKNOWN_INTENT)))
    }

    async fn generate_response(&self, prompt: &str) -> Result<String> {
        Ok(prompt.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_nlu_replays_in_order_then_goes_unknown() {
        let nlu = ScriptedNlu::new();
        nlu.push(NluPrediction::intent("check_balance"));
        nlu.push(NluPrediction::intent("goodbye"));

        let schema = ExtractionSchema::default();
        assert_eq!(nlu.predict("a", &schema).await.unwrap().intent, "check_balance");
        assert_eq!(nlu.predict("b", &schema).await.unwrap().intent, "goodbye");
        assert_eq!(
            nlu.predict("c", &schema).await.unwrap().intent,
            schema::UNKNOWN_INTENT
        );
    }

    #[test]
    fn prediction_builder_accumulates_entity_candidates() {
        let prediction = NluPrediction::intent("query_transactions")
            .with_entity("merchant", Extraction::text_only("Amazon"))
            .with_entity("merchant", Extraction::text_only("amazon.com"));

        assert_eq!(prediction.entities["merchant"].len(), 2);
        assert_eq!(prediction.entities["merchant"][0].text, "Amazon");
    }
}
