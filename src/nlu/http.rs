//! HTTP extraction-service client
//!
//! Talks to a remote NLU service that performs schema-guided intent
//! classification and entity extraction. Uses a long-lived reqwest::Client
//! for connection pooling.

use super::schema::{ExtractionSchema, UNKNOWN_INTENT};
use super::{Extraction, NluClient, NluPrediction};
use crate::error::{DialogError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use tracing::{debug, error};

const DEFAULT_BASE_URL: &str = "http://localhost:8010";

/// Reusable NLU service client (connection-pooled)
pub struct HttpNluClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    text: &'a str,
    schema: &'a ExtractionSchema,
}

#[derive(Deserialize)]
struct PredictResponse {
    #[serde(default)]
    intent: Option<String>,
    #[serde(default)]
    entities: HashMap<String, Vec<Extraction>>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    answer: String,
}

impl HttpNluClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Reads `NLU_SERVICE_URL`, falling back to the local default.
    pub fn from_env() -> Self {
        let base_url = env::var("NLU_SERVICE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }
}

#[async_trait]
impl NluClient for HttpNluClient {
    async fn predict(&self, utterance: &str, schema: &ExtractionSchema) -> Result<NluPrediction> {
        let url = format!("{}/predict", self.base_url);
        let request = PredictRequest {
            text: utterance,
            schema,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "NLU predict request failed");
                DialogError::Nlu(format!("predict request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, "NLU service returned an error");
            return Err(DialogError::Nlu(format!(
                "NLU service returned {}: {}",
                status, body
            )));
        }

        let parsed: PredictResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse NLU response");
            DialogError::Nlu(format!("invalid predict response: {}", e))
        })?;

        let prediction = NluPrediction {
            intent: parsed
                .intent
                .filter(|i| !i.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_INTENT.to_string()),
            entities: parsed.entities,
        };

        debug!(
            intent = %prediction.intent,
            entity_count = prediction.entities.len(),
            "NLU prediction received"
        );

        Ok(prediction)
    }

    async fn generate_response(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest { prompt })
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "NLU generate request failed");
                DialogError::Nlu(format!("generate request failed: {}", e))
            })?;

        // Extraction-only deployments don't expose /generate; echo the
        // prompt so the delegated-generation strategy still yields text.
        if response.status() == StatusCode::NOT_FOUND {
            debug!("NLU service has no /generate endpoint, echoing prompt");
            return Ok(prompt.to_string());
        }

        if !response.status().is_success() {
            let status = response.status();
            return Err(DialogError::Nlu(format!(
                "generation service returned {}",
                status
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| DialogError::Nlu(format!("invalid generate response: {}", e)))?;

        Ok(parsed.answer)
    }
}
