//! Duckling-backed entity enrichment
//!
//! Normalizes raw text spans (amounts, dates, numbers, ...) by calling a
//! Duckling server and keeping the first entity of the requested dimension.
//! Enrichment is best-effort: a miss or a transport failure yields the raw
//! text back unchanged rather than aborting the turn.

use crate::context::SlotValue;
use crate::error::Result;
use crate::registry::Enricher;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_LOCALE: &str = "en_GB";

/// Duckling dimension names, as the service spells them.
pub mod dims {
    pub const AMOUNT_OF_MONEY: &str = "amount-of-money";
    pub const CREDIT_CARD_NUMBER: &str = "credit-card-number";
    pub const DISTANCE: &str = "distance";
    pub const DURATION: &str = "duration";
    pub const EMAIL: &str = "email";
    pub const NUMBER: &str = "number";
    pub const ORDINAL: &str = "ordinal";
    pub const PHONE_NUMBER: &str = "phone-number";
    pub const QUANTITY: &str = "quantity";
    pub const TEMPERATURE: &str = "temperature";
    pub const TIME: &str = "time";
    pub const URL: &str = "url";
    pub const VOLUME: &str = "volume";
}

#[derive(Debug, Deserialize)]
struct DucklingEntity {
    dim: String,
    value: Value,
}

/// Reusable Duckling client (connection-pooled)
pub struct DucklingClient {
    client: Client,
    base_url: String,
    locale: String,
}

impl DucklingClient {
    pub fn new(base_url: impl Into<String>, locale: impl Into<String>) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            locale: locale.into(),
        }
    }

    /// Reads `DUCKLING_URL` / `DUCKLING_LOCALE`, with local defaults.
    pub fn from_env() -> Self {
        let base_url = env::var("DUCKLING_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let locale = env::var("DUCKLING_LOCALE").unwrap_or_else(|_| DEFAULT_LOCALE.to_string());
        Self::new(base_url, locale)
    }

    async fn parse(&self, text: &str) -> Result<Vec<DucklingEntity>> {
        let url = format!("{}/parse", self.base_url);
        let response = self
            .client
            .post(&url)
            .form(&[("text", text), ("locale", self.locale.as_str())])
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    /// Value of the first entity matching `dim`, mapped into the slot-value
    /// union; the raw text when nothing matches or the service fails.
    pub async fn first_value_for_dim(&self, text: &str, dim: &str) -> SlotValue {
        let entities = match self.parse(text).await {
            Ok(entities) => entities,
            Err(e) => {
                warn!(%dim, error = %e, "Duckling parse failed, keeping raw text");
                return SlotValue::text(text);
            }
        };

        entities
            .into_iter()
            .find(|entity| entity.dim == dim)
            .map(|entity| SlotValue::from_json(entity.value))
            .unwrap_or_else(|| SlotValue::text(text))
    }

    /// An `Enricher` extracting the given dimension through this client.
    pub fn enricher(self: &Arc<Self>, dim: &'static str) -> Arc<dyn Enricher> {
        Arc::new(DimensionEnricher {
            client: Arc::clone(self),
            dim,
        })
    }
}

struct DimensionEnricher {
    client: Arc<DucklingClient>,
    dim: &'static str,
}

#[async_trait]
impl Enricher for DimensionEnricher {
    async fn enrich(&self, text: &str) -> Result<SlotValue> {
        Ok(self.client.first_value_for_dim(text, self.dim).await)
    }
}
