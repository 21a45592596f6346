//! Capability registries: host-supplied behaviors looked up by name
//!
//! One trait per behavior kind, one registry per trait. The host populates
//! the registries before the first turn; lookups are read-only at turn time
//! and re-registration silently overwrites.
//!
//! Miss policy per registry (the action registry is the only fatal miss):
//! action → error, validator → permissive, enricher → identity,
//! condition → no transition, response → fall through.

use crate::context::{DialogContext, SlotValue};
use crate::error::{DialogError, Result};
use crate::nlu::Extraction;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

//
// ================= Behavior Traits =================
//

/// Side-effecting state entry hook. Mutating `context.slots` is the primary
/// way an action communicates results back for rendering; the returned code
/// (default `"success"`) selects the follow-up transition.
#[async_trait]
pub trait Action: Send + Sync {
    async fn execute(&self, context: &mut DialogContext) -> Result<Option<String>>;
}

/// Accept/reject check over the raw extractions for one slot.
pub trait Validator: Send + Sync {
    fn validate(&self, raw: &[Extraction]) -> bool;
}

impl<F> Validator for F
where
    F: Fn(&[Extraction]) -> bool + Send + Sync,
{
    fn validate(&self, raw: &[Extraction]) -> bool {
        self(raw)
    }
}

/// Normalizes a raw source span into a typed slot value.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self, text: &str) -> Result<SlotValue>;
}

#[async_trait]
impl<F> Enricher for F
where
    F: Fn(&str) -> SlotValue + Send + Sync,
{
    async fn enrich(&self, text: &str) -> Result<SlotValue> {
        Ok(self(text))
    }
}

/// Transition guard. Returns the actual next state (conditions are
/// authorized to redirect away from the proposed target) or `None` when the
/// guarded rule should not fire.
pub trait Condition: Send + Sync {
    fn evaluate(&self, context: &DialogContext, proposed_target: &str) -> Option<String>;
}

impl<F> Condition for F
where
    F: Fn(&DialogContext, &str) -> Option<String> + Send + Sync,
{
    fn evaluate(&self, context: &DialogContext, proposed_target: &str) -> Option<String> {
        self(context, proposed_target)
    }
}

/// Custom response renderer. `None` falls through to the next rendering
/// strategy.
pub trait ResponseFn: Send + Sync {
    fn render(&self, context: &DialogContext) -> Option<String>;
}

impl<F> ResponseFn for F
where
    F: Fn(&DialogContext) -> Option<String> + Send + Sync,
{
    fn render(&self, context: &DialogContext) -> Option<String> {
        self(context)
    }
}

//
// ================= Registries =================
//

#[derive(Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, action: Arc<dyn Action>) {
        self.actions.insert(name.into(), action);
    }

    /// Executes a registered action and returns its result code, defaulting
    /// to `"success"` when the action returns nothing. An unregistered name
    /// is an error: callers decide how to absorb it (the engine maps it to
    /// the `"error"` result code at the action-execution boundary).
    pub async fn execute(&self, name: &str, context: &mut DialogContext) -> Result<String> {
        let action = self
            .actions
            .get(name)
            .ok_or_else(|| DialogError::ActionNotFound(name.to_string()))?;
        let code = action.execute(context).await?;
        Ok(code.unwrap_or_else(|| "success".to_string()))
    }
}

/// Validators and enrichers share a registry: both act on the raw NLU
/// payload for one slot, and flows configure them side by side.
#[derive(Default)]
pub struct ValidatorRegistry {
    validators: HashMap<String, Arc<dyn Validator>>,
    enrichers: HashMap<String, Arc<dyn Enricher>>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_validator(&mut self, name: impl Into<String>, validator: Arc<dyn Validator>) {
        self.validators.insert(name.into(), validator);
    }

    pub fn register_enricher(&mut self, name: impl Into<String>, enricher: Arc<dyn Enricher>) {
        self.enrichers.insert(name.into(), enricher);
    }

    /// Unregistered validators are permissive.
    pub fn validate(&self, name: &str, raw: &[Extraction]) -> bool {
        match self.validators.get(name) {
            Some(validator) => validator.validate(raw),
            None => true,
        }
    }

    /// Unregistered enrichers are the identity; enrichment failures degrade
    /// to the identity as well, since enrichment must never abort a turn.
    pub async fn enrich(&self, name: &str, text: &str) -> SlotValue {
        match self.enrichers.get(name) {
            Some(enricher) => match enricher.enrich(text).await {
                Ok(value) => value,
                Err(e) => {
                    warn!(enricher = %name, error = %e, "Enrichment failed, keeping raw text");
                    SlotValue::text(text)
                }
            },
            None => SlotValue::text(text),
        }
    }
}

#[derive(Default)]
pub struct ConditionRegistry {
    conditions: HashMap<String, Arc<dyn Condition>>,
}

impl ConditionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, condition: Arc<dyn Condition>) {
        self.conditions.insert(name.into(), condition);
    }

    /// Unregistered conditions never satisfy their rule.
    pub fn check(
        &self,
        name: &str,
        context: &DialogContext,
        proposed_target: &str,
    ) -> Option<String> {
        match self.conditions.get(name) {
            Some(condition) => condition.evaluate(context, proposed_target),
            None => {
                warn!(condition = %name, "Condition not found");
                None
            }
        }
    }
}

#[derive(Default)]
pub struct ResponseRegistry {
    responses: HashMap<String, Arc<dyn ResponseFn>>,
}

impl ResponseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, response: Arc<dyn ResponseFn>) {
        self.responses.insert(name.into(), response);
    }

    /// Unregistered response functions fall through to the next strategy.
    pub fn generate(&self, name: &str, context: &DialogContext) -> Option<String> {
        match self.responses.get(name) {
            Some(response) => response.render(context),
            None => {
                warn!(response_function = %name, "Response function not found");
                None
            }
        }
    }
}

/// The full capability set injected into the engine at construction.
#[derive(Default)]
pub struct Registries {
    pub actions: ActionRegistry,
    pub validators: ValidatorRegistry,
    pub conditions: ConditionRegistry,
    pub responses: ResponseRegistry,
}
