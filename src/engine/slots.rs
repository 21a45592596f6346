//! Slot pipeline: validate → enrich → write
//!
//! Runs between NLU extraction and transition resolution. Failures are
//! per-slot and non-fatal: a rejected or unconfigured slot is skipped and
//! the turn continues.

use crate::config::StateDefinition;
use crate::context::DialogContext;
use crate::nlu::Extraction;
use crate::registry::ValidatorRegistry;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Processes the entity map NLU produced for the current state. Only slots
/// declared in the state's `slot_config` are written; everything else is
/// dropped (previously-set slots persist until a transition clears them).
pub(crate) async fn apply_slot_pipeline(
    state: &StateDefinition,
    entities: HashMap<String, Vec<Extraction>>,
    validators: &ValidatorRegistry,
    context: &mut DialogContext,
) {
    for (slot, mut extractions) in entities {
        if extractions.is_empty() {
            continue;
        }

        let Some(spec) = state.slot_config.get(&slot) else {
            debug!(%slot, "Slot not configured for this state, ignoring");
            continue;
        };

        if let Some(validator) = &spec.validator {
            if !validators.validate(validator, &extractions) {
                warn!(%slot, %validator, "Slot failed validation, skipping");
                continue;
            }
        }

        // First-candidate-wins: enrichment overwrites the top extraction's
        // value; downstream consumers read only that one.
        if let Some(enricher) = &spec.enricher {
            let enriched = validators.enrich(enricher, &extractions[0].text).await;
            extractions[0].value = Some(enriched);
        }

        context.update_slot(slot, extractions);
    }
}
