//! Transition resolution
//!
//! Scans a state's rules in declared order. The first rule whose intent
//! matches is the candidate; a condition may redirect to a different state
//! or veto the rule (scanning then continues, so the same intent can
//! cascade through several conditioned rules). `clear_slots` applies only
//! when a rule actually fires.

use crate::config::{StateDefinition, TransitionRule};
use crate::context::DialogContext;
use crate::registry::ConditionRegistry;
use tracing::debug;

/// `None` means no rule fired and the engine should run fallback handling.
pub(crate) fn resolve_transition(
    state: &StateDefinition,
    intent: &str,
    conditions: &ConditionRegistry,
    context: &mut DialogContext,
) -> Option<String> {
    for rule in state.transitions.rules() {
        if rule.intent != intent {
            continue;
        }

        match &rule.condition {
            Some(condition) => {
                let Some(next_state) = conditions.check(condition, context, &rule.target) else {
                    debug!(%intent, %condition, "Condition vetoed rule, continuing scan");
                    continue;
                };
                apply_context_updates(rule, context);
                return Some(next_state);
            }
            None => {
                apply_context_updates(rule, context);
                return Some(rule.target.clone());
            }
        }
    }
    None
}

fn apply_context_updates(rule: &TransitionRule, context: &mut DialogContext) {
    if let Some(updates) = &rule.context_updates {
        for slot in &updates.clear_slots {
            context.clear_slot(slot);
        }
    }
}
