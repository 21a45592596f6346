//! Response rendering
//!
//! Strategies tried in strict priority order, first success wins:
//! custom function → static template → delegated generation → default.

use crate::config::StateDefinition;
use crate::context::{DialogContext, SlotValue};
use crate::error::Result;
use crate::nlu::NluClient;
use crate::registry::ResponseRegistry;
use std::collections::HashMap;
use tracing::debug;

/// Last-resort text when a state configures no rendering strategy.
pub const DEFAULT_RESPONSE: &str = "Thinking...";

pub(crate) async fn generate_response(
    state: &StateDefinition,
    context: &DialogContext,
    responses: &ResponseRegistry,
    nlu: &dyn NluClient,
) -> Result<String> {
    if let Some(function) = &state.response_function {
        if let Some(text) = responses.generate(function, context) {
            return Ok(text);
        }
        debug!(%function, "Response function yielded nothing, falling through");
    }

    if let Some(template) = &state.response_template {
        return Ok(render_template(template, &context.slots));
    }

    if let Some(prompt) = &state.response_prompt {
        let full_prompt = format!(
            "{}\nContext: {}",
            prompt,
            serde_json::to_string(&context.slots)?
        );
        return nlu.generate_response(&full_prompt).await;
    }

    Ok(DEFAULT_RESPONSE.to_string())
}

/// Literal `{{slot}}` substitution using each slot's string form.
/// Placeholders with no matching slot are left verbatim.
pub(crate) fn render_template(template: &str, slots: &HashMap<String, SlotValue>) -> String {
    let mut rendered = template.to_string();
    for (key, value) in slots {
        let placeholder = format!("{{{{{}}}}}", key);
        if rendered.contains(&placeholder) {
            rendered = rendered.replace(&placeholder, &value.to_string());
        }
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlu::ScriptedNlu;
    use crate::registry::ResponseFn;
    use std::sync::Arc;
    use uuid::Uuid;

    fn state(value: serde_json::Value) -> StateDefinition {
        serde_json::from_value(value).expect("state should parse")
    }

    fn context() -> DialogContext {
        DialogContext::new(Uuid::new_v4(), "show_balance")
    }

    #[test]
    fn template_substitutes_known_slots() {
        let mut slots = HashMap::new();
        slots.insert("account".to_string(), SlotValue::text("savings"));
        slots.insert("balance".to_string(), SlotValue::Number(45230.0));

        assert_eq!(
            render_template("Your {{account}} holds {{balance}}.", &slots),
            "Your savings holds 45230."
        );
    }

    #[test]
    fn unmatched_placeholders_stay_verbatim() {
        let slots = HashMap::new();
        assert_eq!(
            render_template("Balance for {{account}}?", &slots),
            "Balance for {{account}}?"
        );
    }

    #[test]
    fn template_without_placeholders_is_unchanged() {
        let mut slots = HashMap::new();
        slots.insert("account".to_string(), SlotValue::text("savings"));
        assert_eq!(
            render_template("What else can I help you with?", &slots),
            "What else can I help you with?"
        );
    }

    #[tokio::test]
    async fn function_takes_priority_over_template() {
        let state = state(serde_json::json!({
            "response_function": "greet",
            "response_template": "template text"
        }));
        let mut responses = ResponseRegistry::new();
        responses.register(
            "greet",
            Arc::new(|_: &DialogContext| Some("function text".to_string())) as Arc<dyn ResponseFn>,
        );

        let text = generate_response(&state, &context(), &responses, &ScriptedNlu::new())
            .await
            .unwrap();
        assert_eq!(text, "function text");
    }

    #[tokio::test]
    async fn null_function_falls_through_to_template() {
        let state = state(serde_json::json!({
            "response_function": "unregistered",
            "response_template": "template text"
        }));
        let text = generate_response(
            &state,
            &context(),
            &ResponseRegistry::new(),
            &ScriptedNlu::new(),
        )
        .await
        .unwrap();
        assert_eq!(text, "template text");
    }

    #[tokio::test]
    async fn prompt_strategy_serializes_slots_into_the_prompt() {
        let state = state(serde_json::json!({
            "response_prompt": "Summarize the transfer for the user."
        }));
        let mut ctx = context();
        ctx.set_slot("transfer_amount", SlotValue::Number(158.0));

        // ScriptedNlu echoes the prompt, so the output carries both parts.
        let text = generate_response(&state, &ctx, &ResponseRegistry::new(), &ScriptedNlu::new())
            .await
            .unwrap();
        assert!(text.starts_with("Summarize the transfer for the user."));
        assert!(text.contains("transfer_amount"));
    }

    #[tokio::test]
    async fn unconfigured_state_gets_default_text() {
        let state = state(serde_json::json!({}));
        let text = generate_response(
            &state,
            &context(),
            &ResponseRegistry::new(),
            &ScriptedNlu::new(),
        )
        .await
        .unwrap();
        assert_eq!(text, DEFAULT_RESPONSE);
    }
}
