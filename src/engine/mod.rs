//! Dialog engine - runs one conversation turn end-to-end
//!
//! UTTERANCE → NLU → SLOT PIPELINE → TRANSITION → (ACTION CHAIN) → RESPONSE
//!
//! Owns the immutable state table and the injected capability registries;
//! mutates exactly one `DialogContext` per call and appends exactly one
//! history record per user turn.

use crate::config::{FallbackBehavior, FlowConfig, StateDefinition, StateKind, OUT_OF_SCOPE_STATE};
use crate::context::DialogContext;
use crate::error::{DialogError, Result};
use crate::nlu::{ExtractionSchema, NluClient};
use crate::registry::Registries;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

mod response;
mod slots;
mod transition;

use response::generate_response;
use slots::apply_slot_pipeline;
use transition::resolve_transition;

pub use response::DEFAULT_RESPONSE;

/// Maximum chained action executions per turn. A graph that needs more than
/// this is misconfigured (e.g. two action states cycling on success), and
/// exceeding the bound is a fatal configuration-detected error rather than
/// a silent infinite loop.
pub const MAX_ACTION_HOPS: usize = 8;

/// Fixed text for the `ask_reclassify` fallback.
pub const RECLASSIFY_RESPONSE: &str = "I didn't quite get that. Could you clarify?";

/// Fixed text for the generic-confusion fallback.
pub const CONFUSED_RESPONSE: &str = "I am confused.";

/// Fixed text when an action result has no mapped follow-up state.
pub const SYSTEM_ERROR_RESPONSE: &str = "System error: invalid state transition.";

/// Result code an action failure is converted to at the execution boundary.
const ACTION_ERROR_CODE: &str = "error";

pub struct DialogEngine {
    config: FlowConfig,
    nlu: Arc<dyn NluClient>,
    registries: Registries,
}

impl DialogEngine {
    /// Validates the flow configuration and assembles the engine. The
    /// registries and state table are immutable from here on.
    pub fn new(config: FlowConfig, nlu: Arc<dyn NluClient>, registries: Registries) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            nlu,
            registries,
        })
    }

    pub fn from_file(
        path: impl AsRef<Path>,
        nlu: Arc<dyn NluClient>,
        registries: Registries,
    ) -> Result<Self> {
        Self::new(FlowConfig::from_file(path)?, nlu, registries)
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn start_session(&self) -> DialogContext {
        self.start_session_with_id(Uuid::new_v4())
    }

    pub fn start_session_with_id(&self, session_id: Uuid) -> DialogContext {
        DialogContext::new(session_id, self.config.start_state())
    }

    /// Runs one turn: the whole pipeline completes before returning, and the
    /// context is never left pointing at an undefined state. Turn-level
    /// problems (validation failures, unmatched intents, unmapped action
    /// results) come back as user-visible text, not errors.
    pub async fn process_turn(
        &self,
        user_input: &str,
        context: &mut DialogContext,
    ) -> Result<String> {
        info!(
            session_id = %context.session_id(),
            state = %context.current_state,
            "Processing turn"
        );

        let mut state_in = context.current_state.clone();
        let mut state_def = self.state(&state_in)?;

        // Landed here via a chained action transition in a previous turn:
        // execute immediately, without consuming the utterance as input.
        if state_def.kind == StateKind::Action {
            let response = self.run_action_chain(context).await?;
            let state_out = context.current_state.clone();
            let slots = context.slots.clone();
            context.record_turn(user_input, &state_in, &state_out, &response, slots);
            return Ok(response);
        }

        // A terminal state never consumes input as itself; the turn restarts
        // from the configured start state with the same utterance.
        if state_def.kind == StateKind::Terminal {
            context.current_state = self.config.start_state().to_string();
            state_in = context.current_state.clone();
            state_def = self.state(&state_in)?;
        }

        let schema = ExtractionSchema::for_state(state_def);
        let prediction = self.nlu.predict(user_input, &schema).await?;
        debug!(intent = %prediction.intent, "Intent classified");

        apply_slot_pipeline(
            state_def,
            prediction.entities,
            &self.registries.validators,
            context,
        )
        .await;

        let resolved = resolve_transition(
            state_def,
            &prediction.intent,
            &self.registries.conditions,
            context,
        );

        let response = match resolved {
            Some(next_state) => {
                info!(from = %state_in, to = %next_state, intent = %prediction.intent, "Transition");
                context.previous_state = Some(context.current_state.clone());
                context.current_state = next_state.clone();

                let next_def = self.state(&next_state)?;
                if next_def.kind == StateKind::Action {
                    self.run_action_chain(context).await?
                } else {
                    generate_response(
                        next_def,
                        context,
                        &self.registries.responses,
                        self.nlu.as_ref(),
                    )
                    .await?
                }
            }
            None => self.handle_fallback(state_def, context).await?,
        };

        let state_out = context.current_state.clone();
        let slots = context.slots.clone();
        context.record_turn(user_input, &state_in, &state_out, &response, slots);

        Ok(response)
    }

    /// Executes the action of the current state, follows its result mapping,
    /// and keeps going while the mapping lands on further action states.
    /// Bounded by [`MAX_ACTION_HOPS`] per turn.
    async fn run_action_chain(&self, context: &mut DialogContext) -> Result<String> {
        for _ in 0..MAX_ACTION_HOPS {
            let state_id = context.current_state.clone();
            let state_def = self.state(&state_id)?;

            let action_name = state_def.action_name.as_deref().ok_or_else(|| {
                DialogError::Config(format!("action state '{}' has no action_name", state_id))
            })?;

            // Any failure at this boundary - including an unregistered
            // action - becomes the "error" result code; whether the flow
            // recovers depends on whether it maps that code.
            let result_code = match self.registries.actions.execute(action_name, context).await {
                Ok(code) => code,
                Err(e) => {
                    error!(action = %action_name, error = %e, "Action failed");
                    ACTION_ERROR_CODE.to_string()
                }
            };

            let results = state_def.transitions.action_results().ok_or_else(|| {
                DialogError::Config(format!("action state '{}' has no result map", state_id))
            })?;

            let Some(next_state) = results.get(&result_code) else {
                // The context stays parked on the action state; the host
                // sees the stuck state through the returned text.
                error!(
                    state = %state_id,
                    result = %result_code,
                    "No transition mapped for action result"
                );
                return Ok(SYSTEM_ERROR_RESPONSE.to_string());
            };

            debug!(from = %state_id, result = %result_code, to = %next_state, "Action transition");
            context.previous_state = Some(state_id);
            context.current_state = next_state.clone();

            let next_def = self.state(next_state)?;
            if next_def.kind != StateKind::Action {
                return generate_response(
                    next_def,
                    context,
                    &self.registries.responses,
                    self.nlu.as_ref(),
                )
                .await;
            }
        }

        Err(DialogError::ActionHopLimit {
            state: context.current_state.clone(),
            limit: MAX_ACTION_HOPS,
        })
    }

    async fn handle_fallback(
        &self,
        state_def: &StateDefinition,
        context: &mut DialogContext,
    ) -> Result<String> {
        match state_def.fallback_behavior {
            FallbackBehavior::Oos => {
                info!("No transition matched, routing to out_of_scope");
                context.current_state = OUT_OF_SCOPE_STATE.to_string();
                let oos = self.state(OUT_OF_SCOPE_STATE)?;
                generate_response(oos, context, &self.registries.responses, self.nlu.as_ref())
                    .await
            }
            FallbackBehavior::AskReclassify => Ok(RECLASSIFY_RESPONSE.to_string()),
            FallbackBehavior::Confused => Ok(CONFUSED_RESPONSE.to_string()),
        }
    }

    fn state(&self, id: &str) -> Result<&StateDefinition> {
        self.config
            .state(id)
            .ok_or_else(|| DialogError::UnknownState(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SlotValue;
    use crate::nlu::{Extraction, NluPrediction, ScriptedNlu};
    use crate::registry::{Action, Condition, Validator};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedAction(Option<&'static str>);

    #[async_trait]
    impl Action for FixedAction {
        async fn execute(&self, _context: &mut DialogContext) -> Result<Option<String>> {
            Ok(self.0.map(str::to_string))
        }
    }

    struct FailingAction;

    #[async_trait]
    impl Action for FailingAction {
        async fn execute(&self, _context: &mut DialogContext) -> Result<Option<String>> {
            Err(DialogError::ActionFailed("downstream outage".to_string()))
        }
    }

    struct SlotWritingAction;

    #[async_trait]
    impl Action for SlotWritingAction {
        async fn execute(&self, context: &mut DialogContext) -> Result<Option<String>> {
            context.set_slot("confirmation_number", SlotValue::text("829471"));
            Ok(None)
        }
    }

    /// Counts predict calls so tests can prove when NLU is (not) consulted.
    struct CountingNlu {
        inner: ScriptedNlu,
        predict_calls: AtomicUsize,
    }

    impl CountingNlu {
        fn new(inner: ScriptedNlu) -> Self {
            Self {
                inner,
                predict_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl NluClient for CountingNlu {
        async fn predict(
            &self,
            utterance: &str,
            schema: &ExtractionSchema,
        ) -> Result<NluPrediction> {
            self.predict_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.predict(utterance, schema).await
        }

        async fn generate_response(&self, prompt: &str) -> Result<String> {
            self.inner.generate_response(prompt).await
        }
    }

    fn engine(
        config: serde_json::Value,
        nlu: Arc<dyn NluClient>,
        registries: Registries,
    ) -> DialogEngine {
        let config: FlowConfig = serde_json::from_value(config).expect("config should parse");
        DialogEngine::new(config, nlu, registries).expect("engine should build")
    }

    fn positive_validator() -> Arc<dyn Validator> {
        Arc::new(|raw: &[Extraction]| {
            raw.first()
                .and_then(|e| e.text.trim().parse::<f64>().ok())
                .map(|n| n > 0.0)
                .unwrap_or(false)
        })
    }

    #[tokio::test]
    async fn scenario_a_unconditional_transition_renders_target_template() {
        let nlu = Arc::new(ScriptedNlu::new());
        nlu.push(NluPrediction::intent("check_balance"));

        let engine = engine(
            serde_json::json!({
                "settings": {"start_state": "greeting"},
                "states": {
                    "greeting": {
                        "response_template": "Hello!",
                        "transitions": [
                            {"intent": "check_balance", "target": "show_balance"}
                        ]
                    },
                    "show_balance": {"response_template": "Here is your balance."}
                }
            }),
            nlu,
            Registries::default(),
        );

        let mut ctx = engine.start_session();
        let response = engine.process_turn("what's my balance", &mut ctx).await.unwrap();

        assert_eq!(ctx.current_state, "show_balance");
        assert_eq!(ctx.previous_state.as_deref(), Some("greeting"));
        assert_eq!(response, "Here is your balance.");
    }

    #[tokio::test]
    async fn scenario_b_rejected_slot_is_not_written() {
        let nlu = Arc::new(ScriptedNlu::new());
        nlu.push(
            NluPrediction::intent("unknown")
                .with_entity("amount", Extraction::text_only("-5")),
        );

        let mut registries = Registries::default();
        registries
            .validators
            .register_validator("validate_positive", positive_validator());

        let engine = engine(
            serde_json::json!({
                "settings": {"start_state": "greeting"},
                "states": {
                    "greeting": {
                        "slots_optional": ["amount"],
                        "slot_config": {
                            "amount": {"validator": "validate_positive"}
                        },
                        "transitions": []
                    }
                }
            }),
            nlu,
            registries,
        );

        let mut ctx = engine.start_session();
        let response = engine.process_turn("send -5", &mut ctx).await.unwrap();

        assert!(ctx.slot("amount").is_none());
        // Turn continues through default handling despite the rejection.
        assert_eq!(response, CONFUSED_RESPONSE);
    }

    #[tokio::test]
    async fn scenario_c_terminal_state_resets_before_nlu_runs() {
        let scripted = ScriptedNlu::new();
        scripted.push(NluPrediction::intent("check_balance"));
        let nlu = Arc::new(CountingNlu::new(scripted));

        let engine = engine(
            serde_json::json!({
                "settings": {"start_state": "greeting"},
                "states": {
                    "greeting": {
                        "response_template": "Hello!",
                        "transitions": [
                            {"intent": "check_balance", "target": "show_balance"}
                        ]
                    },
                    "show_balance": {"response_template": "Here is your balance."},
                    "goodbye": {"type": "terminal", "response_template": "Bye!"}
                }
            }),
            nlu.clone(),
            Registries::default(),
        );

        let mut ctx = engine.start_session();
        ctx.current_state = "goodbye".to_string();

        let response = engine.process_turn("hello again", &mut ctx).await.unwrap();

        assert_eq!(nlu.predict_calls.load(Ordering::SeqCst), 1);
        assert_eq!(ctx.current_state, "show_balance");
        assert_eq!(response, "Here is your balance.");
        // The turn is bookkept as a fresh first turn from the start state.
        assert_eq!(ctx.history.last().unwrap().state_in, "greeting");
    }

    #[tokio::test]
    async fn scenario_d_action_result_selects_mapped_state() {
        let nlu = Arc::new(ScriptedNlu::new());
        nlu.push(NluPrediction::intent("transfer_funds"));

        let mut registries = Registries::default();
        registries
            .actions
            .register("execute_transfer", Arc::new(FixedAction(Some("insufficient_funds"))));

        let engine = engine(
            serde_json::json!({
                "settings": {"start_state": "greeting"},
                "states": {
                    "greeting": {
                        "transitions": [
                            {"intent": "transfer_funds", "target": "do_transfer"}
                        ]
                    },
                    "do_transfer": {
                        "type": "action",
                        "action_name": "execute_transfer",
                        "transitions": {
                            "success": "transfer_success",
                            "insufficient_funds": "transfer_failed"
                        }
                    },
                    "transfer_success": {"response_template": "Done!"},
                    "transfer_failed": {"response_template": "The transfer could not be completed."}
                }
            }),
            nlu,
            registries,
        );

        let mut ctx = engine.start_session();
        let response = engine.process_turn("pay my card", &mut ctx).await.unwrap();

        assert_eq!(ctx.current_state, "transfer_failed");
        assert_eq!(response, "The transfer could not be completed.");
    }

    #[tokio::test]
    async fn scenario_e_unset_fallback_confuses_without_moving() {
        let nlu = Arc::new(ScriptedNlu::new());
        nlu.push(NluPrediction::intent("unknown"));

        let engine = engine(
            serde_json::json!({
                "settings": {"start_state": "greeting"},
                "states": {
                    "greeting": {
                        "transitions": [
                            {"intent": "check_balance", "target": "greeting"}
                        ]
                    }
                }
            }),
            nlu,
            Registries::default(),
        );

        let mut ctx = engine.start_session();
        let response = engine.process_turn("flibbertigibbet", &mut ctx).await.unwrap();

        assert_eq!(response, CONFUSED_RESPONSE);
        assert_eq!(ctx.current_state, "greeting");
    }

    #[tokio::test]
    async fn ask_reclassify_fallback_keeps_state_and_prompts() {
        let nlu = Arc::new(ScriptedNlu::new());
        nlu.push(NluPrediction::intent("unknown"));

        let engine = engine(
            serde_json::json!({
                "settings": {"start_state": "greeting"},
                "states": {
                    "greeting": {"fallback_behavior": "ask_reclassify"}
                }
            }),
            nlu,
            Registries::default(),
        );

        let mut ctx = engine.start_session();
        let response = engine.process_turn("???", &mut ctx).await.unwrap();

        assert_eq!(response, RECLASSIFY_RESPONSE);
        assert_eq!(ctx.current_state, "greeting");
    }

    #[tokio::test]
    async fn oos_fallback_jumps_to_out_of_scope_state() {
        let nlu = Arc::new(ScriptedNlu::new());
        nlu.push(NluPrediction::intent("unknown"));

        let engine = engine(
            serde_json::json!({
                "settings": {"start_state": "greeting"},
                "states": {
                    "greeting": {"fallback_behavior": "oos"},
                    "out_of_scope": {"response_template": "I can't help with that."}
                }
            }),
            nlu,
            Registries::default(),
        );

        let mut ctx = engine.start_session();
        let response = engine.process_turn("order a pizza", &mut ctx).await.unwrap();

        assert_eq!(ctx.current_state, "out_of_scope");
        assert_eq!(response, "I can't help with that.");
    }

    #[tokio::test]
    async fn chained_actions_yield_one_response_and_one_record() {
        let nlu = Arc::new(ScriptedNlu::new());
        nlu.push(NluPrediction::intent("transfer_funds"));

        let mut registries = Registries::default();
        registries
            .actions
            .register("reserve_funds", Arc::new(FixedAction(None)));
        registries
            .actions
            .register("post_transfer", Arc::new(SlotWritingAction));

        let engine = engine(
            serde_json::json!({
                "settings": {"start_state": "greeting"},
                "states": {
                    "greeting": {
                        "transitions": [
                            {"intent": "transfer_funds", "target": "reserve"}
                        ]
                    },
                    "reserve": {
                        "type": "action",
                        "action_name": "reserve_funds",
                        "transitions": {"success": "post"}
                    },
                    "post": {
                        "type": "action",
                        "action_name": "post_transfer",
                        "transitions": {"success": "done"}
                    },
                    "done": {"response_template": "Confirmation: {{confirmation_number}}"}
                }
            }),
            nlu,
            registries,
        );

        let mut ctx = engine.start_session();
        let response = engine.process_turn("transfer it", &mut ctx).await.unwrap();

        assert_eq!(ctx.current_state, "done");
        assert_eq!(response, "Confirmation: 829471");
        assert_eq!(ctx.history.len(), 1);
        assert_eq!(ctx.history[0].state_in, "greeting");
        assert_eq!(ctx.history[0].state_out, "done");
        assert_eq!(ctx.history[0].bot_response, response);
    }

    #[tokio::test]
    async fn cyclic_action_chain_hits_the_hop_limit() {
        let nlu = Arc::new(ScriptedNlu::new());
        nlu.push(NluPrediction::intent("go"));

        let mut registries = Registries::default();
        registries.actions.register("ping", Arc::new(FixedAction(None)));
        registries.actions.register("pong", Arc::new(FixedAction(None)));

        let engine = engine(
            serde_json::json!({
                "settings": {"start_state": "greeting"},
                "states": {
                    "greeting": {
                        "transitions": [{"intent": "go", "target": "a"}]
                    },
                    "a": {
                        "type": "action",
                        "action_name": "ping",
                        "transitions": {"success": "b"}
                    },
                    "b": {
                        "type": "action",
                        "action_name": "pong",
                        "transitions": {"success": "a"}
                    }
                }
            }),
            nlu,
            registries,
        );

        let mut ctx = engine.start_session();
        let err = engine.process_turn("go", &mut ctx).await.unwrap_err();
        assert!(matches!(
            err,
            DialogError::ActionHopLimit {
                limit: MAX_ACTION_HOPS,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn unmapped_action_result_parks_the_context() {
        let nlu = Arc::new(ScriptedNlu::new());
        nlu.push(NluPrediction::intent("go"));

        let mut registries = Registries::default();
        registries
            .actions
            .register("lookup", Arc::new(FixedAction(Some("rate_limited"))));

        let engine = engine(
            serde_json::json!({
                "settings": {"start_state": "greeting"},
                "states": {
                    "greeting": {
                        "transitions": [{"intent": "go", "target": "fetch"}]
                    },
                    "fetch": {
                        "type": "action",
                        "action_name": "lookup",
                        "transitions": {"success": "done"}
                    },
                    "done": {"response_template": "ok"}
                }
            }),
            nlu,
            registries,
        );

        let mut ctx = engine.start_session();
        let response = engine.process_turn("go", &mut ctx).await.unwrap();

        assert_eq!(response, SYSTEM_ERROR_RESPONSE);
        assert_eq!(ctx.current_state, "fetch");
        assert_eq!(ctx.history.len(), 1);
    }

    #[tokio::test]
    async fn action_failure_routes_through_error_mapping() {
        let nlu = Arc::new(ScriptedNlu::new());
        nlu.push(NluPrediction::intent("go"));

        let mut registries = Registries::default();
        registries.actions.register("flaky", Arc::new(FailingAction));

        let engine = engine(
            serde_json::json!({
                "settings": {"start_state": "greeting"},
                "states": {
                    "greeting": {
                        "transitions": [{"intent": "go", "target": "fetch"}]
                    },
                    "fetch": {
                        "type": "action",
                        "action_name": "flaky",
                        "transitions": {"success": "done", "error": "recovered"}
                    },
                    "done": {"response_template": "ok"},
                    "recovered": {"response_template": "Something went wrong, let's try again."}
                }
            }),
            nlu,
            registries,
        );

        let mut ctx = engine.start_session();
        let response = engine.process_turn("go", &mut ctx).await.unwrap();

        assert_eq!(ctx.current_state, "recovered");
        assert_eq!(response, "Something went wrong, let's try again.");
    }

    #[tokio::test]
    async fn unregistered_action_recovers_through_error_mapping() {
        let nlu = Arc::new(ScriptedNlu::new());
        nlu.push(NluPrediction::intent("go"));

        let engine = engine(
            serde_json::json!({
                "settings": {"start_state": "greeting"},
                "states": {
                    "greeting": {
                        "transitions": [{"intent": "go", "target": "fetch"}]
                    },
                    "fetch": {
                        "type": "action",
                        "action_name": "never_registered",
                        "transitions": {"error": "recovered"}
                    },
                    "recovered": {"response_template": "Something went wrong."}
                }
            }),
            nlu,
            Registries::default(),
        );

        let mut ctx = engine.start_session();
        let response = engine.process_turn("go", &mut ctx).await.unwrap();

        assert_eq!(ctx.current_state, "recovered");
        assert_eq!(response, "Something went wrong.");
    }

    #[tokio::test]
    async fn parked_action_state_executes_without_consulting_nlu() {
        let scripted = ScriptedNlu::new();
        let nlu = Arc::new(CountingNlu::new(scripted));

        let mut registries = Registries::default();
        registries.actions.register("retry", Arc::new(FixedAction(None)));

        let engine = engine(
            serde_json::json!({
                "settings": {"start_state": "greeting"},
                "states": {
                    "greeting": {},
                    "fetch": {
                        "type": "action",
                        "action_name": "retry",
                        "transitions": {"success": "done"}
                    },
                    "done": {"response_template": "Recovered."}
                }
            }),
            nlu.clone(),
            registries,
        );

        let mut ctx = engine.start_session();
        ctx.current_state = "fetch".to_string();

        let response = engine.process_turn("anything", &mut ctx).await.unwrap();

        assert_eq!(nlu.predict_calls.load(Ordering::SeqCst), 0);
        assert_eq!(ctx.current_state, "done");
        assert_eq!(response, "Recovered.");
        assert_eq!(ctx.history.len(), 1);
    }

    #[tokio::test]
    async fn condition_redirect_keeps_slot_filling_state() {
        let nlu = Arc::new(ScriptedNlu::new());
        nlu.push(
            NluPrediction::intent("transfer_funds")
                .with_entity("transfer_amount", Extraction::text_only("158")),
        );

        let mut registries = Registries::default();
        registries.conditions.register(
            "check_transfer_ready",
            Arc::new(|ctx: &DialogContext, target: &str| {
                if ctx.slot("transfer_amount").is_some() && ctx.slot("destination_account").is_some()
                {
                    Some(target.to_string())
                } else {
                    Some(ctx.current_state.clone())
                }
            }) as Arc<dyn Condition>,
        );

        let engine = engine(
            serde_json::json!({
                "settings": {"start_state": "transfer_info"},
                "states": {
                    "transfer_info": {
                        "response_template": "Which account should receive it?",
                        "slots_optional": ["transfer_amount", "destination_account"],
                        "slot_config": {
                            "transfer_amount": {},
                            "destination_account": {}
                        },
                        "transitions": [
                            {
                                "intent": "transfer_funds",
                                "target": "transfer_confirm",
                                "condition": "check_transfer_ready"
                            }
                        ]
                    },
                    "transfer_confirm": {"response_template": "Please confirm."}
                }
            }),
            nlu,
            registries,
        );

        let mut ctx = engine.start_session();
        let response = engine.process_turn("transfer 158", &mut ctx).await.unwrap();

        // Amount captured, destination still missing: stay and re-prompt.
        assert_eq!(ctx.current_state, "transfer_info");
        assert_eq!(response, "Which account should receive it?");
        assert!(ctx.slot("transfer_amount").is_some());
    }

    #[tokio::test]
    async fn slots_persist_across_states_until_cleared() {
        let nlu = Arc::new(ScriptedNlu::new());
        nlu.push(
            NluPrediction::intent("check_balance")
                .with_entity("account", Extraction::text_only("savings")),
        );
        nlu.push(NluPrediction::intent("start_over"));

        let engine = engine(
            serde_json::json!({
                "settings": {"start_state": "greeting"},
                "states": {
                    "greeting": {
                        "slots_optional": ["account"],
                        "slot_config": {"account": {}},
                        "transitions": [
                            {"intent": "check_balance", "target": "show_balance"}
                        ]
                    },
                    "show_balance": {
                        "response_template": "Balance for {{account}}.",
                        "transitions": [
                            {
                                "intent": "start_over",
                                "target": "greeting",
                                "context_updates": {"clear_slots": ["account"]}
                            }
                        ]
                    }
                }
            }),
            nlu,
            Registries::default(),
        );

        let mut ctx = engine.start_session();
        let response = engine.process_turn("balance in savings", &mut ctx).await.unwrap();
        assert_eq!(response, "Balance for savings.");

        engine.process_turn("start over", &mut ctx).await.unwrap();
        assert_eq!(ctx.current_state, "greeting");
        assert!(ctx.slot("account").is_none());
    }

    #[tokio::test]
    async fn construction_rejects_invalid_config() {
        let config: FlowConfig = serde_json::from_value(serde_json::json!({
            "settings": {"start_state": "missing"},
            "states": {}
        }))
        .unwrap();

        let result = DialogEngine::new(config, Arc::new(ScriptedNlu::new()), Registries::default());
        assert!(matches!(result, Err(DialogError::Config(_))));
    }
}
