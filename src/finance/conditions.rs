//! Transition conditions for the banking flow
//!
//! These exercise the redirect capability of conditions: rather than
//! pass/fail, they answer with the state the conversation should actually
//! land in.

use crate::context::DialogContext;

/// Slots a transfer cannot proceed without.
const TRANSFER_REQUIRED_SLOTS: &[&str] = &["transfer_amount", "destination_account"];

/// State that collects missing transfer details.
const TRANSFER_INFO_STATE: &str = "transfer_info";

/// Releases the transfer flow to its proposed target (the confirmation
/// state) once amount and destination are filled; otherwise redirects to
/// the collecting state, which re-asks for whatever is missing.
pub fn check_transfer_ready(context: &DialogContext, proposed_target: &str) -> Option<String> {
    if TRANSFER_REQUIRED_SLOTS
        .iter()
        .all(|slot| context.slot(slot).is_some())
    {
        Some(proposed_target.to_string())
    } else {
        Some(TRANSFER_INFO_STATE.to_string())
    }
}

/// Only shows the transaction detail list when a query has produced rows;
/// otherwise the conversation stays where it is.
pub fn has_txn_results(context: &DialogContext, proposed_target: &str) -> Option<String> {
    if context.slot("txn_results").is_some() {
        Some(proposed_target.to_string())
    } else {
        Some(context.current_state.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SlotValue;
    use uuid::Uuid;

    fn context() -> DialogContext {
        DialogContext::new(Uuid::new_v4(), "greeting")
    }

    #[test]
    fn transfer_redirects_to_collection_until_slots_are_filled() {
        let mut ctx = context();
        assert_eq!(
            check_transfer_ready(&ctx, "transfer_confirm"),
            Some("transfer_info".to_string())
        );

        ctx.set_slot("transfer_amount", SlotValue::Number(158.0));
        assert_eq!(
            check_transfer_ready(&ctx, "transfer_confirm"),
            Some("transfer_info".to_string())
        );

        ctx.set_slot("destination_account", SlotValue::text("travel_rewards"));
        assert_eq!(
            check_transfer_ready(&ctx, "transfer_confirm"),
            Some("transfer_confirm".to_string())
        );
    }

    #[test]
    fn txn_detail_list_requires_results() {
        let mut ctx = context();
        assert_eq!(
            has_txn_results(&ctx, "show_txn_list"),
            Some("greeting".to_string())
        );

        ctx.set_slot("txn_results", SlotValue::List(vec![]));
        assert_eq!(
            has_txn_results(&ctx, "show_txn_list"),
            Some("show_txn_list".to_string())
        );
    }
}
