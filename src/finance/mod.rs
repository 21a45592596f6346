//! Personal finance host application
//!
//! Everything the banking flow config names by string lives here: actions,
//! validators, enrichers, conditions, and response functions, plus the mock
//! data layer they run against. The engine core never imports this module;
//! it only sees these behaviors through the registries.

pub mod actions;
pub mod conditions;
pub mod data;
pub mod responses;
pub mod validators;

use crate::enrich::{dims, DucklingClient};
use crate::registry::Registries;
use std::sync::Arc;

/// Default path of the banking flow config, relative to the crate root.
pub const BANKING_FLOW_CONFIG: &str = "config/banking_flow.json";

/// Wires up every capability the banking flow refers to by name.
pub fn build_registries(duckling: Arc<DucklingClient>) -> Registries {
    let mut registries = Registries::default();

    registries
        .actions
        .register("get_balance", Arc::new(actions::GetBalance));
    registries
        .actions
        .register("query_transactions", Arc::new(actions::QueryTransactions));
    registries
        .actions
        .register("execute_transfer", Arc::new(actions::ExecuteTransfer));
    registries
        .actions
        .register("get_credit_card_info", Arc::new(actions::GetCreditCardInfo));

    registries
        .validators
        .register_validator("validate_positive", Arc::new(validators::validate_positive));

    registries
        .validators
        .register_enricher("enrich_amount_of_money", duckling.enricher(dims::AMOUNT_OF_MONEY));
    registries
        .validators
        .register_enricher("enrich_time", duckling.enricher(dims::TIME));
    registries.validators.register_enricher(
        "normalize_account_name",
        Arc::new(validators::normalize_account_name),
    );
    registries.validators.register_enricher(
        "normalize_card_name",
        Arc::new(validators::normalize_card_name),
    );

    registries
        .conditions
        .register("check_transfer_ready", Arc::new(conditions::check_transfer_ready));
    registries
        .conditions
        .register("has_txn_results", Arc::new(conditions::has_txn_results));

    registries
        .responses
        .register("process_balance_query", Arc::new(responses::process_balance_query));
    registries
        .responses
        .register("display_balance", Arc::new(responses::display_balance));
    registries
        .responses
        .register("process_txn_query", Arc::new(responses::process_txn_query));
    registries
        .responses
        .register("display_txn_summary", Arc::new(responses::display_txn_summary));
    registries
        .responses
        .register("display_txn_list", Arc::new(responses::display_txn_list));
    registries
        .responses
        .register("ask_transfer_info", Arc::new(responses::ask_transfer_info));
    registries
        .responses
        .register("confirm_transfer_details", Arc::new(responses::confirm_transfer_details));
    registries
        .responses
        .register("display_transfer_result", Arc::new(responses::display_transfer_result));
    registries.responses.register(
        "process_credit_card_query",
        Arc::new(responses::process_credit_card_query),
    );
    registries
        .responses
        .register("display_credit_card", Arc::new(responses::display_credit_card));

    registries
}
