//! Finance actions
//!
//! Side-effecting state entry hooks: they read filled slots, hit the data
//! layer, and publish their results back into the context for the response
//! layer to render. Result codes drive the action-state transition maps.

use super::data::{
    all_accounts, all_credit_cards, calculate_txn_summary, filter_transactions,
    find_credit_card_by_name, find_holding_by_name, format_currency, AmountFilter, TxnFilter,
};
use crate::context::{DialogContext, SlotValue};
use crate::error::Result;
use crate::registry::Action;
use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

//
// ================= Slot Helpers =================
//

fn slot_string(context: &DialogContext, key: &str) -> Option<String> {
    context
        .slot(key)
        .map(|value| value.to_string())
        .filter(|s| !s.trim().is_empty())
}

fn slot_amount(context: &DialogContext, key: &str) -> Option<f64> {
    context.slot(key).and_then(SlotValue::as_f64)
}

fn iso_date(point: &crate::context::TimePoint) -> String {
    point.value.format("%Y-%m-%d").to_string()
}

/// Builds the transaction filter the current slots describe. Shared with
/// the query-style response functions.
pub(crate) fn filter_from_slots(context: &DialogContext) -> TxnFilter {
    let mut filter = TxnFilter {
        merchant: slot_string(context, "merchant"),
        category: slot_string(context, "category"),
        amount_filter: slot_string(context, "amount_filter")
            .as_deref()
            .and_then(AmountFilter::parse),
        amount_threshold: slot_amount(context, "amount_threshold"),
        location: slot_string(context, "location"),
        account_name: slot_string(context, "account"),
        ..TxnFilter::default()
    };

    match context.slot("date_range") {
        Some(SlotValue::Interval { from, to }) => {
            filter.start_date = from.as_ref().map(iso_date);
            filter.end_date = to.as_ref().map(iso_date);
        }
        // A single resolved date reads as "since this date".
        Some(SlotValue::DateTime(point)) => {
            filter.start_date = Some(iso_date(point));
        }
        _ => {}
    }

    filter
}

//
// ================= Actions =================
//

/// Balance for one named holding, or every account and card when no
/// `account` slot is filled.
pub struct GetBalance;

#[async_trait]
impl Action for GetBalance {
    async fn execute(&self, context: &mut DialogContext) -> Result<Option<String>> {
        match slot_string(context, "account") {
            Some(account_name) => {
                let Some(holding) = find_holding_by_name(&account_name) else {
                    debug!(account = %account_name, "No holding matched balance query");
                    return Ok(Some("not_found".to_string()));
                };
                context.set_slot("account_data", SlotValue::Object(holding.to_json()));
                context.set_slot("balance_type", SlotValue::text("single"));
            }
            None => {
                context.set_slot(
                    "all_accounts",
                    SlotValue::from_json(serde_json::to_value(all_accounts())?),
                );
                context.set_slot(
                    "all_cards",
                    SlotValue::from_json(serde_json::to_value(all_credit_cards())?),
                );
                context.set_slot("balance_type", SlotValue::text("all"));
            }
        }
        Ok(None)
    }
}

/// Runs the transaction query described by the current slots and publishes
/// results and summary stats for rendering.
pub struct QueryTransactions;

#[async_trait]
impl Action for QueryTransactions {
    async fn execute(&self, context: &mut DialogContext) -> Result<Option<String>> {
        let filter = filter_from_slots(context);
        let transactions = filter_transactions(&filter);

        if transactions.is_empty() {
            return Ok(Some("none_found".to_string()));
        }

        let summary = calculate_txn_summary(&transactions);
        debug!(count = summary.count, total = summary.total, "Transaction query matched");

        context.set_slot(
            "txn_results",
            SlotValue::from_json(serde_json::to_value(&transactions)?),
        );
        context.set_slot(
            "txn_summary",
            SlotValue::Object(serde_json::to_value(&summary)?),
        );
        Ok(Some("found".to_string()))
    }
}

/// Moves money between holdings (mock). Publishes either
/// `transfer_confirmation` or `transfer_error` for the result renderer.
pub struct ExecuteTransfer;

#[async_trait]
impl Action for ExecuteTransfer {
    async fn execute(&self, context: &mut DialogContext) -> Result<Option<String>> {
        let Some(amount) = slot_amount(context, "transfer_amount") else {
            context.set_slot("transfer_error", SlotValue::text("Invalid amount"));
            return Ok(Some("error".to_string()));
        };

        let source_name =
            slot_string(context, "source_account").unwrap_or_else(|| "spending".to_string());
        let dest_name = slot_string(context, "destination_account").unwrap_or_default();

        let Some(dest) = find_holding_by_name(&dest_name) else {
            context.set_slot(
                "transfer_error",
                SlotValue::text(format!(
                    "Could not find destination account: {}",
                    dest_name
                )),
            );
            return Ok(Some("invalid_account".to_string()));
        };

        // Unresolvable source names fall back to the spending account.
        let Some(source) =
            find_holding_by_name(&source_name).or_else(|| find_holding_by_name("spending"))
        else {
            context.set_slot(
                "transfer_error",
                SlotValue::text("Could not resolve a source account"),
            );
            return Ok(Some("error".to_string()));
        };

        if amount > source.available() {
            context.set_slot(
                "transfer_error",
                SlotValue::text(format!(
                    "Insufficient funds. Available: {}",
                    format_currency(source.available())
                )),
            );
            context.set_slot("source_balance", SlotValue::Number(source.available()));
            return Ok(Some("insufficient_funds".to_string()));
        }

        let date = match context.slot("transfer_date") {
            Some(SlotValue::DateTime(point)) => iso_date(point),
            Some(other) => other.to_string(),
            None => "today".to_string(),
        };

        let stamp = Utc::now().format("%Y%m%d%H%M%S").to_string();
        let confirmation_number = stamp[stamp.len() - 6..].to_string();

        context.set_slot(
            "transfer_confirmation",
            SlotValue::Object(serde_json::json!({
                "amount": amount,
                "source": source.name(),
                "destination": dest.name(),
                "date": date,
                "confirmation_number": confirmation_number,
            })),
        );

        Ok(None)
    }
}

/// Details for one named credit card, or all cards when no `card_name`
/// slot is filled.
pub struct GetCreditCardInfo;

#[async_trait]
impl Action for GetCreditCardInfo {
    async fn execute(&self, context: &mut DialogContext) -> Result<Option<String>> {
        match slot_string(context, "card_name") {
            Some(card_name) => {
                let Some(card) = find_credit_card_by_name(&card_name) else {
                    return Ok(Some("not_found".to_string()));
                };
                context.set_slot(
                    "card_data",
                    SlotValue::from_json(serde_json::to_value(card)?),
                );
                context.set_slot("card_type", SlotValue::text("single"));
            }
            None => {
                context.set_slot(
                    "all_cards",
                    SlotValue::from_json(serde_json::to_value(all_credit_cards())?),
                );
                context.set_slot("card_type", SlotValue::text("all"));
            }
        }
        Ok(None)
    }
}
