//! Response functions for the banking flow
//!
//! Two families: `process_*` functions compute straight from the data layer
//! (read-only, no slot writes), and `display_*` functions render results an
//! action already published into the context.

use super::actions::filter_from_slots;
use super::data::{
    all_accounts, all_credit_cards, calculate_txn_summary, filter_transactions,
    find_credit_card_by_name, find_holding_by_name, format_currency, format_date_for_display,
    TxnSummary,
};
use crate::context::{DialogContext, SlotValue};
use serde_json::Value;

/// Mock total-spending figure used for the share-of-spending line.
const TOTAL_SPENDING: f64 = 99_750.00;

const TXN_LIST_LIMIT: usize = 15;

//
// ================= Value Helpers =================
//

fn slot_text(context: &DialogContext, key: &str) -> Option<String> {
    context
        .slot(key)
        .map(|value| value.to_string())
        .filter(|s| !s.trim().is_empty())
}

fn field_str<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}

fn field_num(value: &Value, key: &str) -> f64 {
    value.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

fn object_list<'a>(context: &'a DialogContext, key: &str) -> Vec<&'a Value> {
    match context.slot(key) {
        Some(SlotValue::List(items)) => items.iter().filter_map(SlotValue::as_object).collect(),
        _ => Vec::new(),
    }
}

//
// ================= Balances =================
//

fn single_balance_text(name: &str, available: f64) -> String {
    format!(
        "The available balance for your {} is {}.",
        name,
        format_currency(available)
    )
}

fn all_balances_text(
    accounts: impl Iterator<Item = (String, f64)>,
    cards: impl Iterator<Item = (String, f64, f64)>,
) -> String {
    let mut lines = vec!["Here are all your account balances:".to_string(), String::new()];

    lines.push("Bank Accounts:".to_string());
    for (name, available) in accounts {
        lines.push(format!("  - {}: {}", name, format_currency(available)));
    }

    lines.push(String::new());
    lines.push("Credit Cards:".to_string());
    for (name, balance, available_credit) in cards {
        lines.push(format!(
            "  - {}: {} balance ({} available)",
            name,
            format_currency(balance),
            format_currency(available_credit)
        ));
    }

    lines.join("\n")
}

/// Renders balance data published by the `get_balance` action.
pub fn display_balance(context: &DialogContext) -> Option<String> {
    let balance_type = slot_text(context, "balance_type").unwrap_or_else(|| "single".to_string());

    if balance_type == "single" {
        let account = context.slot("account_data")?.as_object()?;
        let available = if account.get("available_balance").is_some() {
            field_num(account, "available_balance")
        } else {
            field_num(account, "available_credit")
        };
        return Some(single_balance_text(field_str(account, "name"), available));
    }

    let accounts = object_list(context, "all_accounts");
    let cards = object_list(context, "all_cards");
    Some(all_balances_text(
        accounts
            .iter()
            .map(|a| (field_str(a, "name").to_string(), field_num(a, "available_balance"))),
        cards.iter().map(|c| {
            (
                field_str(c, "name").to_string(),
                field_num(c, "current_balance"),
                field_num(c, "available_credit"),
            )
        }),
    ))
}

/// Answers a balance query straight from the data layer, without requiring
/// an action to have run first.
pub fn process_balance_query(context: &DialogContext) -> Option<String> {
    match slot_text(context, "account") {
        Some(account_name) => match find_holding_by_name(&account_name) {
            Some(holding) => Some(single_balance_text(holding.name(), holding.available())),
            None => Some(format!(
                "I couldn't find an account matching '{}'. Please try a different account name.",
                account_name
            )),
        },
        None => Some(all_balances_text(
            all_accounts()
                .iter()
                .map(|a| (a.name.to_string(), a.available_balance)),
            all_credit_cards()
                .iter()
                .map(|c| (c.name.to_string(), c.current_balance, c.available_credit)),
        )),
    }
}

//
// ================= Transactions =================
//

fn summary_text(summary: &TxnSummary, context: &DialogContext) -> String {
    let mut response = format!("You spent {}", format_currency(summary.total));

    if summary.accounts > 1 {
        response.push_str(&format!(" from your {} accounts", summary.accounts));
    }

    if let Some(merchant) = slot_text(context, "merchant") {
        response.push_str(&format!(" on purchases at {}", merchant));
    } else if let Some(category) = slot_text(context, "category") {
        response.push_str(&format!(" on {}", category));
    }

    if let (Some(earliest), Some(latest)) = (&summary.earliest_date, &summary.latest_date) {
        response.push_str(&format!(
            " from {} to {}",
            format_date_for_display(earliest),
            format_date_for_display(latest)
        ));
    }

    if let (Some(direction), Some(threshold)) = (
        slot_text(context, "amount_filter"),
        context.slot("amount_threshold").and_then(SlotValue::as_f64),
    ) {
        response.push_str(&format!(
            " (amounts {} {})",
            direction,
            format_currency(threshold)
        ));
    }

    response.push_str(&format!(
        ", which was {} transactions total.",
        summary.count
    ));

    let percentage = (summary.total / TOTAL_SPENDING) * 100.0;
    response.push_str(&format!(
        " That's {:.2}% of your total spending.",
        percentage
    ));

    response.push_str("\n\nWould you like to see the transaction details?");
    response
}

/// Renders the summary published by the `query_transactions` action.
pub fn display_txn_summary(context: &DialogContext) -> Option<String> {
    let raw = context.slot("txn_summary")?.as_object()?;
    let summary: TxnSummary = serde_json::from_value(raw.clone()).ok()?;
    Some(summary_text(&summary, context))
}

/// Runs the query described by the current slots and summarizes it in one
/// step.
pub fn process_txn_query(context: &DialogContext) -> Option<String> {
    let filter = filter_from_slots(context);
    let transactions = filter_transactions(&filter);

    if transactions.is_empty() {
        return Some(
            "No transactions found matching your criteria. Would you like to try different filters?"
                .to_string(),
        );
    }

    let summary = calculate_txn_summary(&transactions);
    Some(summary_text(&summary, context))
}

/// Detailed transaction rows from the last query, capped for readability.
pub fn display_txn_list(context: &DialogContext) -> Option<String> {
    let transactions = object_list(context, "txn_results");
    if transactions.is_empty() {
        return Some("No transactions to display.".to_string());
    }

    let mut filters_desc: Vec<String> = Vec::new();
    if let Some(merchant) = slot_text(context, "merchant") {
        filters_desc.push(format!("at {}", merchant));
    }
    if let (Some(direction), Some(threshold)) = (
        slot_text(context, "amount_filter"),
        context.slot("amount_threshold").and_then(SlotValue::as_f64),
    ) {
        filters_desc.push(format!("{} {}", direction, format_currency(threshold)));
    }

    let mut lines: Vec<String> = Vec::new();
    if filters_desc.is_empty() {
        lines.push("Here are your transactions:".to_string());
    } else {
        let range = context
            .slot("txn_summary")
            .and_then(SlotValue::as_object)
            .map(|s| {
                format!(
                    " from {} to {}",
                    format_date_for_display(field_str(s, "earliest_date")),
                    format_date_for_display(field_str(s, "latest_date"))
                )
            })
            .unwrap_or_default();
        lines.push(format!(
            "Here are your purchases {}{}:",
            filters_desc.join(" "),
            range
        ));
    }
    lines.push(String::new());

    for txn in transactions.iter().take(TXN_LIST_LIMIT) {
        lines.push(format!(
            "  {} | {:20} | {:>10} | {}",
            field_str(txn, "date"),
            field_str(txn, "merchant"),
            format_currency(field_num(txn, "amount")),
            field_str(txn, "account_name")
        ));
    }

    if transactions.len() > TXN_LIST_LIMIT {
        lines.push(String::new());
        lines.push(format!(
            "(Showing first {} of {} transactions)",
            TXN_LIST_LIMIT,
            transactions.len()
        ));
    }

    lines.push(String::new());
    lines.push("What else can I help you with?".to_string());
    Some(lines.join("\n"))
}

//
// ================= Transfers =================
//

/// Prompts for whichever transfer details are still missing.
pub fn ask_transfer_info(context: &DialogContext) -> Option<String> {
    let has_amount = context.slot("transfer_amount").is_some();
    let has_dest = context.slot("destination_account").is_some();
    let has_source = context.slot("source_account").is_some();

    let text = if !has_amount && !has_dest {
        "How much would you like to transfer, and to which account?"
    } else if !has_amount {
        "How much would you like to transfer?"
    } else if !has_dest {
        "Which account would you like to transfer to?"
    } else if !has_source {
        "Which account would you like to transfer from? (I'll use your spending account if you don't specify.)"
    } else {
        "Let me prepare that transfer for you."
    };
    Some(text.to_string())
}

/// Reads back the collected transfer details for confirmation.
pub fn confirm_transfer_details(context: &DialogContext) -> Option<String> {
    let amount = context
        .slot("transfer_amount")
        .and_then(SlotValue::as_f64)
        .unwrap_or(0.0);
    let dest = slot_text(context, "destination_account").unwrap_or_else(|| "unknown".to_string());
    let source = slot_text(context, "source_account").unwrap_or_else(|| "spending".to_string());

    let date = match context.slot("transfer_date") {
        Some(SlotValue::DateTime(point)) => {
            format_date_for_display(&point.value.format("%Y-%m-%d").to_string())
        }
        Some(other) => other.to_string(),
        None => "today".to_string(),
    };

    let dest_name = find_holding_by_name(&dest)
        .map(|h| h.name().to_string())
        .unwrap_or(dest);
    let source_name = find_holding_by_name(&source)
        .map(|h| h.name().to_string())
        .unwrap_or(source);

    Some(format!(
        "I have the amount to be {}, the destination account to be {}, \
         the source account to be {}, and the date to be {}. \
         Can you confirm this is correct?",
        format_currency(amount),
        dest_name,
        source_name,
        date
    ))
}

/// Success or failure text after `execute_transfer` ran.
pub fn display_transfer_result(context: &DialogContext) -> Option<String> {
    if let Some(conf) = context.slot("transfer_confirmation").and_then(SlotValue::as_object) {
        return Some(format!(
            "Your payment request is complete. {} has been transferred from {} to {}. \
             Here is the confirmation number for your reference: {}. \
             What else can I help you with?",
            format_currency(field_num(conf, "amount")),
            field_str(conf, "source"),
            field_str(conf, "destination"),
            field_str(conf, "confirmation_number")
        ));
    }

    let error = slot_text(context, "transfer_error").unwrap_or_else(|| "Unknown error".to_string());
    Some(format!(
        "I'm sorry, the transfer could not be completed. {}. Would you like to try again?",
        error
    ))
}

//
// ================= Credit Cards =================
//

fn single_card_text(name: &str, minimum_payment: f64, due_date: &str, balance: f64) -> String {
    format!(
        "Your {} has a minimum payment of {} due on {}. Your account balance is {}.",
        name,
        format_currency(minimum_payment),
        format_date_for_display(due_date),
        format_currency(balance)
    )
}

fn all_cards_text(cards: impl Iterator<Item = (String, f64, f64, f64, String)>) -> String {
    let mut lines = vec![
        "Here's the information for all your credit cards:".to_string(),
        String::new(),
    ];
    for (name, balance, available_credit, minimum_payment, due_date) in cards {
        lines.push(format!("{}:", name));
        lines.push(format!("  Balance: {}", format_currency(balance)));
        lines.push(format!(
            "  Available Credit: {}",
            format_currency(available_credit)
        ));
        lines.push(format!(
            "  Minimum Payment: {} due {}",
            format_currency(minimum_payment),
            format_date_for_display(&due_date)
        ));
        lines.push(String::new());
    }
    lines.join("\n")
}

/// Answers a credit-card query straight from the data layer.
pub fn process_credit_card_query(context: &DialogContext) -> Option<String> {
    match slot_text(context, "card_name") {
        Some(card_name) => match find_credit_card_by_name(&card_name) {
            Some(card) => Some(single_card_text(
                card.name,
                card.minimum_payment,
                card.due_date,
                card.current_balance,
            )),
            None => Some(format!(
                "I couldn't find a credit card matching '{}'. Please try a different card name.",
                card_name
            )),
        },
        None => Some(all_cards_text(all_credit_cards().iter().map(|c| {
            (
                c.name.to_string(),
                c.current_balance,
                c.available_credit,
                c.minimum_payment,
                c.due_date.to_string(),
            )
        }))),
    }
}

/// Renders card data published by the `get_credit_card_info` action.
pub fn display_credit_card(context: &DialogContext) -> Option<String> {
    let card_type = slot_text(context, "card_type").unwrap_or_else(|| "single".to_string());

    if card_type == "single" {
        let card = context.slot("card_data")?.as_object()?;
        return Some(single_card_text(
            field_str(card, "name"),
            field_num(card, "minimum_payment"),
            field_str(card, "due_date"),
            field_num(card, "current_balance"),
        ));
    }

    Some(all_cards_text(object_list(context, "all_cards").into_iter().map(
        |c| {
            (
                field_str(c, "name").to_string(),
                field_num(c, "current_balance"),
                field_num(c, "available_credit"),
                field_num(c, "minimum_payment"),
                field_str(c, "due_date").to_string(),
            )
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn context() -> DialogContext {
        DialogContext::new(Uuid::new_v4(), "greeting")
    }

    #[test]
    fn balance_query_answers_for_a_named_account() {
        let mut ctx = context();
        ctx.set_slot("account", SlotValue::text("spending"));
        let text = process_balance_query(&ctx).unwrap();
        assert_eq!(
            text,
            "The available balance for your Spending Account is $11,556.00."
        );
    }

    #[test]
    fn balance_query_reports_unknown_accounts() {
        let mut ctx = context();
        ctx.set_slot("account", SlotValue::text("offshore trust"));
        let text = process_balance_query(&ctx).unwrap();
        assert!(text.contains("couldn't find an account matching 'offshore trust'"));
    }

    #[test]
    fn balance_query_lists_everything_without_an_account_slot() {
        let text = process_balance_query(&context()).unwrap();
        assert!(text.contains("Bank Accounts:"));
        assert!(text.contains("High-Yield Savings: $45,230.00"));
        assert!(text.contains("Travel Rewards Card: $158.00 balance ($14,842.00 available)"));
    }

    #[test]
    fn display_balance_renders_action_published_card_data() {
        let mut ctx = context();
        ctx.set_slot("balance_type", SlotValue::text("single"));
        ctx.set_slot(
            "account_data",
            SlotValue::Object(serde_json::json!({
                "name": "Travel Rewards Card",
                "available_credit": 14842.0
            })),
        );
        assert_eq!(
            display_balance(&ctx).unwrap(),
            "The available balance for your Travel Rewards Card is $14,842.00."
        );
    }

    #[test]
    fn summary_mentions_merchant_range_and_count() {
        let mut ctx = context();
        ctx.set_slot("merchant", SlotValue::text("Amazon"));
        let summary = TxnSummary {
            total: 1355.30,
            count: 23,
            avg: 58.93,
            accounts: 3,
            earliest_date: Some("2023-05-25".to_string()),
            latest_date: Some("2024-11-20".to_string()),
        };

        let text = summary_text(&summary, &ctx);
        assert!(text.starts_with("You spent $1,355.30 from your 3 accounts on purchases at Amazon"));
        assert!(text.contains("from May 25th, 2023 to November 20th, 2024"));
        assert!(text.contains("which was 23 transactions total."));
        assert!(text.contains("1.36% of your total spending"));
        assert!(text.ends_with("Would you like to see the transaction details?"));
    }

    #[test]
    fn txn_list_caps_at_fifteen_rows() {
        let mut ctx = context();
        let rows: Vec<SlotValue> = (0..20)
            .map(|i| {
                SlotValue::Object(serde_json::json!({
                    "date": "2024-06-01",
                    "merchant": "Amazon",
                    "amount": 10.0 + i as f64,
                    "account_name": "Spending Account"
                }))
            })
            .collect();
        ctx.set_slot("txn_results", SlotValue::List(rows));

        let text = display_txn_list(&ctx).unwrap();
        assert!(text.contains("(Showing first 15 of 20 transactions)"));
        assert!(text.ends_with("What else can I help you with?"));
    }

    #[test]
    fn txn_list_without_results_says_so() {
        assert_eq!(
            display_txn_list(&context()).unwrap(),
            "No transactions to display."
        );
    }

    #[test]
    fn transfer_prompt_asks_for_missing_pieces() {
        let mut ctx = context();
        assert_eq!(
            ask_transfer_info(&ctx).unwrap(),
            "How much would you like to transfer, and to which account?"
        );

        ctx.set_slot("transfer_amount", SlotValue::Number(158.0));
        assert_eq!(
            ask_transfer_info(&ctx).unwrap(),
            "Which account would you like to transfer to?"
        );

        ctx.set_slot("destination_account", SlotValue::text("travel_rewards"));
        assert!(ask_transfer_info(&ctx).unwrap().contains("transfer from"));
    }

    #[test]
    fn confirmation_uses_friendly_holding_names() {
        let mut ctx = context();
        ctx.set_slot("transfer_amount", SlotValue::Number(158.0));
        ctx.set_slot("destination_account", SlotValue::text("travel_rewards"));
        ctx.set_slot("source_account", SlotValue::text("spending"));

        let text = confirm_transfer_details(&ctx).unwrap();
        assert!(text.contains("$158.00"));
        assert!(text.contains("Travel Rewards Card"));
        assert!(text.contains("Spending Account"));
        assert!(text.contains("the date to be today"));
        assert!(text.ends_with("Can you confirm this is correct?"));
    }

    #[test]
    fn transfer_result_renders_success_and_failure() {
        let mut ctx = context();
        ctx.set_slot(
            "transfer_confirmation",
            SlotValue::Object(serde_json::json!({
                "amount": 158.0,
                "source": "Spending Account",
                "destination": "Travel Rewards Card",
                "confirmation_number": "829471"
            })),
        );
        let text = display_transfer_result(&ctx).unwrap();
        assert!(text.contains("$158.00 has been transferred from Spending Account"));
        assert!(text.contains("829471"));

        let mut failed = context();
        failed.set_slot("transfer_error", SlotValue::text("Insufficient funds"));
        let text = display_transfer_result(&failed).unwrap();
        assert!(text.contains("could not be completed. Insufficient funds."));
    }

    #[test]
    fn card_query_formats_minimum_payment_and_due_date() {
        let mut ctx = context();
        ctx.set_slot("card_name", SlotValue::text("travel"));
        let text = process_credit_card_query(&ctx).unwrap();
        assert_eq!(
            text,
            "Your Travel Rewards Card has a minimum payment of $40.00 due on December 2nd, 2024. \
             Your account balance is $158.00."
        );
    }

    #[test]
    fn card_query_lists_all_cards_without_a_name() {
        let text = process_credit_card_query(&context()).unwrap();
        assert!(text.contains("Business Platinum:"));
        assert!(text.contains("Minimum Payment: $85.00 due December 20th, 2024"));
    }
}
