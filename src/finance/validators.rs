//! Slot validators and name-normalizing enrichers
//!
//! Validators run on the raw NLU payload before enrichment; the normalizers
//! fold colloquial account/card names onto the canonical keys the data
//! layer indexes by.

use crate::context::SlotValue;
use crate::nlu::Extraction;

/// Rejects extractions that don't read as a positive number. Runs before
/// enrichment, so it parses leniently: currency symbols and grouping commas
/// in the raw span are ignored.
pub fn validate_positive(raw: &[Extraction]) -> bool {
    let Some(first) = raw.first() else {
        return false;
    };
    if let Some(n) = first.value.as_ref().and_then(SlotValue::as_f64) {
        return n > 0.0;
    }
    parse_lenient(&first.text).map(|n| n > 0.0).unwrap_or(false)
}

fn parse_lenient(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse().ok()
}

const ACCOUNT_ALIASES: &[(&str, &str)] = &[
    ("checking", "spending"),
    ("main", "spending"),
    ("primary", "spending"),
    ("debit", "spending"),
    ("emergency", "savings"),
    ("rainy day", "savings"),
    ("high yield", "savings"),
    ("travel fund", "vacation"),
    ("trip", "vacation"),
    ("holiday", "vacation"),
    ("shared", "joint"),
    ("household", "joint"),
    ("family", "joint"),
];

const CARD_ALIASES: &[(&str, &str)] = &[
    ("travel", "travel_rewards"),
    ("travel card", "travel_rewards"),
    ("travel rewards", "travel_rewards"),
    ("rewards", "travel_rewards"),
    ("travel credit", "travel_rewards"),
    ("cash back", "cash_back"),
    ("cashback", "cash_back"),
    ("everyday", "cash_back"),
    ("daily", "cash_back"),
    ("platinum", "business"),
    ("work", "business"),
    ("corporate", "business"),
];

fn normalize_with(aliases: &[(&str, &str)], text: &str) -> SlotValue {
    let normalized = text.trim().to_lowercase();
    let canonical = aliases
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or(normalized);
    SlotValue::Text(canonical)
}

/// Enricher: maps common account-name variations to canonical keys.
pub fn normalize_account_name(text: &str) -> SlotValue {
    normalize_with(ACCOUNT_ALIASES, text)
}

/// Enricher: maps common credit-card-name variations to canonical keys.
pub fn normalize_card_name(text: &str) -> SlotValue {
    normalize_with(CARD_ALIASES, text)
}
