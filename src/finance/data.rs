//! Mock data layer for the personal finance assistant
//!
//! Accounts, credit cards, and a deterministically generated transaction
//! table, plus the lookup/filter/summary helpers actions and response
//! functions build on. Stands in for the real banking backend.

use chrono::{Datelike, Duration, NaiveDate};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use serde_json::Value;

//
// ================= Accounts =================
//

#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub key: &'static str,
    pub id: &'static str,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub account_type: &'static str,
    pub balance: f64,
    pub available_balance: f64,
    pub account_number_last4: &'static str,
}

pub static ACCOUNTS: &[Account] = &[
    Account {
        key: "spending",
        id: "acct_001",
        name: "Spending Account",
        aliases: &["spending", "checking", "main", "primary", "debit"],
        account_type: "CHECKING",
        balance: 11556.00,
        available_balance: 11556.00,
        account_number_last4: "4521",
    },
    Account {
        key: "savings",
        id: "acct_002",
        name: "High-Yield Savings",
        aliases: &["savings", "emergency", "rainy day", "high yield"],
        account_type: "SAVINGS",
        balance: 45230.00,
        available_balance: 45230.00,
        account_number_last4: "7832",
    },
    Account {
        key: "vacation",
        id: "acct_003",
        name: "Vacation Fund",
        aliases: &["vacation", "travel fund", "trip", "holiday"],
        account_type: "SAVINGS",
        balance: 3200.00,
        available_balance: 3200.00,
        account_number_last4: "9104",
    },
    Account {
        key: "joint",
        id: "acct_004",
        name: "Joint Checking",
        aliases: &["joint", "shared", "household", "family"],
        account_type: "CHECKING",
        balance: 8750.00,
        available_balance: 8750.00,
        account_number_last4: "2256",
    },
];

//
// ================= Credit Cards =================
//

#[derive(Debug, Clone, Serialize)]
pub struct CreditCard {
    pub key: &'static str,
    pub id: &'static str,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub current_balance: f64,
    pub credit_limit: f64,
    pub available_credit: f64,
    pub minimum_payment: f64,
    pub due_date: &'static str,
    pub apr: f64,
    pub card_number_last4: &'static str,
}

pub static CREDIT_CARDS: &[CreditCard] = &[
    CreditCard {
        key: "travel_rewards",
        id: "cc_001",
        name: "Travel Rewards Card",
        aliases: &["travel", "travel card", "travel rewards", "rewards", "travel credit"],
        current_balance: 158.00,
        credit_limit: 15000.00,
        available_credit: 14842.00,
        minimum_payment: 40.00,
        due_date: "2024-12-02",
        apr: 18.99,
        card_number_last4: "4892",
    },
    CreditCard {
        key: "cash_back",
        id: "cc_002",
        name: "Cash Back Card",
        aliases: &["cash back", "cashback", "everyday", "daily"],
        current_balance: 567.23,
        credit_limit: 8000.00,
        available_credit: 7432.77,
        minimum_payment: 25.00,
        due_date: "2024-12-15",
        apr: 21.99,
        card_number_last4: "7621",
    },
    CreditCard {
        key: "business",
        id: "cc_003",
        name: "Business Platinum",
        aliases: &["business", "platinum", "work", "corporate"],
        current_balance: 3421.89,
        credit_limit: 25000.00,
        available_credit: 21578.11,
        minimum_payment: 85.00,
        due_date: "2024-12-20",
        apr: 16.99,
        card_number_last4: "3345",
    },
];

/// Either kind of money holder, so transfers and balance lookups can treat
/// bank accounts and credit cards uniformly.
#[derive(Debug, Clone, Copy)]
pub enum Holding {
    Account(&'static Account),
    Card(&'static CreditCard),
}

impl Holding {
    pub fn id(&self) -> &'static str {
        match self {
            Holding::Account(a) => a.id,
            Holding::Card(c) => c.id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Holding::Account(a) => a.name,
            Holding::Card(c) => c.name,
        }
    }

    /// Funds available to draw on: balance for accounts, remaining credit
    /// for cards.
    pub fn available(&self) -> f64 {
        match self {
            Holding::Account(a) => a.available_balance,
            Holding::Card(c) => c.available_credit,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Holding::Account(a) => serde_json::to_value(a).unwrap_or(Value::Null),
            Holding::Card(c) => serde_json::to_value(c).unwrap_or(Value::Null),
        }
    }
}

/// Finds a bank account or credit card by key, alias, or partial display
/// name (case-insensitive). Accounts win ties, matching lookup priority of
/// the banking backend.
pub fn find_holding_by_name(name: &str) -> Option<Holding> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    for account in ACCOUNTS {
        if matches_holder(&needle, account.key, account.aliases, account.name) {
            return Some(Holding::Account(account));
        }
    }
    for card in CREDIT_CARDS {
        if matches_holder(&needle, card.key, card.aliases, card.name) {
            return Some(Holding::Card(card));
        }
    }
    None
}

pub fn find_credit_card_by_name(name: &str) -> Option<&'static CreditCard> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    CREDIT_CARDS
        .iter()
        .find(|card| matches_holder(&needle, card.key, card.aliases, card.name))
}

fn matches_holder(needle: &str, key: &str, aliases: &[&str], display_name: &str) -> bool {
    needle == key
        || aliases.iter().any(|alias| alias.eq_ignore_ascii_case(needle))
        || display_name.to_lowercase().contains(needle)
}

pub fn all_accounts() -> &'static [Account] {
    ACCOUNTS
}

pub fn all_credit_cards() -> &'static [CreditCard] {
    CREDIT_CARDS
}

//
// ================= Transactions =================
//

#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: String,
    pub date: String,
    pub merchant: &'static str,
    pub category: &'static str,
    pub amount: f64,
    pub account_id: &'static str,
    pub account_name: &'static str,
    pub location: &'static str,
}

const CATEGORIES: &[&str] = &[
    "Shopping",
    "Groceries",
    "Dining",
    "Entertainment",
    "Transportation",
    "Utilities",
    "Healthcare",
    "Travel",
];

const MERCHANTS: &[(&str, &[&str])] = &[
    ("Shopping", &["Amazon", "Target", "Walmart", "Best Buy", "Apple Store", "Nike", "Costco", "Nordstrom", "Home Depot"]),
    ("Groceries", &["Whole Foods", "Trader Joe's", "Kroger", "Safeway", "Costco", "Sprouts"]),
    ("Dining", &["Starbucks", "Chipotle", "McDonald's", "Olive Garden", "Local Restaurant", "Panera Bread"]),
    ("Entertainment", &["Netflix", "Spotify", "AMC Theatres", "Steam", "Disney+", "Apple Music"]),
    ("Transportation", &["Uber", "Lyft", "Shell Gas", "Chevron", "BART", "Parking"]),
    ("Utilities", &["PG&E", "Comcast", "AT&T", "Water Company", "Verizon"]),
    ("Healthcare", &["CVS Pharmacy", "Kaiser", "Walgreens", "Doctor Visit"]),
    ("Travel", &["United Airlines", "Marriott", "Airbnb", "Delta Airlines", "Hilton", "Expedia"]),
];

const ONLINE_MERCHANTS: &[&str] = &[
    "Amazon", "Netflix", "Spotify", "Disney+", "Steam", "Apple Music", "Expedia",
];

const LOCATIONS: &[&str] = &[
    "San Francisco, CA",
    "New York, NY",
    "Online",
    "Chicago, IL",
    "Seattle, WA",
    "Los Angeles, CA",
    "Austin, TX",
];

/// Fixed anchor so the generated table is stable across runs.
const TXN_END_DATE: (i32, u32, u32) = (2024, 11, 25);
const TXN_HISTORY_DAYS: i64 = 730;
const TXN_COUNT: usize = 480;

lazy_static! {
    pub static ref TRANSACTIONS: Vec<Transaction> = generate_transactions(TXN_COUNT);
}

/// Small deterministic PRNG so the mock table is reproducible without
/// pulling in a randomness crate.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn pick(&mut self, bound: usize) -> usize {
        (self.next() as usize) % bound
    }

    fn amount_in(&mut self, min: f64, max: f64) -> f64 {
        let t = (self.next() % 10_000) as f64 / 10_000.0;
        ((min + t * (max - min)) * 100.0).round() / 100.0
    }
}

fn amount_range(category: &str) -> (f64, f64) {
    match category {
        "Shopping" => (15.00, 500.00),
        "Groceries" => (25.00, 200.00),
        "Dining" => (8.00, 100.00),
        "Entertainment" => (10.00, 80.00),
        "Transportation" => (5.00, 75.00),
        "Utilities" => (50.00, 300.00),
        "Healthcare" => (15.00, 200.00),
        "Travel" => (100.00, 1500.00),
        _ => (10.00, 100.00),
    }
}

fn generate_transactions(count: usize) -> Vec<Transaction> {
    let (y, m, d) = TXN_END_DATE;
    let end_date = NaiveDate::from_ymd_opt(y, m, d).expect("valid anchor date");
    let mut rng = Lcg(0x5EED_2024);
    let mut transactions = Vec::with_capacity(count);

    for i in 0..count {
        let category = CATEGORIES[rng.pick(CATEGORIES.len())];
        let merchants = MERCHANTS
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, m)| *m)
            .unwrap_or(&[]);
        let merchant = merchants[rng.pick(merchants.len())];
        let (min, max) = amount_range(category);
        let amount = rng.amount_in(min, max);

        let days_ago = rng.pick(TXN_HISTORY_DAYS as usize + 1) as i64;
        let date = end_date - Duration::days(days_ago);

        let holder_index = rng.pick(ACCOUNTS.len() + CREDIT_CARDS.len());
        let (account_id, account_name) = if holder_index < ACCOUNTS.len() {
            (ACCOUNTS[holder_index].id, ACCOUNTS[holder_index].name)
        } else {
            let card = &CREDIT_CARDS[holder_index - ACCOUNTS.len()];
            (card.id, card.name)
        };

        let location = if ONLINE_MERCHANTS.contains(&merchant) {
            "Online"
        } else {
            LOCATIONS[rng.pick(LOCATIONS.len())]
        };

        transactions.push(Transaction {
            id: format!("txn_{:05}", i),
            date: date.format("%Y-%m-%d").to_string(),
            merchant,
            category,
            amount,
            account_id,
            account_name,
            location,
        });
    }

    transactions
}

//
// ================= Filtering & Summaries =================
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountFilter {
    Over,
    Under,
}

impl AmountFilter {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "over" | "above" | "more than" => Some(AmountFilter::Over),
            "under" | "below" | "less than" => Some(AmountFilter::Under),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TxnFilter {
    pub merchant: Option<String>,
    pub category: Option<String>,
    pub amount_filter: Option<AmountFilter>,
    pub amount_threshold: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub location: Option<String>,
    pub account_name: Option<String>,
}

pub fn filter_transactions(filter: &TxnFilter) -> Vec<&'static Transaction> {
    apply_filter(TRANSACTIONS.iter(), filter)
}

fn apply_filter<'a>(
    transactions: impl Iterator<Item = &'a Transaction>,
    filter: &TxnFilter,
) -> Vec<&'a Transaction> {
    let account_id = filter
        .account_name
        .as_deref()
        .and_then(find_holding_by_name)
        .map(|holding| holding.id());

    transactions
        .filter(|t| {
            if let Some(merchant) = &filter.merchant {
                if !t.merchant.to_lowercase().contains(&merchant.to_lowercase()) {
                    return false;
                }
            }
            if let Some(category) = &filter.category {
                if !t.category.to_lowercase().contains(&category.to_lowercase()) {
                    return false;
                }
            }
            if let (Some(direction), Some(threshold)) =
                (filter.amount_filter, filter.amount_threshold)
            {
                let keep = match direction {
                    AmountFilter::Over => t.amount > threshold,
                    AmountFilter::Under => t.amount < threshold,
                };
                if !keep {
                    return false;
                }
            }
            // Dates are ISO strings, so lexicographic comparison is fine.
            if let Some(start) = &filter.start_date {
                if t.date.as_str() < start.as_str() {
                    return false;
                }
            }
            if let Some(end) = &filter.end_date {
                if t.date.as_str() > end.as_str() {
                    return false;
                }
            }
            if let Some(location) = &filter.location {
                if !t.location.to_lowercase().contains(&location.to_lowercase()) {
                    return false;
                }
            }
            if let Some(account_id) = account_id {
                if t.account_id != account_id {
                    return false;
                }
            }
            true
        })
        .collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TxnSummary {
    pub total: f64,
    pub count: usize,
    pub avg: f64,
    pub accounts: usize,
    pub earliest_date: Option<String>,
    pub latest_date: Option<String>,
}

pub fn calculate_txn_summary(transactions: &[&Transaction]) -> TxnSummary {
    if transactions.is_empty() {
        return TxnSummary::default();
    }

    let total: f64 = transactions.iter().map(|t| t.amount).sum();
    let count = transactions.len();
    let mut account_ids: Vec<&str> = transactions.iter().map(|t| t.account_id).collect();
    account_ids.sort_unstable();
    account_ids.dedup();

    TxnSummary {
        total: (total * 100.0).round() / 100.0,
        count,
        avg: ((total / count as f64) * 100.0).round() / 100.0,
        accounts: account_ids.len(),
        earliest_date: transactions.iter().map(|t| t.date.clone()).min(),
        latest_date: transactions.iter().map(|t| t.date.clone()).max(),
    }
}

//
// ================= Formatting =================
//

/// "$1,234.56" (or "-$1,234.56"); used by every money-bearing response.
pub fn format_currency(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    let mut digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    while digits.len() > 3 {
        let split = digits.len() - 3;
        grouped.insert_str(0, &format!(",{}", &digits[split..]));
        digits.truncate(split);
    }
    grouped.insert_str(0, &digits);

    let sign = if negative { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, frac)
}

/// "November 25th, 2024" from an ISO date; unparseable input is returned
/// unchanged.
pub fn format_date_for_display(date_str: &str) -> String {
    let Ok(date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") else {
        return date_str.to_string();
    };
    let day = date.day();
    let suffix = match day {
        11..=13 => "th",
        _ => match day % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    };
    format!("{} {}{}, {}", date.format("%B"), day, suffix, date.year())
}
