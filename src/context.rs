//! Per-session conversation state
//!
//! One `DialogContext` per conversation. Mutated exclusively by the engine
//! during `process_turn`; the host owns creation and teardown.

use crate::nlu::Extraction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

//
// ================= Slot Values =================
//

/// Money value as produced by amount-of-money enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Money {
    pub value: f64,
    pub unit: String,
}

/// A resolved point in time, with the granularity the enricher reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub value: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grain: Option<String>,
}

/// Normalized slot value. The enricher configured for a slot decides which
/// variant it produces; un-enriched extractions land as `Text`.
///
/// Deserialization goes through [`SlotValue::from_json`] so collaborator
/// payloads are classified by shape rather than by tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SlotValue {
    Number(f64),
    Text(String),
    Money(Money),
    DateTime(TimePoint),
    Interval {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<TimePoint>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<TimePoint>,
    },
    List(Vec<SlotValue>),
    Object(Value),
}

impl SlotValue {
    pub fn text(s: impl Into<String>) -> Self {
        SlotValue::Text(s.into())
    }

    /// Maps a loosely-typed collaborator payload into the closed union.
    /// Recognizes the common enrichment-service shapes (money values, time
    /// values, time intervals); anything else structured stays `Object`.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::String(s) => SlotValue::Text(s),
            Value::Number(n) => match n.as_f64() {
                Some(f) => SlotValue::Number(f),
                None => SlotValue::Text(n.to_string()),
            },
            Value::Array(items) => {
                SlotValue::List(items.into_iter().map(SlotValue::from_json).collect())
            }
            Value::Object(ref map) => {
                if let Some(money) = parse_money(map) {
                    return SlotValue::Money(money);
                }
                if map.get("type").and_then(Value::as_str) == Some("interval") {
                    return SlotValue::Interval {
                        from: map.get("from").and_then(parse_time_point),
                        to: map.get("to").and_then(parse_time_point),
                    };
                }
                if let Some(point) = parse_time_point(&value) {
                    return SlotValue::DateTime(point);
                }
                // Bare numeric value objects (number/ordinal dimensions).
                if map.get("type").and_then(Value::as_str) == Some("value") {
                    if let Some(n) = map.get("value").and_then(Value::as_f64) {
                        return SlotValue::Number(n);
                    }
                }
                SlotValue::Object(value)
            }
            other => SlotValue::Object(other),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SlotValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view: numbers directly, money by its value, text by parsing.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SlotValue::Number(n) => Some(*n),
            SlotValue::Money(m) => Some(m.value),
            SlotValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Value> {
        match self {
            SlotValue::Object(v) => Some(v),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for SlotValue {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(SlotValue::from_json(value))
    }
}

fn parse_money(map: &serde_json::Map<String, Value>) -> Option<Money> {
    let value = map.get("value")?.as_f64()?;
    let unit = map.get("unit")?.as_str()?.to_string();
    Some(Money { value, unit })
}

fn parse_time_point(value: &Value) -> Option<TimePoint> {
    let raw = value.get("value")?.as_str()?;
    let parsed = DateTime::parse_from_rfc3339(raw).ok()?;
    Some(TimePoint {
        value: parsed.with_timezone(&Utc),
        grain: value
            .get("grain")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

impl fmt::Display for SlotValue {
    /// String form used by template substitution.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotValue::Text(s) => write!(f, "{}", s),
            SlotValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            SlotValue::Money(m) => write!(f, "{:.2} {}", m.value, m.unit),
            SlotValue::DateTime(t) => write!(f, "{}", t.value.format("%Y-%m-%d")),
            SlotValue::Interval { from, to } => match (from, to) {
                (Some(from), Some(to)) => write!(
                    f,
                    "{} to {}",
                    from.value.format("%Y-%m-%d"),
                    to.value.format("%Y-%m-%d")
                ),
                (Some(from), None) => write!(f, "since {}", from.value.format("%Y-%m-%d")),
                (None, Some(to)) => write!(f, "until {}", to.value.format("%Y-%m-%d")),
                (None, None) => Ok(()),
            },
            SlotValue::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", parts.join(", "))
            }
            SlotValue::Object(v) => write!(f, "{}", v),
        }
    }
}

//
// ================= Turn Records =================
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Agent,
    System,
}

/// One completed request/response cycle.
#[derive(Debug, Clone, Serialize)]
pub struct TurnRecord {
    pub role: TurnRole,
    pub text: String,
    pub state_in: String,
    pub state_out: String,
    pub bot_response: String,
    pub slots: HashMap<String, SlotValue>,
    pub at: DateTime<Utc>,
}

/// Read-only view for prompt and schema builders.
#[derive(Debug, Clone, Serialize)]
pub struct ContextSnapshot {
    pub current_state: String,
    pub slots: HashMap<String, SlotValue>,
    pub last_turn: Option<TurnRecord>,
}

//
// ================= Dialog Context =================
//

/// Mutable per-session record: current position in the state graph, filled
/// slots, and the turn history.
#[derive(Debug, Clone, Serialize)]
pub struct DialogContext {
    session_id: Uuid,
    pub current_state: String,
    pub previous_state: Option<String>,
    pub slots: HashMap<String, SlotValue>,
    pub slot_metadata: HashMap<String, Vec<Extraction>>,
    pub history: Vec<TurnRecord>,
}

impl DialogContext {
    pub fn new(session_id: Uuid, start_state: impl Into<String>) -> Self {
        Self {
            session_id,
            current_state: start_state.into(),
            previous_state: None,
            slots: HashMap::new(),
            slot_metadata: HashMap::new(),
            history: Vec::new(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Writes a slot from raw NLU extractions. The first candidate wins:
    /// its enriched value if present, its source text otherwise. The full
    /// raw payload is retained in `slot_metadata`.
    pub fn update_slot(&mut self, key: impl Into<String>, extractions: Vec<Extraction>) {
        let key = key.into();
        let normalized = match extractions.first() {
            Some(first) => match &first.value {
                Some(value) => value.clone(),
                None => SlotValue::Text(first.text.clone()),
            },
            None => return,
        };
        self.slots.insert(key.clone(), normalized);
        self.slot_metadata.insert(key, extractions);
    }

    /// Direct typed write, used by actions to publish results for rendering.
    /// Does not touch `slot_metadata`.
    pub fn set_slot(&mut self, key: impl Into<String>, value: SlotValue) {
        self.slots.insert(key.into(), value);
    }

    pub fn slot(&self, key: &str) -> Option<&SlotValue> {
        self.slots.get(key)
    }

    pub fn clear_slot(&mut self, key: &str) {
        self.slots.remove(key);
        self.slot_metadata.remove(key);
    }

    /// Appends a turn record. No side effects beyond the append.
    pub fn record_turn(
        &mut self,
        user_input: &str,
        state_in: &str,
        state_out: &str,
        bot_response: &str,
        slots: HashMap<String, SlotValue>,
    ) {
        self.history.push(TurnRecord {
            role: TurnRole::User,
            text: user_input.to_string(),
            state_in: state_in.to_string(),
            state_out: state_out.to_string(),
            bot_response: bot_response.to_string(),
            slots,
            at: Utc::now(),
        });
    }

    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            current_state: self.current_state.clone(),
            slots: self.slots.clone(),
            last_turn: self.history.last().cloned(),
        }
    }
}
