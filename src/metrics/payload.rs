use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{MAX_CORRECT_SCORE, MAX_STUDY_MINUTES_PER_EVENT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    #[serde(rename = "studyTime")]
    StudyTime,
    #[serde(rename = "correct", alias = "formative_evaluation_try")]
    Correct,
    #[serde(rename = "progress")]
    Progress,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [
        MetricKind::StudyTime,
        MetricKind::Correct,
        MetricKind::Progress,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::StudyTime => "studyTime",
            MetricKind::Correct => "correct",
            MetricKind::Progress => "progress",
        }
    }

    /// Payload field holding the number a rollup aggregates. `progress` has none.
    pub fn numeric_field(self) -> Option<&'static str> {
        match self {
            MetricKind::StudyTime => Some("timeMinute"),
            MetricKind::Correct => Some("score"),
            MetricKind::Progress => None,
        }
    }

    fn payload_field(self) -> &'static str {
        match self {
            MetricKind::StudyTime => "timeMinute",
            MetricKind::Correct => "score",
            MetricKind::Progress => "progress",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "studyTime" => Ok(MetricKind::StudyTime),
            "correct" | "formative_evaluation_try" => Ok(MetricKind::Correct),
            "progress" => Ok(MetricKind::Progress),
            _ => Err(()),
        }
    }
}

/// Typed view of a stored event value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricPayload {
    StudyTime { time_minute: f64 },
    Correct { score: f64 },
    Progress { progress: String },
}

impl MetricPayload {
    /// Decodes a stored value for `kind`.
    ///
    /// The raw value may be an object or a string holding serialized JSON.
    /// Numeric fields accept JSON numbers and numeric strings; anything else
    /// yields `None` so the caller can skip the event.
    pub fn decode(kind: MetricKind, raw: &Value) -> Option<Self> {
        let parsed;
        let object = match raw {
            Value::Object(map) => map,
            Value::String(text) => {
                parsed = serde_json::from_str::<Value>(text).ok()?;
                parsed.as_object()?
            }
            _ => return None,
        };

        let field = object.get(kind.payload_field())?;
        match kind {
            MetricKind::StudyTime => coerce_number(field).map(|time_minute| {
                MetricPayload::StudyTime { time_minute }
            }),
            MetricKind::Correct => coerce_number(field).map(|score| MetricPayload::Correct { score }),
            MetricKind::Progress => coerce_identifier(field)
                .map(|progress| MetricPayload::Progress { progress }),
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            MetricPayload::StudyTime { .. } => MetricKind::StudyTime,
            MetricPayload::Correct { .. } => MetricKind::Correct,
            MetricPayload::Progress { .. } => MetricKind::Progress,
        }
    }

    pub fn numeric(&self) -> Option<f64> {
        match self {
            MetricPayload::StudyTime { time_minute } => Some(*time_minute),
            MetricPayload::Correct { score } => Some(*score),
            MetricPayload::Progress { .. } => None,
        }
    }

    /// Range check applied when recording. Stored rows are never re-checked.
    pub fn check_bounds(&self) -> Result<(), String> {
        match self {
            MetricPayload::StudyTime { time_minute } => {
                if !(0.0..=MAX_STUDY_MINUTES_PER_EVENT).contains(time_minute) {
                    return Err(format!(
                        "timeMinute must be between 0 and {MAX_STUDY_MINUTES_PER_EVENT}"
                    ));
                }
            }
            MetricPayload::Correct { score } => {
                if !(0.0..=MAX_CORRECT_SCORE).contains(score) {
                    return Err(format!("score must be between 0 and {MAX_CORRECT_SCORE}"));
                }
            }
            MetricPayload::Progress { .. } => {}
        }
        Ok(())
    }

    pub fn progress_id(&self) -> Option<&str> {
        match self {
            MetricPayload::Progress { progress } => Some(progress),
            _ => None,
        }
    }

    /// Normalized object form persisted on the write path.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        let field = self.kind().payload_field().to_string();
        match self {
            MetricPayload::StudyTime { time_minute } => {
                map.insert(field, number_value(*time_minute));
            }
            MetricPayload::Correct { score } => {
                map.insert(field, number_value(*score));
            }
            MetricPayload::Progress { progress } => {
                map.insert(field, Value::String(progress.clone()));
            }
        }
        Value::Object(map)
    }
}

/// Shortcut for the numeric rollup path: decode then take the number.
pub fn extract_numeric(kind: MetricKind, raw: &Value) -> Option<f64> {
    MetricPayload::decode(kind, raw).and_then(|payload| payload.numeric())
}

fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };
    number.is_finite().then_some(number)
}

fn coerce_identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_value(number: f64) -> Value {
    serde_json::Number::from_f64(number)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
