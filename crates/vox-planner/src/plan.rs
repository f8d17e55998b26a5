//! The plan model: an ordered list of primitive desktop steps.
//!
//! Plans arrive as loosely-typed JSON from the model. Validation is strict
//! about the envelope (`{"steps": [...]}`) and lenient about individual
//! steps: a malformed step becomes [`Step::Unknown`] or keeps its missing
//! field as `None`, so one bad entry never discards the rest of the plan.

use crate::error::PlanError;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Default pause for a WAIT step without a usable `seconds` field
pub const DEFAULT_WAIT_SECONDS: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Wait { seconds: f64 },
    OpenApp { app: Option<String> },
    OpenUrl { url: Option<String> },
    Type { text: String },
    Press { keys: Vec<String> },
    /// An unrecognized action, or an entry with no action at all
    Unknown { action: Option<String> },
}

impl Step {
    pub fn from_value(value: &Value) -> Step {
        let Some(obj) = value.as_object() else {
            return Step::Unknown { action: None };
        };

        let action = match obj.get("action").and_then(Value::as_str) {
            Some(action) => action,
            None => return Step::Unknown { action: None },
        };

        match action {
            "WAIT" => Step::Wait {
                seconds: obj
                    .get("seconds")
                    .and_then(Value::as_f64)
                    .unwrap_or(DEFAULT_WAIT_SECONDS),
            },
            "OPEN_APP" => Step::OpenApp {
                app: string_field(obj, "app"),
            },
            "OPEN_URL" => Step::OpenUrl {
                url: string_field(obj, "url"),
            },
            "TYPE" => Step::Type {
                text: obj.get("text").map(text_of).unwrap_or_default(),
            },
            "PRESS" => Step::Press {
                keys: press_keys(obj),
            },
            other => Step::Unknown {
                action: Some(other.to_string()),
            },
        }
    }

    /// The wire name of this step's action
    pub fn action(&self) -> &str {
        match self {
            Step::Wait { .. } => "WAIT",
            Step::OpenApp { .. } => "OPEN_APP",
            Step::OpenUrl { .. } => "OPEN_URL",
            Step::Type { .. } => "TYPE",
            Step::Press { .. } => "PRESS",
            Step::Unknown { action } => action.as_deref().unwrap_or("<missing>"),
        }
    }
}

fn string_field(obj: &Map<String, Value>, name: &str) -> Option<String> {
    obj.get(name).and_then(Value::as_str).map(str::to_string)
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `keys` when it is a non-empty list, else a singleton from `key`, else empty
fn press_keys(obj: &Map<String, Value>) -> Vec<String> {
    match obj.get("keys") {
        Some(Value::Array(keys)) if !keys.is_empty() => return keys.iter().map(text_of).collect(),
        Some(Value::String(key)) if !key.is_empty() => return vec![key.clone()],
        _ => {}
    }

    match obj.get("key") {
        Some(Value::String(key)) if !key.is_empty() => vec![key.clone()],
        _ => Vec::new(),
    }
}

impl Serialize for Step {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            Step::Wait { seconds } => {
                map.serialize_entry("action", "WAIT")?;
                map.serialize_entry("seconds", seconds)?;
            }
            Step::OpenApp { app } => {
                map.serialize_entry("action", "OPEN_APP")?;
                if let Some(app) = app {
                    map.serialize_entry("app", app)?;
                }
            }
            Step::OpenUrl { url } => {
                map.serialize_entry("action", "OPEN_URL")?;
                if let Some(url) = url {
                    map.serialize_entry("url", url)?;
                }
            }
            Step::Type { text } => {
                map.serialize_entry("action", "TYPE")?;
                map.serialize_entry("text", text)?;
            }
            Step::Press { keys } => {
                map.serialize_entry("action", "PRESS")?;
                map.serialize_entry("keys", keys)?;
            }
            Step::Unknown { action } => {
                if let Some(action) = action {
                    map.serialize_entry("action", action)?;
                }
            }
        }
        map.end()
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Wait { seconds } => write!(f, "WAIT {}s", seconds),
            Step::OpenApp { app } => write!(f, "OPEN_APP {}", app.as_deref().unwrap_or("<none>")),
            Step::OpenUrl { url } => write!(f, "OPEN_URL {}", url.as_deref().unwrap_or("<none>")),
            Step::Type { text } => write!(f, "TYPE {:?}", text),
            Step::Press { keys } => write!(f, "PRESS {}", keys.join("+")),
            Step::Unknown { .. } => write!(f, "UNKNOWN {}", self.action()),
        }
    }
}

/// An ordered, possibly empty, list of steps
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Plan {
    pub steps: Vec<Step>,
}

impl Plan {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Validate a parsed response into a plan
    pub fn from_value(value: &Value) -> Result<Plan, PlanError> {
        let obj = value
            .as_object()
            .ok_or_else(|| PlanError::Structure(format!("expected an object, got {}", kind(value))))?;

        let steps = match obj.get("steps") {
            Some(Value::Array(steps)) => steps,
            Some(other) => {
                return Err(PlanError::Structure(format!(
                    "\"steps\" must be an array, got {}",
                    kind(other)
                )))
            }
            None => return Err(PlanError::Structure("missing \"steps\"".to_string())),
        };

        Ok(Plan {
            steps: steps.iter().map(Step::from_value).collect(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Compact single-line summary for logs
    pub fn summary(&self) -> String {
        if self.steps.is_empty() {
            return "(no steps)".to_string();
        }
        self.steps
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
