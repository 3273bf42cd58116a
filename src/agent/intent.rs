//! Tool calls produced by an intent classifier
//!
//! An upstream language model turns an utterance such as "remind me to buy
//! milk tomorrow" into a tool call:
//!
//! ```json
//! {"tool": "create_task", "args": {"title": "buy milk", "scheduled_time": "tomorrow"}}
//! ```
//!
//! Arguments stay loosely typed here (strings and numbers as the model
//! produced them); validation happens when the tool runs so that every
//! failure can be reported back in words.

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntentError {
    #[error("Malformed tool call: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Tool call must be a JSON object")]
    NotAnObject,
}

/// One tool invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tool", content = "args", rename_all = "snake_case")]
pub enum Intent {
    ListTasks {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<String>,
    },

    CreateTask {
        #[serde(default)]
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        priority: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scheduled_time: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<String>,
    },

    UpdateTask {
        #[serde(default, deserialize_with = "loose_number", skip_serializing_if = "Option::is_none")]
        task_id: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_title: Option<String>,
        #[serde(default, deserialize_with = "loose_number", skip_serializing_if = "Option::is_none")]
        task_number: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        priority: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scheduled_time: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<String>,
    },

    DeleteTask {
        #[serde(default, deserialize_with = "loose_number", skip_serializing_if = "Option::is_none")]
        task_id: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_title: Option<String>,
        #[serde(default, deserialize_with = "loose_number", skip_serializing_if = "Option::is_none")]
        task_number: Option<u64>,
    },

    SearchTasks {
        #[serde(default)]
        query: String,
    },
}

impl Intent {
    /// Parses a tool call from JSON
    ///
    /// Accepts `{"tool", "args"}` as well as the `{"name", "arguments"}`
    /// shape many function-calling APIs emit, where `arguments` may itself
    /// be a JSON-encoded string. Missing or null `args` means no arguments.
    pub fn from_json(input: &str) -> Result<Self, IntentError> {
        let mut value: Value = serde_json::from_str(input)?;
        let obj = value.as_object_mut().ok_or(IntentError::NotAnObject)?;

        if !obj.contains_key("tool") {
            if let Some(name) = obj.remove("name") {
                obj.insert("tool".to_string(), name);
            }
        }
        if !obj.contains_key("args") {
            if let Some(arguments) = obj.remove("arguments") {
                let arguments = match arguments {
                    Value::String(encoded) => serde_json::from_str(&encoded)?,
                    other => other,
                };
                obj.insert("args".to_string(), arguments);
            }
        }
        match obj.get("args") {
            None | Some(Value::Null) => {
                obj.insert("args".to_string(), json!({}));
            }
            Some(_) => {}
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Wire name of the tool
    pub fn tool_name(&self) -> &'static str {
        match self {
            Intent::ListTasks { .. } => "list_tasks",
            Intent::CreateTask { .. } => "create_task",
            Intent::UpdateTask { .. } => "update_task",
            Intent::DeleteTask { .. } => "delete_task",
            Intent::SearchTasks { .. } => "search_tasks",
        }
    }
}

/// Accepts `3`, `3.0`, `"3"`, `"#3"` or null
fn loose_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Int(u64),
        Float(f64),
        Text(String),
    }

    match Option::<Loose>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Loose::Int(n)) => Ok(Some(n)),
        Some(Loose::Float(f)) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => {
            Ok(Some(f as u64))
        }
        Some(Loose::Float(f)) => Err(de::Error::custom(format!("expected a task number, got {f}"))),
        Some(Loose::Text(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .trim_start_matches('#')
                .parse()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("expected a task number, got '{s}'")))
        }
    }
}
