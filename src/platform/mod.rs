pub mod telegram;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Attribute-style access to a platform object that is not plain JSON.
pub trait Attributes: fmt::Debug + Send + Sync {
    /// Short type label used in diagnostics (e.g. "User")
    fn type_name(&self) -> &str;

    /// Look up a named attribute, `None` when the object has no such field
    fn attr(&self, name: &str) -> Option<RawPayload>;
}

/// Loosely-typed platform data attached to a message.
#[derive(Debug, Clone)]
pub enum RawPayload {
    /// Map-like data (decoded JSON or a scalar inside it)
    Value(Value),
    /// Object exposing its fields through [`Attributes`]
    Object(Arc<dyn Attributes>),
}

impl RawPayload {
    /// Get a nested field by name. Any shape mismatch reads as absence.
    pub fn field(&self, name: &str) -> Option<RawPayload> {
        match self {
            RawPayload::Value(Value::Object(map)) => match map.get(name) {
                Some(Value::Null) | None => None,
                Some(v) => Some(RawPayload::Value(v.clone())),
            },
            RawPayload::Value(_) => None,
            RawPayload::Object(obj) => obj.attr(name),
        }
    }

    /// Scalar value of this payload as text; `None` for maps, objects,
    /// null, and blank strings.
    pub fn as_text(&self) -> Option<String> {
        let text = match self {
            RawPayload::Value(Value::String(s)) => s.clone(),
            RawPayload::Value(Value::Number(n)) => n.to_string(),
            RawPayload::Value(Value::Bool(b)) => b.to_string(),
            _ => return None,
        };
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Shorthand for `field(name)` followed by `as_text()`.
    pub fn text(&self, name: &str) -> Option<String> {
        self.field(name).and_then(|f| f.as_text())
    }

    /// One-line description of the payload's shape.
    pub fn shape(&self) -> String {
        match self {
            RawPayload::Value(Value::Object(map)) => {
                let keys: Vec<&str> = map.keys().map(String::as_str).collect();
                format!("map ({} keys: {})", keys.len(), keys.join(", "))
            }
            RawPayload::Value(Value::Array(items)) => format!("list ({} items)", items.len()),
            RawPayload::Value(Value::Null) => "null".to_string(),
            RawPayload::Value(other) => format!("scalar ({})", other),
            RawPayload::Object(obj) => format!("object ({})", obj.type_name()),
        }
    }
}

impl From<Value> for RawPayload {
    fn from(value: Value) -> Self {
        RawPayload::Value(value)
    }
}

impl From<&str> for RawPayload {
    fn from(value: &str) -> Self {
        RawPayload::Value(Value::String(value.to_string()))
    }
}

impl From<u64> for RawPayload {
    fn from(value: u64) -> Self {
        RawPayload::Value(Value::from(value))
    }
}

impl From<bool> for RawPayload {
    fn from(value: bool) -> Self {
        RawPayload::Value(Value::Bool(value))
    }
}

/// A message received from any platform
#[derive(Debug, Clone, Default)]
pub struct InboundMessage {
    /// Platform identifier (e.g. "telegram", "aiocqhttp")
    pub platform: String,
    /// Platform-specific sender id as string
    pub sender_id: String,
    /// Display name supplied by the platform, possibly empty
    pub sender_name: String,
    /// Raw sender record
    pub sender: Option<RawPayload>,
    /// Raw message record
    pub raw_message: Option<RawPayload>,
    /// Plain-text content
    pub text: String,
}
