//! Canonical tree for arbitrary tool output.
//!
//! Tool results arrive in several shapes: a raw object, a raw list, a
//! JSON-encoded string, or an envelope object whose payload lives under a
//! single field (by default `"text"`) either as a nested value or as JSON
//! text. [`Normalizer`] folds all of them into one [`CanonicalNode`] tree so
//! the renderers only ever see three cases.

use serde_json::{Map, Value};

/// Default name of the envelope field wrapping a tool payload.
pub const DEFAULT_ENVELOPE_FIELD: &str = "text";

/// Normalized tool output. Objects keep key insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalNode {
    /// A leaf, already coerced to text. `None` stands for JSON `null`.
    Scalar(Option<String>),
    Object(Vec<(String, CanonicalNode)>),
    List(Vec<CanonicalNode>),
}

impl CanonicalNode {
    /// Structural conversion with no envelope handling and no string parsing.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => CanonicalNode::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), CanonicalNode::from_value(v)))
                    .collect(),
            ),
            Value::Array(items) => {
                CanonicalNode::List(items.iter().map(CanonicalNode::from_value).collect())
            }
            other => CanonicalNode::Scalar(scalar_text(other)),
        }
    }

    /// Convert back to JSON. Scalars come back as strings (or `null`).
    pub fn to_value(&self) -> Value {
        match self {
            CanonicalNode::Scalar(None) => Value::Null,
            CanonicalNode::Scalar(Some(s)) => Value::String(s.clone()),
            CanonicalNode::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect::<Map<String, Value>>(),
            ),
            CanonicalNode::List(items) => {
                Value::Array(items.iter().map(CanonicalNode::to_value).collect())
            }
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, CanonicalNode::Object(_))
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, CanonicalNode::Scalar(_))
    }

    /// Look up a key on an object node.
    pub fn get(&self, key: &str) -> Option<&CanonicalNode> {
        match self {
            CanonicalNode::Object(entries) => {
                entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
            }
            _ => None,
        }
    }
}

/// Coerce a JSON scalar to display text. `null` has no text.
///
/// Strings are returned unquoted; numbers and booleans use their JSON
/// spelling. Composite values are rendered as compact JSON.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        composite => Some(composite.to_string()),
    }
}

/// Turns raw tool output into a [`CanonicalNode`].
#[derive(Debug, Clone)]
pub struct Normalizer {
    envelope_field: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            envelope_field: DEFAULT_ENVELOPE_FIELD.to_string(),
        }
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different envelope field name.
    pub fn with_envelope_field(mut self, field: impl Into<String>) -> Self {
        self.envelope_field = field.into();
        self
    }

    pub fn envelope_field(&self) -> &str {
        &self.envelope_field
    }

    /// Strip envelopes and decode JSON text along the root chain.
    ///
    /// - An object carrying the envelope field with an object or list value
    ///   is replaced by that value.
    /// - An envelope field holding a string is decoded as JSON; if decoding
    ///   fails the result is `{field: raw}`.
    /// - A bare string is decoded as JSON when possible and kept otherwise.
    ///
    /// Repeats until none of the rules apply. Values below the root are left
    /// alone, so records with their own `text` field survive intact.
    pub fn unwrap_envelope(&self, value: &Value) -> Value {
        let mut current = value.clone();
        loop {
            let next = match &current {
                Value::Object(map) => match map.get(&self.envelope_field) {
                    Some(inner @ (Value::Object(_) | Value::Array(_))) => inner.clone(),
                    Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
                        Ok(parsed) => parsed,
                        Err(_) => {
                            let mut only = Map::new();
                            only.insert(self.envelope_field.clone(), Value::String(raw.clone()));
                            return Value::Object(only);
                        }
                    },
                    // Absent, or a scalar payload: an ordinary object.
                    _ => return current,
                },
                Value::String(raw) => match serde_json::from_str::<Value>(raw) {
                    Ok(parsed) => parsed,
                    Err(_) => return current,
                },
                _ => return current,
            };
            current = next;
        }
    }

    /// Normalize any JSON value. Never fails.
    pub fn normalize(&self, value: &Value) -> CanonicalNode {
        CanonicalNode::from_value(&self.unwrap_envelope(value))
    }

    /// Normalize raw text: JSON when it parses, a single scalar otherwise.
    pub fn normalize_str(&self, raw: &str) -> CanonicalNode {
        self.normalize(&Value::String(raw.to_string()))
    }
}
