pub mod normalize;
pub mod note;
pub mod parser;
pub mod validate;

use serde_json::{Map, Value};

/// One inbound form payload, keys kept in the order they were received.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Submission {
    fields: Map<String, Value>,
}

impl Submission {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Accept only objects; anything else is not a form submission.
    pub fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(format!(
                "Submission must be an object, got {}",
                type_name(&other)
            )),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Text form of a field, empty when missing or null.
    pub fn text(&self, key: &str) -> String {
        self.fields.get(key).map(value_text).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl From<Map<String, Value>> for Submission {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// Render a JSON value as plain text: strings verbatim, scalars via
/// `Display`, null as empty, containers as compact JSON.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
