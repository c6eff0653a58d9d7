//! Raw applicant input as supplied by a user, before any encoding.

use crate::error::NormalizeError;
use std::fmt;

/// String-valued attributes that need a categorical encoder.
pub const CATEGORICAL_FIELDS: [&str; 6] = [
    "gender",
    "married",
    "dependents",
    "education",
    "self_employed",
    "property_area",
];

/// Attributes consumed directly as numbers.
pub const NUMERIC_FIELDS: [&str; 5] = [
    "applicant_income",
    "coapplicant_income",
    "loan_amount",
    "loan_amount_term",
    "credit_history",
];

/// Identifier column dropped from training data.
pub const ID_COLUMN: &str = "loan_id";

/// Training target column.
pub const TARGET_COLUMN: &str = "loan_status";

/// Canonical form of a field name: trimmed and lowercased.
pub fn field_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Whether `field` (already in [`field_key`] form) needs an encoder.
pub fn is_categorical(field: &str) -> bool {
    CATEGORICAL_FIELDS.contains(&field)
}

/// A single user-supplied value.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    Number(f64),
}

impl RawValue {
    /// Parses the value as a finite number, `None` when it cannot be.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            RawValue::Number(n) => *n,
            RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        n.is_finite().then_some(n)
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Text(s) => f.write_str(s),
            RawValue::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        RawValue::Number(n as f64)
    }
}

/// Field name → value mapping for one prediction request.
///
/// Insertion order is kept: it is the column order used when the model
/// carries no feature schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawInput {
    fields: Vec<(String, RawValue)>,
}

impl RawInput {
    /// An input with no fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets `name`, replacing an existing entry with the exact same key.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<RawValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Removes every entry whose key folds to the same [`field_key`] as
    /// `name`.
    pub fn remove(&mut self, name: &str) {
        let key = field_key(name);
        self.fields.retain(|(k, _)| field_key(k) != key);
    }

    /// Value stored under exactly `name`.
    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parses a flat JSON object of strings and numbers.
    ///
    /// `null` entries are treated as absent. Any other shape is a
    /// structural error.
    pub fn from_json(text: &str) -> Result<Self, NormalizeError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| NormalizeError::Malformed(e.to_string()))?;
        let serde_json::Value::Object(map) = value else {
            return Err(NormalizeError::Malformed(
                "expected a JSON object of field values".to_string(),
            ));
        };

        let mut input = RawInput::new();
        for (key, value) in map {
            match value {
                serde_json::Value::Null => {}
                serde_json::Value::String(s) => input.insert(key, s),
                serde_json::Value::Number(n) => match n.as_f64() {
                    Some(n) => input.insert(key, n),
                    None => {
                        return Err(NormalizeError::Malformed(format!(
                            "field '{key}' is not representable as a number"
                        )));
                    }
                },
                other => {
                    return Err(NormalizeError::Malformed(format!(
                        "field '{key}' must be a string or number, got {}",
                        json_kind(&other)
                    )));
                }
            }
        }
        Ok(input)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

impl<K, V> FromIterator<(K, V)> for RawInput
where
    K: Into<String>,
    V: Into<RawValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut input = RawInput::new();
        for (k, v) in iter {
            input.insert(k, v);
        }
        input
    }
}
