use crate::error::{AuditError, AuditResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Candidate profile: an opaque mapping of named fields.
///
/// The pipeline only ever looks fields up; it never mutates a profile.
/// Nested fields are addressed with dotted paths (`address.postal_code`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateProfile(Map<String, Value>);

impl CandidateProfile {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Build a profile from an arbitrary JSON value; only objects are accepted.
    pub fn from_value(value: Value) -> AuditResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(AuditError::validation(format!(
                "candidate profile must be a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Look up a field by dotted path. Missing segments and `null` both yield `None`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.0.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        if current.is_null() {
            None
        } else {
            Some(current)
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn str_field(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Numeric lookup that also accepts numeric strings (`"1.5"`).
    pub fn number_field(&self, path: &str) -> Option<f64> {
        match self.get(path)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// List of strings; `None` when the field is absent or not a list of strings.
    pub fn string_list(&self, path: &str) -> Option<Vec<&str>> {
        self.get(path)?
            .as_array()?
            .iter()
            .map(Value::as_str)
            .collect::<Option<Vec<_>>>()
    }

    /// Field text for containment checks: a string as-is, a list of strings joined by spaces.
    pub fn text_field(&self, path: &str) -> Option<String> {
        match self.get(path)? {
            Value::String(s) => Some(s.clone()),
            Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            _ => None,
        }
    }

    /// Truthiness: absent, `false`, `0`, `""`, `[]` and `{}` are all false.
    pub fn is_truthy(&self, path: &str) -> bool {
        match self.get(path) {
            None => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::Object(o)) => !o.is_empty(),
            Some(Value::Null) => false,
        }
    }
}

impl From<Map<String, Value>> for CandidateProfile {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
