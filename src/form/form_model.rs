use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::InspectorError;

/// One discovered form state container at a point in time.
///
/// `id` is positional (`form-<index>`) and only meaningful inside the batch
/// it was emitted with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSnapshot {
    pub id: String,
    #[serde(default)]
    pub values: Map<String, Value>,
    #[serde(default)]
    pub errors: Map<String, Value>,
    #[serde(default)]
    pub touched: Map<String, Value>,
    #[serde(default)]
    pub is_submitting: bool,
    #[serde(default)]
    pub is_validating: bool,
    #[serde(default = "default_true")]
    pub is_valid: bool,
    #[serde(default)]
    pub submit_count: u64,
    #[serde(default)]
    pub dirty: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
    #[serde(default = "empty_object")]
    pub initial_values: Value,
}

fn default_true() -> bool {
    true
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

pub fn form_id(index: usize) -> String {
    format!("form-{}", index)
}

impl FormSnapshot {
    /// Serialize a matched payload, defaulting every missing field.
    pub fn from_payload(payload: &Value, index: usize) -> Result<Self, InspectorError> {
        let bag = payload.as_object().ok_or_else(|| {
            InspectorError::ScanFailure(format!(
                "payload for {} is not an object",
                form_id(index)
            ))
        })?;

        Ok(FormSnapshot {
            id: form_id(index),
            values: mapping(bag.get("values")),
            errors: mapping(bag.get("errors")),
            touched: mapping(bag.get("touched")),
            is_submitting: truthy(bag.get("isSubmitting")),
            is_validating: truthy(bag.get("isValidating")),
            is_valid: match bag.get("isValid") {
                None | Some(Value::Null) => true,
                other => truthy(other),
            },
            submit_count: count(bag.get("submitCount")),
            dirty: truthy(bag.get("dirty")),
            status: bag.get("status").filter(|v| !v.is_null()).cloned(),
            initial_values: match bag.get("initialValues") {
                None | Some(Value::Null) => empty_object(),
                Some(v) => v.clone(),
            },
        })
    }
}

/// Non-object values collapse to an empty mapping.
fn mapping(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        _ => 0,
    }
}

