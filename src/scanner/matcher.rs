use serde_json::{Map, Value};

use crate::page::page_model::FiberNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchReason {
    Name,
    Shape,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classification<'a> {
    Matched {
        payload: &'a Value,
        reason: MatchReason,
    },
    Unmatched,
}

impl Classification<'_> {
    pub fn is_match(&self) -> bool {
        matches!(self, Classification::Matched { .. })
    }
}

/// Detection strategy for form state containers.
///
/// Traversal and serialization never look at payloads themselves; swapping
/// the matcher is enough to target a different library.
pub trait FormMatcher: Send {
    fn classify<'a>(&self, node: &'a FiberNode) -> Classification<'a>;
}

pub const DEFAULT_NAME_PATTERN: &str = "Formik";
pub const DEFAULT_METHOD_FIELDS: [&str; 2] = ["handleSubmit", "handleChange"];

/// Matches on a display-name hint OR on the shape of the state bag.
#[derive(Debug, Clone)]
pub struct NamedShapeMatcher {
    pattern: String,
    method_fields: Vec<String>,
}

impl Default for NamedShapeMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_NAME_PATTERN)
    }
}

impl NamedShapeMatcher {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_lowercase(),
            method_fields: DEFAULT_METHOD_FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn name_matches(&self, node: &FiberNode) -> bool {
        [node.type_name(), node.context_name()]
            .into_iter()
            .flatten()
            .any(|name| name.to_lowercase().contains(&self.pattern))
    }

    pub fn shape_matches(&self, bag: &Map<String, Value>) -> bool {
        let is_obj = |key: &str| bag.get(key).is_some_and(Value::is_object);

        let submitting_ok = match bag.get("isSubmitting") {
            None => true,
            Some(v) => v.is_boolean(),
        };

        // Optional methods: absent on some library versions.
        let methods_ok = self
            .method_fields
            .iter()
            .all(|field| bag.get(field).is_none_or(is_callable_marker));

        is_obj("values") && is_obj("errors") && is_obj("touched") && submitting_ok && methods_ok
    }
}

impl FormMatcher for NamedShapeMatcher {
    fn classify<'a>(&self, node: &'a FiberNode) -> Classification<'a> {
        let Some(payload) = node.payload() else {
            return Classification::Unmatched;
        };
        let Some(bag) = payload.as_object() else {
            return Classification::Unmatched;
        };
        if !bag.get("values").is_some_and(Value::is_object) {
            return Classification::Unmatched;
        }

        if self.name_matches(node) {
            Classification::Matched {
                payload,
                reason: MatchReason::Name,
            }
        } else if self.shape_matches(bag) {
            Classification::Matched {
                payload,
                reason: MatchReason::Shape,
            }
        } else {
            Classification::Unmatched
        }
    }
}

/// Functions reach us serialized as `"[Function]"` / `"[Function: name]"`.
fn is_callable_marker(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.starts_with("[Function"),
        _ => false,
    }
}
