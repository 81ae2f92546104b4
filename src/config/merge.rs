//! Deep merge of override trees onto the default tree.
//!
//! Mappings merge field-by-field with the override taking precedence.
//! Sequences are replaced entirely, not concatenated or merged element-wise.
//! An override may never remove structure the defaults define: a mapping
//! can only be replaced by a mapping, and a sequence cannot become a mapping.

use serde_json::Value;
use std::fmt;

/// An override value rejected because it would change the default shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeConflict {
    /// Dotted path of the rejected value.
    pub path: String,
    /// Kind of value the defaults hold at `path`.
    pub expected: &'static str,
    /// Kind of value the override supplied.
    pub found: &'static str,
}

impl fmt::Display for ShapeConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, found {}; keeping default",
            self.path, self.expected, self.found
        )
    }
}

/// Name of a value's kind, as used in conflict reports.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

/// Deep merge two values, with `overlay` taking precedence over `base`.
///
/// - Mappings are merged recursively; keys only in `base` are kept
/// - Sequences and scalars (including null) in `overlay` replace `base`
/// - Keys absent from `overlay` leave `base` untouched
/// - Shape conflicts keep `base` (see [`deep_merge_reporting`])
///
/// # Example
/// ```
/// use serde_json::json;
/// use site_config::config::deep_merge;
///
/// let base = json!({
///     "class": { "name": "Class A", "school": "Somewhere" },
///     "navigation": [{ "name": "Home", "path": "/" }]
/// });
/// let overlay = json!({
///     "class": { "name": "Class B" },
///     "navigation": []
/// });
/// let result = deep_merge(base, overlay);
/// assert_eq!(result["class"]["school"], "Somewhere");
/// assert_eq!(result["navigation"], json!([]));
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    deep_merge_reporting(base, overlay).0
}

/// Like [`deep_merge`], also returning every rejected override value.
pub fn deep_merge_reporting(base: Value, overlay: Value) -> (Value, Vec<ShapeConflict>) {
    let mut conflicts = Vec::new();
    let merged = merge_at(base, overlay, &mut String::new(), &mut conflicts);
    (merged, conflicts)
}

fn merge_at(
    base: Value,
    overlay: Value,
    path: &mut String,
    conflicts: &mut Vec<ShapeConflict>,
) -> Value {
    match (base, overlay) {
        // Both are mappings: merge recursively
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                // Existing keys keep their position; new keys are appended
                match base_map.get_mut(&key) {
                    Some(slot) => {
                        let parent_len = path.len();
                        if !path.is_empty() {
                            path.push('.');
                        }
                        path.push_str(&key);
                        let base_value = std::mem::take(slot);
                        *slot = merge_at(base_value, overlay_value, path, conflicts);
                        path.truncate(parent_len);
                    }
                    None => {
                        base_map.insert(key, overlay_value);
                    }
                }
            }
            Value::Object(base_map)
        }
        // Sequences replace sequences wholesale
        (Value::Array(_), overlay @ Value::Array(_)) => overlay,
        // A mapping or sequence in base cannot lose its shape
        (base @ (Value::Object(_) | Value::Array(_)), overlay) => {
            conflicts.push(ShapeConflict {
                path: if path.is_empty() {
                    "<root>".to_string()
                } else {
                    path.clone()
                },
                expected: kind_name(&base),
                found: kind_name(&overlay),
            });
            base
        }
        // Scalar in base: overlay replaces it entirely
        (Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_), overlay) => overlay,
    }
}
