//! Mergeable value model and deep-merge mechanics.
//!
//! Configuration values are [`serde_json::Value`]s with insertion order
//! preserved. Only mappings merge; every other kind replaces what it lands on.

use serde_json::{Map, Value};

/// Ordered string-keyed mapping produced by every configuration source.
pub type ConfigMap = Map<String, Value>;

/// Merge `overlay` over `base`, returning a new mapping.
///
/// Neither input is modified. Keys only present in `base` keep their
/// position; keys only present in `overlay` are appended in overlay order.
///
/// # Examples
///
/// ```rust
/// use tiered_config::merge_maps;
/// use serde_json::json;
///
/// let base = json!({"a": {"x": 1}, "b": 2});
/// let overlay = json!({"a": {"y": 3}, "c": [1, 2]});
/// let (Some(base), Some(overlay)) = (base.as_object(), overlay.as_object()) else {
///     unreachable!("literals are objects");
/// };
/// let merged = merge_maps(base, overlay);
/// assert_eq!(
///     serde_json::Value::Object(merged),
///     json!({"a": {"x": 1, "y": 3}, "b": 2, "c": [1, 2]})
/// );
/// ```
#[must_use]
pub fn merge_maps(base: &ConfigMap, overlay: &ConfigMap) -> ConfigMap {
    let mut merged = base.clone();
    merge_into(&mut merged, overlay.clone());
    merged
}

/// Overlay `layer` onto `target`, updating `target` in place.
///
/// Behaviour:
/// - Mappings are merged recursively (keys are added or overwritten, and
///   nested mappings are overlaid).
/// - Sequences and scalars replace the existing entry wholesale; sequences are
///   never merged element-wise.
/// - A mapping landing on a non-mapping (or the reverse) replaces it.
pub fn merge_into(target: &mut ConfigMap, layer: ConfigMap) {
    for (key, value) in layer {
        match target.get_mut(&key) {
            Some(existing) => merge_value(existing, value),
            None => {
                target.insert(key, value);
            }
        }
    }
}

/// Overlay a single `layer` value onto `target`.
///
/// # Examples
///
/// ```rust
/// use tiered_config::merge_value;
/// use serde_json::json;
///
/// let mut acc = json!({"a": {"x": 1}});
/// merge_value(&mut acc, json!({"a": 5}));
/// assert_eq!(acc, json!({"a": 5}));
/// ```
pub fn merge_value(target: &mut Value, layer: Value) {
    match (target, layer) {
        (Value::Object(existing), Value::Object(map)) => merge_into(existing, map),
        (slot, other) => *slot = other,
    }
}

/// Short name of a value's kind, used in diagnostics.
#[must_use]
pub const fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}
