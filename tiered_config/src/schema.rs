//! Schema validation capability.
//!
//! Validation is pluggable: the manager only knows the [`SchemaValidator`]
//! trait. With the `schema` feature (enabled by default) the crate ships
//! [`BasicSchemaValidator`], which understands the structural subset of JSON
//! Schema used for configuration files.

use std::fmt;

use serde_json::Value;

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Segments leading from the document root to the offending value.
    pub path: Vec<String>,
    /// Human-readable description of the violation.
    pub message: String,
}

impl SchemaViolation {
    /// Create a violation at `path`.
    #[must_use]
    pub fn new(path: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }

    /// Dotted key path, or `<root>` for the document itself.
    #[must_use]
    pub fn key(&self) -> String {
        if self.path.is_empty() {
            String::from("<root>")
        } else {
            self.path.join(".")
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key(), self.message)
    }
}

/// Capability checking a document against a schema.
pub trait SchemaValidator: Send + Sync {
    /// Return every violation of `schema` found in `document`; an empty list
    /// means the document is valid.
    fn validate(&self, document: &Value, schema: &Value) -> Vec<SchemaViolation>;
}

/// Default validator, when one is compiled in.
#[must_use]
pub fn default_validator() -> Option<std::sync::Arc<dyn SchemaValidator>> {
    #[cfg(feature = "schema")]
    {
        Some(std::sync::Arc::new(BasicSchemaValidator))
    }
    #[cfg(not(feature = "schema"))]
    {
        None
    }
}

#[cfg(feature = "schema")]
pub use basic::BasicSchemaValidator;

#[cfg(feature = "schema")]
mod basic {
    use serde_json::{Map, Value};

    use super::{SchemaValidator, SchemaViolation};

    /// Validator for the structural subset of JSON Schema.
    ///
    /// Supported keywords: `type`, `enum`, `const`, `properties`, `required`,
    /// `additionalProperties`, `items`, `minimum`, `maximum`,
    /// `exclusiveMinimum`, `exclusiveMaximum`, `minLength`, `maxLength`,
    /// `minItems` and `maxItems`. Boolean schemas are honoured. Other keywords
    /// are ignored.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tiered_config::{BasicSchemaValidator, SchemaValidator};
    /// use serde_json::json;
    ///
    /// let schema = json!({
    ///     "type": "object",
    ///     "properties": {"port": {"type": "integer", "minimum": 1}},
    ///     "required": ["port"],
    /// });
    /// let violations = BasicSchemaValidator.validate(&json!({"port": 0}), &schema);
    /// assert_eq!(violations.len(), 1);
    /// assert_eq!(violations[0].key(), "port");
    /// ```
    #[derive(Debug, Clone, Copy, Default)]
    pub struct BasicSchemaValidator;

    impl SchemaValidator for BasicSchemaValidator {
        fn validate(&self, document: &Value, schema: &Value) -> Vec<SchemaViolation> {
            let mut walker = Walker::default();
            walker.check(document, schema);
            walker.violations
        }
    }

    #[derive(Default)]
    struct Walker {
        path: Vec<String>,
        violations: Vec<SchemaViolation>,
    }

    impl Walker {
        fn report(&mut self, message: String) {
            self.violations
                .push(SchemaViolation::new(self.path.clone(), message));
        }

        fn nested<F: FnOnce(&mut Self)>(&mut self, segment: String, f: F) {
            self.path.push(segment);
            f(self);
            self.path.pop();
        }

        fn check(&mut self, value: &Value, schema: &Value) {
            match schema {
                Value::Bool(true) => {}
                Value::Bool(false) => self.report(format!("{value} is not allowed here")),
                Value::Object(rules) => self.check_rules(value, rules),
                _ => {}
            }
        }

        fn check_rules(&mut self, value: &Value, rules: &Map<String, Value>) {
            if let Some(expected) = rules.get("type") {
                if !type_matches(value, expected) {
                    self.report(format!("{value} is not of type {}", type_list(expected)));
                    return;
                }
            }
            if let Some(Value::Array(options)) = rules.get("enum") {
                if !options.contains(value) {
                    self.report(format!("{value} is not one of {}", Value::Array(options.clone())));
                }
            }
            if let Some(expected) = rules.get("const") {
                if expected != value {
                    self.report(format!("{value} was expected to be {expected}"));
                }
            }
            match value {
                Value::Object(map) => self.check_object(map, rules),
                Value::Array(items) => self.check_array(items, rules),
                Value::String(text) => self.check_string(value, text, rules),
                Value::Number(_) => self.check_number(value, rules),
                Value::Bool(_) | Value::Null => {}
            }
        }

        fn check_object(&mut self, map: &Map<String, Value>, rules: &Map<String, Value>) {
            if let Some(Value::Array(required)) = rules.get("required") {
                for name in required.iter().filter_map(Value::as_str) {
                    if !map.contains_key(name) {
                        self.report(format!("\"{name}\" is a required property"));
                    }
                }
            }
            let properties = rules.get("properties").and_then(Value::as_object);
            let additional = rules.get("additionalProperties");
            for (key, child) in map {
                match properties.and_then(|props| props.get(key)) {
                    Some(child_schema) => {
                        self.nested(key.clone(), |w| w.check(child, child_schema));
                    }
                    None => match additional {
                        Some(Value::Bool(false)) => {
                            self.report(format!("additional property \"{key}\" is not allowed"));
                        }
                        Some(extra @ Value::Object(_)) => {
                            self.nested(key.clone(), |w| w.check(child, extra));
                        }
                        _ => {}
                    },
                }
            }
        }

        fn check_array(&mut self, items: &[Value], rules: &Map<String, Value>) {
            let count = u64::try_from(items.len()).unwrap_or(u64::MAX);
            if let Some(min) = rules.get("minItems").and_then(Value::as_u64) {
                if count < min {
                    self.report(format!("expected at least {min} items, found {count}"));
                }
            }
            if let Some(max) = rules.get("maxItems").and_then(Value::as_u64) {
                if count > max {
                    self.report(format!("expected at most {max} items, found {count}"));
                }
            }
            if let Some(item_schema) = rules.get("items") {
                for (index, item) in items.iter().enumerate() {
                    self.nested(index.to_string(), |w| w.check(item, item_schema));
                }
            }
        }

        fn check_string(&mut self, value: &Value, text: &str, rules: &Map<String, Value>) {
            let length = u64::try_from(text.chars().count()).unwrap_or(u64::MAX);
            if let Some(min) = rules.get("minLength").and_then(Value::as_u64) {
                if length < min {
                    self.report(format!("{value} is shorter than {min} characters"));
                }
            }
            if let Some(max) = rules.get("maxLength").and_then(Value::as_u64) {
                if length > max {
                    self.report(format!("{value} is longer than {max} characters"));
                }
            }
        }

        fn check_number(&mut self, value: &Value, rules: &Map<String, Value>) {
            let Some(number) = value.as_f64() else {
                return;
            };
            let bound = |name: &str| rules.get(name).and_then(Value::as_f64);
            if let Some(min) = bound("minimum") {
                if number < min {
                    self.report(format!("{value} is less than the minimum of {min}"));
                }
            }
            if let Some(max) = bound("maximum") {
                if number > max {
                    self.report(format!("{value} is greater than the maximum of {max}"));
                }
            }
            if let Some(min) = bound("exclusiveMinimum") {
                if number <= min {
                    self.report(format!(
                        "{value} is less than or equal to the exclusive minimum of {min}"
                    ));
                }
            }
            if let Some(max) = bound("exclusiveMaximum") {
                if number >= max {
                    self.report(format!(
                        "{value} is greater than or equal to the exclusive maximum of {max}"
                    ));
                }
            }
        }
    }

    fn type_matches(value: &Value, expected: &Value) -> bool {
        match expected {
            Value::String(name) => is_type(value, name),
            Value::Array(names) => names
                .iter()
                .filter_map(Value::as_str)
                .any(|name| is_type(value, name)),
            _ => true,
        }
    }

    fn is_type(value: &Value, name: &str) -> bool {
        match name {
            "object" => value.is_object(),
            "array" => value.is_array(),
            "string" => value.is_string(),
            "boolean" => value.is_boolean(),
            "null" => value.is_null(),
            "number" => value.is_number(),
            "integer" => value.is_i64() || value.is_u64(),
            _ => true,
        }
    }

    fn type_list(expected: &Value) -> String {
        match expected {
            Value::Array(names) => names
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            other => other.to_string(),
        }
    }

}
