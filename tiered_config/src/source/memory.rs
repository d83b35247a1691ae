//! In-memory source, typically used for defaults.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::ConfigError;
use crate::value::{ConfigMap, kind_name};
use crate::{ConfigResult, ConfigResultExt, ConfigSource};

/// Source wrapping a caller-supplied mapping.
///
/// The mapping is owned by the source and a fresh copy is handed out on every
/// [`ConfigSource::provide`] call, so the manager can never alias it.
///
/// # Examples
///
/// ```rust
/// use tiered_config::{ConfigSource, MapSource};
/// use serde_json::json;
///
/// # fn run() -> tiered_config::ConfigResult<()> {
/// let defaults = MapSource::from_value(json!({"app": {"debug": false}}))?;
/// assert!(defaults.provide()?.is_some_and(|map| map.contains_key("app")));
/// # Ok(())
/// # }
/// # run().unwrap_or_else(|err| panic!("{err}"));
/// ```
#[derive(Debug, Clone)]
pub struct MapSource {
    label: String,
    data: ConfigMap,
}

impl MapSource {
    /// Wrap `data`.
    #[must_use]
    pub fn new(data: ConfigMap) -> Self {
        Self {
            label: String::from("defaults"),
            data,
        }
    }

    /// Wrap a JSON value whose top level must be an object.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotAMapping`] for any other kind of value.
    pub fn from_value(value: Value) -> ConfigResult<Self> {
        match value {
            Value::Object(map) => Ok(Self::new(map)),
            other => Err(Arc::new(ConfigError::NotAMapping {
                label: String::from("defaults"),
                found: kind_name(&other),
            })),
        }
    }

    /// Serialise `defaults` (for example a `Default` settings struct) into a
    /// source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Deserialize`] if serialisation fails, or
    /// [`ConfigError::NotAMapping`] if `defaults` is not a struct or map.
    pub fn serialized<T: Serialize>(defaults: &T) -> ConfigResult<Self> {
        let value = serde_json::to_value(defaults).into_config()?;
        Self::from_value(value)
    }

    /// Replace the diagnostic label.
    #[must_use]
    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

impl ConfigSource for MapSource {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn provide(&self) -> ConfigResult<Option<ConfigMap>> {
        Ok(Some(self.data.clone()))
    }
}
