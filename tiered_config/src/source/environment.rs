//! Environment-variable source.
//!
//! This is the only place in the crate that reads the process environment.

use std::sync::Arc;

use crate::env::decode_vars;
use crate::error::ConfigError;
use crate::{ConfigMap, ConfigResult, ConfigSource};

/// Source decoding prefixed environment variables into nested keys.
///
/// See [`crate::decode_vars`] for the naming and coercion rules. An
/// environment source is never missing: with no matching variables it
/// provides an empty mapping.
///
/// # Examples
///
/// ```rust
/// use tiered_config::{ConfigSource, EnvSource};
/// use serde_json::json;
///
/// # fn run() -> tiered_config::ConfigResult<()> {
/// let env = EnvSource::from_vars("MYAPP_", [("MYAPP_DB__PORT", "5432")])?;
/// let map = env.provide()?.unwrap_or_default();
/// assert_eq!(map.get("db"), Some(&json!({"port": 5432})));
/// # Ok(())
/// # }
/// # run().unwrap_or_else(|err| panic!("{err}"));
/// ```
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    snapshot: Option<Vec<(String, String)>>,
}

impl EnvSource {
    /// Read variables starting with `prefix` from the process environment
    /// each time the source is asked to provide.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSource`] when `prefix` is empty.
    pub fn new(prefix: impl Into<String>) -> ConfigResult<Self> {
        Self::build(prefix.into(), None)
    }

    /// Decode a fixed snapshot of variables instead of the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSource`] when `prefix` is empty.
    pub fn from_vars<I, K, V>(prefix: impl Into<String>, vars: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let snapshot = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self::build(prefix.into(), Some(snapshot))
    }

    fn build(prefix: String, snapshot: Option<Vec<(String, String)>>) -> ConfigResult<Self> {
        if prefix.is_empty() {
            return Err(Arc::new(ConfigError::InvalidSource {
                label: String::from("environment"),
                message: String::from("environment prefix must not be empty"),
            }));
        }
        Ok(Self { prefix, snapshot })
    }

    /// Prefix selecting the variables this source decodes.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

/// Snapshot of the process environment; names or values that are not valid
/// Unicode are skipped.
fn process_vars() -> Vec<(String, String)> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

impl ConfigSource for EnvSource {
    fn label(&self) -> String {
        format!("environment ({}*)", self.prefix)
    }

    fn is_optional(&self) -> bool {
        true
    }

    fn provide(&self) -> ConfigResult<Option<ConfigMap>> {
        let vars = self.snapshot.clone().unwrap_or_else(process_vars);
        let decoded = decode_vars(&self.prefix, vars);
        tracing::debug!(prefix = %self.prefix, keys = decoded.len(), "decoded environment source");
        Ok(Some(decoded))
    }
}
