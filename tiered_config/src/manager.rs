//! Layered resolution of configuration sources.
//!
//! A [`ConfigManager`] owns an ordered list of sources. Loading folds their
//! mappings left to right with [`merge_into`], so later sources take
//! precedence, and optionally validates the merged document against a schema.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::schema::{SchemaValidator, default_validator};
use crate::source::ConfigSource;
use crate::value::merge_into;
use crate::view::Config;
use crate::{ConfigError, ConfigMap, ConfigResult};

/// Resolves an ordered list of sources into a [`Config`].
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
/// use tiered_config::{ConfigManager, MapSource};
///
/// # fn main() -> tiered_config::ConfigResult<()> {
/// let manager = ConfigManager::builder()
///     .source(MapSource::from_value(json!({"port": 80, "host": "localhost"}))?)
///     .source(MapSource::from_value(json!({"port": 8080}))?)
///     .build()?;
/// let config = manager.load()?;
/// assert_eq!(config.get_or("port", json!(0)), json!(8080));
/// assert_eq!(config.get_or("host", json!("")), json!("localhost"));
/// # Ok(())
/// # }
/// ```
pub struct ConfigManager {
    sources: Vec<Box<dyn ConfigSource>>,
    schema: Option<Value>,
    validator: Option<Arc<dyn SchemaValidator>>,
}

impl fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self.sources.iter().map(|s| s.label()).collect();
        f.debug_struct("ConfigManager")
            .field("sources", &labels)
            .field("schema", &self.schema.is_some())
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

impl ConfigManager {
    /// Start configuring a manager.
    #[must_use]
    pub fn builder() -> ConfigManagerBuilder {
        ConfigManagerBuilder::default()
    }

    /// Number of configured sources.
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Schema applied on every load, if any.
    #[must_use]
    pub const fn schema(&self) -> Option<&Value> {
        self.schema.as_ref()
    }

    /// Read every source in order, deep-merge the results and validate them.
    ///
    /// Each call re-reads the sources, so changes on disk or in the process
    /// environment are picked up.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidatorUnavailable`] before reading anything
    /// when a schema is configured without a validator. Otherwise propagates
    /// the first source failure, or reports schema violations as
    /// [`ConfigError::Validation`] (one violation) or
    /// [`ConfigError::Aggregate`] (several).
    pub fn load(&self) -> ConfigResult<Config> {
        let validation = match (&self.schema, &self.validator) {
            (Some(_), None) => return Err(Arc::new(ConfigError::ValidatorUnavailable)),
            (Some(schema), Some(validator)) => Some((schema, validator)),
            (None, _) => None,
        };

        let mut merged = ConfigMap::new();
        for source in &self.sources {
            let label = source.label();
            match source.provide()? {
                Some(layer) => {
                    debug!(source = %label, keys = layer.len(), "merging configuration layer");
                    merge_into(&mut merged, layer);
                }
                None => debug!(source = %label, "optional source provided nothing"),
            }
        }

        if let Some((schema, validator)) = validation {
            let document = Value::Object(merged.clone());
            let errors: Vec<Arc<ConfigError>> = validator
                .validate(&document, schema)
                .into_iter()
                .map(|v| ConfigError::validation(v.key(), v.message))
                .collect();
            if let Some(err) = ConfigError::combine(errors) {
                return Err(Arc::new(err));
            }
        }

        Ok(Config::new(merged))
    }
}

/// Builder for [`ConfigManager`].
#[derive(Default)]
pub struct ConfigManagerBuilder {
    sources: Vec<Box<dyn ConfigSource>>,
    schema: Option<Value>,
    validator: Option<Option<Arc<dyn SchemaValidator>>>,
}

impl fmt::Debug for ConfigManagerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigManagerBuilder")
            .field("sources", &self.sources.len())
            .field("schema", &self.schema.is_some())
            .finish_non_exhaustive()
    }
}

impl ConfigManagerBuilder {
    /// Append a source; later sources override earlier ones.
    #[must_use]
    pub fn source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Append several boxed sources in order.
    #[must_use]
    pub fn sources<I>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn ConfigSource>>,
    {
        self.sources.extend(sources);
        self
    }

    /// Validate every loaded configuration against `schema`.
    #[must_use]
    pub fn schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Use `validator` instead of the built-in one.
    #[must_use]
    pub fn validator(mut self, validator: impl SchemaValidator + 'static) -> Self {
        self.validator = Some(Some(Arc::new(validator)));
        self
    }

    /// Remove any validator, including the built-in one.
    #[must_use]
    pub fn without_validator(mut self) -> Self {
        self.validator = Some(None);
        self
    }

    /// Finish the manager.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoSources`] when no source was added.
    pub fn build(self) -> ConfigResult<ConfigManager> {
        if self.sources.is_empty() {
            return Err(Arc::new(ConfigError::NoSources));
        }
        Ok(ConfigManager {
            sources: self.sources,
            schema: self.schema,
            validator: self.validator.unwrap_or_else(default_validator),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MapSource;
    use crate::schema::SchemaViolation;
    use anyhow::{Result, anyhow, ensure};
    use rstest::rstest;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn layer(value: Value) -> Result<MapSource> {
        MapSource::from_value(value).map_err(|e| anyhow!(e.to_string()))
    }

    struct CountingSource(Arc<AtomicUsize>);

    impl ConfigSource for CountingSource {
        fn label(&self) -> String {
            String::from("counting")
        }

        fn provide(&self) -> ConfigResult<Option<ConfigMap>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Some(ConfigMap::new()))
        }
    }

    struct Absent;

    impl ConfigSource for Absent {
        fn label(&self) -> String {
            String::from("absent")
        }

        fn is_optional(&self) -> bool {
            true
        }

        fn provide(&self) -> ConfigResult<Option<ConfigMap>> {
            Ok(None)
        }
    }

    struct RejectAll;

    impl SchemaValidator for RejectAll {
        fn validate(&self, _: &Value, _: &Value) -> Vec<SchemaViolation> {
            vec![
                SchemaViolation::new(vec![], "root is wrong"),
                SchemaViolation::new(vec!["a".into(), "b".into()], "b is wrong"),
            ]
        }
    }

    #[rstest]
    fn build_requires_a_source() {
        let err = ConfigManager::builder().build().err();
        assert!(matches!(err.as_deref(), Some(ConfigError::NoSources)));
    }

    #[rstest]
    fn later_sources_win_and_absence_is_skipped() -> Result<()> {
        let config = ConfigManager::builder()
            .source(layer(json!({"db": {"host": "h", "port": 1}, "debug": false}))?)
            .source(Absent)
            .source(layer(json!({"db": {"port": 2}, "debug": true}))?)
            .build()
            .map_err(|e| anyhow!(e.to_string()))?
            .load()
            .map_err(|e| anyhow!(e.to_string()))?;
        ensure!(config.to_value() == json!({"db": {"host": "h", "port": 2}, "debug": true}));
        Ok(())
    }

    #[rstest]
    fn unavailable_validator_fails_before_reading_sources() -> Result<()> {
        let calls = Arc::new(AtomicUsize::new(0));
        let manager = ConfigManager::builder()
            .source(CountingSource(Arc::clone(&calls)))
            .schema(json!({"type": "object"}))
            .without_validator()
            .build()
            .map_err(|e| anyhow!(e.to_string()))?;
        let err = manager.load().err();
        ensure!(matches!(err.as_deref(), Some(ConfigError::ValidatorUnavailable)));
        ensure!(calls.load(Ordering::SeqCst) == 0);
        Ok(())
    }

    #[rstest]
    fn several_violations_are_aggregated() -> Result<()> {
        let manager = ConfigManager::builder()
            .source(layer(json!({}))?)
            .schema(json!({}))
            .validator(RejectAll)
            .build()
            .map_err(|e| anyhow!(e.to_string()))?;
        let Err(err) = manager.load() else {
            return Err(anyhow!("expected validation failure"));
        };
        let ConfigError::Aggregate(errors) = err.as_ref() else {
            return Err(anyhow!("expected aggregate, got {err}"));
        };
        let keys: Vec<String> = errors
            .iter()
            .filter_map(|e| match e {
                ConfigError::Validation { key, .. } => Some(key.clone()),
                _ => None,
            })
            .collect();
        ensure!(keys == ["<root>", "a.b"]);
        Ok(())
    }

    #[rstest]
    fn each_load_rereads_sources() -> Result<()> {
        let calls = Arc::new(AtomicUsize::new(0));
        let manager = ConfigManager::builder()
            .source(CountingSource(Arc::clone(&calls)))
            .build()
            .map_err(|e| anyhow!(e.to_string()))?;
        manager.load().map_err(|e| anyhow!(e.to_string()))?;
        manager.load().map_err(|e| anyhow!(e.to_string()))?;
        ensure!(calls.load(Ordering::SeqCst) == 2);
        Ok(())
    }

    #[cfg(feature = "schema")]
    #[rstest]
    fn builtin_validator_reports_key_path() -> Result<()> {
        let manager = ConfigManager::builder()
            .source(layer(json!({"app": {"debug": "nope"}}))?)
            .schema(json!({"properties": {"app": {"properties": {"debug": {"type": "boolean"}}}}}))
            .build()
            .map_err(|e| anyhow!(e.to_string()))?;
        let err = manager.load().err();
        let Some(ConfigError::Validation { key, message }) = err.as_deref() else {
            return Err(anyhow!("expected a validation error"));
        };
        ensure!(key == "app.debug");
        ensure!(message.contains("boolean"));
        Ok(())
    }
}
