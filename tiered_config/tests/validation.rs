//! Schema validation of merged configuration.

use anyhow::{Result, anyhow, bail, ensure};
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use tiered_config::{
    Config, ConfigError, ConfigManager, ConfigMap, ConfigResult, MapSource, SchemaValidator,
    SchemaViolation,
};

#[fixture]
fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "app": {
                "type": "object",
                "properties": {"debug": {"type": "boolean"}},
            },
        },
    })
}

fn load_with(layers: &[Value], schema: Value) -> Result<ConfigResult<Config>> {
    let mut builder = ConfigManager::builder().schema(schema);
    for layer in layers {
        let source = MapSource::from_value(layer.clone()).map_err(|e| anyhow!(e.to_string()))?;
        builder = builder.source(source);
    }
    let manager = builder.build().map_err(|e| anyhow!(e.to_string()))?;
    Ok(manager.load())
}

#[cfg(feature = "schema")]
#[rstest]
fn override_breaking_the_schema_names_the_key(schema: Value) -> Result<()> {
    let outcome = load_with(
        &[json!({"app": {"debug": false}}), json!({"app": {"debug": "not-a-bool"}})],
        schema,
    )?;
    let err = outcome.err();
    match err.as_deref() {
        Some(ConfigError::Validation { key, message }) => {
            ensure!(key == "app.debug");
            ensure!(message.contains("boolean"), "message: {message}");
        }
        other => bail!("expected a validation error, got {other:?}"),
    }
    Ok(())
}

#[cfg(feature = "schema")]
#[rstest]
fn valid_configuration_loads(schema: Value) -> Result<()> {
    let config = load_with(&[json!({"app": {"debug": true}})], schema)?
        .map_err(|e| anyhow!(e.to_string()))?;
    ensure!(config.path("app.debug").and_then(|item| item.as_bool()) == Some(true));
    Ok(())
}

#[cfg(not(feature = "schema"))]
#[rstest]
fn schema_without_validator_fails(schema: Value) -> Result<()> {
    let outcome = load_with(&[json!({"app": {"debug": true}})], schema)?;
    let err = outcome.err();
    ensure!(matches!(err.as_deref(), Some(ConfigError::ValidatorUnavailable)));
    Ok(())
}

#[rstest]
fn explicitly_removed_validator_fails(schema: Value) -> Result<()> {
    let manager = ConfigManager::builder()
        .source(MapSource::new(ConfigMap::new()))
        .schema(schema)
        .without_validator()
        .build()
        .map_err(|e| anyhow!(e.to_string()))?;
    let err = manager.load().err();
    ensure!(matches!(err.as_deref(), Some(ConfigError::ValidatorUnavailable)));
    Ok(())
}

struct RequireName;

impl SchemaValidator for RequireName {
    fn validate(&self, document: &Value, _schema: &Value) -> Vec<SchemaViolation> {
        if document.get("name").is_some() {
            Vec::new()
        } else {
            vec![SchemaViolation::new(Vec::new(), "name is required")]
        }
    }
}

#[rstest]
fn custom_validator_reports_root() -> Result<()> {
    let manager = ConfigManager::builder()
        .source(MapSource::new(ConfigMap::new()))
        .schema(json!({}))
        .validator(RequireName)
        .build()
        .map_err(|e| anyhow!(e.to_string()))?;
    let err = manager.load().err();
    ensure!(matches!(
        err.as_deref(),
        Some(ConfigError::Validation { key, .. }) if key == "<root>"
    ));
    Ok(())
}
