//! End-to-end layering of defaults, files and the process environment.

use anyhow::{Result, anyhow, bail, ensure};
use rstest::rstest;
use serde::Deserialize;
use serde_json::json;
use serial_test::serial;
use test_helpers::env;
use test_helpers::figment::with_jail;
use tiered_config::{ConfigError, ConfigManager, EnvSource, FileSource, MapSource, ResultIntoFigment};

const PREFIX: &str = "TIERED_";

#[derive(Debug, Deserialize, PartialEq)]
struct Database {
    host: String,
    port: u16,
}

#[derive(Debug, Deserialize, PartialEq)]
struct Settings {
    debug: bool,
    workers: i64,
    ratio: f64,
    name: String,
    database: Database,
}

fn defaults() -> Result<MapSource> {
    MapSource::from_value(json!({
        "debug": false,
        "workers": 1,
        "ratio": 0.5,
        "name": "svc",
        "database": {"host": "localhost", "port": 5432},
    }))
    .map_err(|e| anyhow!(e.to_string()))
}

#[rstest]
#[serial]
fn environment_overrides_file_overrides_defaults() -> Result<()> {
    let defaults = defaults()?;
    let _env = env::isolate(
        PREFIX,
        [
            ("TIERED_DEBUG", "yes"),
            ("TIERED_RATIO", "0.75"),
            ("TIERED_NAME", "from-env"),
            ("TIERED_DATABASE__PORT", "6432"),
        ],
    );
    let settings = with_jail(|j| {
        j.create_file(
            "app.json",
            r#"{"workers": 4, "name": "from-file", "database": {"host": "db.internal", "port": 7000}}"#,
        )?;
        let manager = ConfigManager::builder()
            .source(defaults)
            .source(FileSource::new("app.json").optional(true))
            .source(EnvSource::new(PREFIX).to_figment()?)
            .build()
            .to_figment()?;
        manager
            .load()
            .and_then(|config| config.extract::<Settings>())
            .to_figment()
    })?;
    let expected = Settings {
        debug: true,
        workers: 4,
        ratio: 0.75,
        name: String::from("from-env"),
        database: Database {
            host: String::from("db.internal"),
            port: 6432,
        },
    };
    ensure!(settings == expected, "resolved {settings:?}");
    Ok(())
}

#[rstest]
#[serial]
fn file_overrides_defaults_when_environment_is_silent() -> Result<()> {
    let defaults = defaults()?;
    let _env = env::isolate(PREFIX, [("TIERED_UNRELATED", "1")]);
    let name = with_jail(|j| {
        j.create_file("app.json", r#"{"name": "from-file"}"#)?;
        let config = ConfigManager::builder()
            .source(defaults)
            .source(FileSource::new("app.json"))
            .source(EnvSource::new(PREFIX).to_figment()?)
            .build()
            .and_then(|manager| manager.load())
            .to_figment()?;
        Ok(config.get_or("name", json!(null)))
    })?;
    ensure!(name == json!("from-file"));
    Ok(())
}

#[rstest]
#[serial]
fn missing_optional_file_is_skipped() -> Result<()> {
    let defaults = defaults()?;
    let workers = with_jail(|_| {
        let config = ConfigManager::builder()
            .source(defaults)
            .source(FileSource::new("absent.toml").optional(true))
            .build()
            .and_then(|manager| manager.load())
            .to_figment()?;
        Ok(config.get_or("workers", json!(0)))
    })?;
    ensure!(workers == json!(1));
    Ok(())
}

#[rstest]
#[serial]
fn missing_required_file_names_the_path() -> Result<()> {
    let defaults = defaults()?;
    let outcome = with_jail(|_| {
        let manager = ConfigManager::builder()
            .source(defaults)
            .source(FileSource::new("required.json"))
            .build()
            .to_figment()?;
        Ok(manager.load().err())
    })?;
    let err = outcome.ok_or_else(|| anyhow!("load should fail"))?;
    match err.as_ref() {
        ConfigError::MissingSource { label } => ensure!(label.ends_with("required.json")),
        other => bail!("unexpected error: {other}"),
    }
    Ok(())
}

#[rstest]
#[serial]
fn environment_is_read_on_each_load() -> Result<()> {
    let _env = env::isolate(PREFIX, [("TIERED_MODE", "blue")]);
    let manager = ConfigManager::builder()
        .source(EnvSource::new(PREFIX).map_err(|e| anyhow!(e.to_string()))?)
        .build()
        .map_err(|e| anyhow!(e.to_string()))?;
    let load_mode = || {
        manager
            .load()
            .map(|config| config.get_or("mode", json!(null)))
            .map_err(|e| anyhow!(e.to_string()))
    };
    let first = load_mode()?;
    let second = {
        let _green = env::set_var("TIERED_MODE", "green");
        load_mode()?
    };
    ensure!((first, second) == (json!("blue"), json!("green")));
    ensure!(load_mode()? == json!("blue"));
    Ok(())
}

#[cfg(feature = "toml")]
#[rstest]
#[serial]
fn toml_and_ini_layers_merge_by_section() -> Result<()> {
    let config = with_jail(|j| {
        j.create_file(
            "base.toml",
            "[server]\nhost = \"0.0.0.0\"\nport = 80\n\n[server.tls]\nenabled = false\n",
        )?;
        j.create_file("local.ini", "[server]\nport = 8080\n")?;
        ConfigManager::builder()
            .source(FileSource::new("base.toml"))
            .source(FileSource::new("local.ini"))
            .build()
            .and_then(|manager| manager.load())
            .to_figment()
    })?;
    ensure!(
        config.to_value()
            == json!({"server": {"host": "0.0.0.0", "port": 8080, "tls": {"enabled": false}}})
    );
    Ok(())
}
