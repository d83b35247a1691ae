//! Writing configuration and raw resources back to disk.

use anyhow::{Result, anyhow, ensure};
use rstest::{fixture, rstest};
use serde_json::json;
use tempfile::TempDir;
use tiered_config::{
    ConfigManager, ConfigMap, FileSource, RawDumpError, RawPayload, RawResource,
    permission_bits,
};

#[fixture]
fn dir() -> TempDir {
    tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"))
}

#[rstest]
fn loaded_configuration_round_trips_through_a_file(dir: TempDir) -> Result<()> {
    let path = dir.path().join("conf/app.json");
    let mut original = ConfigMap::new();
    original.insert(String::from("db"), json!({"port": 5432, "host": "h"}));
    original.insert(String::from("debug"), json!(true));

    let source = FileSource::new(&path);
    source.dump(&original).map_err(|e| anyhow!(e.to_string()))?;
    let config = ConfigManager::builder()
        .source(FileSource::new(&path))
        .build()
        .and_then(|manager| manager.load())
        .map_err(|e| anyhow!(e.to_string()))?;
    ensure!(config.to_value() == json!({"db": {"host": "h", "port": 5432}, "debug": true}));
    Ok(())
}

#[rstest]
fn mutating_a_copy_leaves_the_view_intact(dir: TempDir) -> Result<()> {
    let path = dir.path().join("app.json");
    std::fs::write(&path, r#"{"limits": {"rps": 10}}"#)?;
    let config = ConfigManager::builder()
        .source(FileSource::new(&path))
        .build()
        .and_then(|manager| manager.load())
        .map_err(|e| anyhow!(e.to_string()))?;
    let mut copy = config.to_map();
    copy.insert(String::from("limits"), json!({"rps": 99}));
    ensure!(config["limits"]["rps"] == json!(10));
    Ok(())
}

#[rstest]
fn raw_resource_rejects_wrong_payload_without_touching_disk(dir: TempDir) -> Result<()> {
    let resource = RawResource::text(dir.path().join("token"));
    resource.dump("first")?;
    let outcome = resource.dump(vec![0_u8, 1, 2]);
    ensure!(matches!(outcome, Err(RawDumpError::ModeMismatch(_))));
    let loaded = resource.load().map_err(|e| anyhow!(e.to_string()))?;
    ensure!(loaded == Some(RawPayload::Text(String::from("first"))));
    Ok(())
}

#[test]
fn permission_bits_strip_file_type() {
    assert_eq!(permission_bits(0o100_600), 0o600);
}

#[cfg(unix)]
#[rstest]
fn dumping_without_mode_preserves_permissions(dir: TempDir) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode_of = |path: &std::path::Path| -> Result<u32> {
        Ok(std::fs::metadata(path)?.permissions().mode() & 0o7777)
    };

    let shared = dir.path().join("shared.json");
    std::fs::write(&shared, b"{}")?;
    std::fs::set_permissions(&shared, std::fs::Permissions::from_mode(0o644))?;
    let mut map = ConfigMap::new();
    map.insert(String::from("port"), json!(8080));
    FileSource::new(&shared)
        .dump(&map)
        .map_err(|e| anyhow!(e.to_string()))?;
    ensure!(mode_of(&shared)? == 0o644, "existing file mode changed");

    let reference = dir.path().join("reference");
    std::fs::File::create(&reference)?;
    let fresh = RawResource::text(dir.path().join("motd.txt"));
    fresh.dump("hello")?;
    ensure!(mode_of(fresh.path())? == mode_of(&reference)?, "new file ignores umask");
    Ok(())
}
