//! TOML codec backed by the `toml` crate.

use serde_json::Value;

use super::{CodecError, FormatCodec};
use crate::value::ConfigMap;

/// Key the `toml` crate uses when a datetime passes through serde.
const DATETIME_KEY: &str = "$__toml_private_datetime";

/// TOML documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlCodec;

impl FormatCodec for TomlCodec {
    fn name(&self) -> &'static str {
        "TOML"
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        let text = std::str::from_utf8(bytes)?;
        let table: toml::Table = toml::from_str(text)?;
        let mut value = serde_json::to_value(table)?;
        flatten_datetimes(&mut value);
        Ok(value)
    }

    fn encode(&self, map: &ConfigMap) -> Result<Vec<u8>, CodecError> {
        Ok(toml::to_string(map)?.into_bytes())
    }
}

/// Replace serde's datetime wrapper objects with their string form.
fn flatten_datetimes(value: &mut Value) {
    let stamp = match value {
        Value::Object(map) if map.len() == 1 => map
            .get(DATETIME_KEY)
            .and_then(Value::as_str)
            .map(str::to_owned),
        _ => None,
    };
    if let Some(text) = stamp {
        *value = Value::String(text);
        return;
    }
    match value {
        Value::Object(map) => map.values_mut().for_each(flatten_datetimes),
        Value::Array(items) => items.iter_mut().for_each(flatten_datetimes),
        _ => {}
    }
}
