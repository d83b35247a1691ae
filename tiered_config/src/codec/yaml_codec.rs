//! YAML codec backed by `serde_yaml`.

use serde_json::Value;

use super::{CodecError, FormatCodec};
use crate::value::ConfigMap;

/// YAML documents. An empty document decodes to an empty mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

impl FormatCodec for YamlCodec {
    fn name(&self) -> &'static str {
        "YAML"
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        let text = std::str::from_utf8(bytes)?;
        if text.trim().is_empty() {
            return Ok(Value::Object(ConfigMap::new()));
        }
        match serde_yaml::from_str::<Value>(text)? {
            Value::Null => Ok(Value::Object(ConfigMap::new())),
            other => Ok(other),
        }
    }

    fn encode(&self, map: &ConfigMap) -> Result<Vec<u8>, CodecError> {
        Ok(serde_yaml::to_string(map)?.into_bytes())
    }
}
