//! File-format codecs selected by file extension.
//!
//! A [`FormatCodec`] turns bytes into a configuration value and a mapping back
//! into bytes. [`CodecRegistry`] maps lower-cased extensions to codecs. JSON
//! and INI are always available; TOML and YAML are compiled in through the
//! `toml` and `yaml` features.

mod ini;
mod json;
#[cfg(feature = "toml")]
mod toml_codec;
#[cfg(feature = "yaml")]
mod yaml_codec;

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::value::ConfigMap;

pub use ini::IniCodec;
pub use json::JsonCodec;
#[cfg(feature = "toml")]
pub use toml_codec::TomlCodec;
#[cfg(feature = "yaml")]
pub use yaml_codec::YamlCodec;

/// Boxed error returned by codecs.
pub type CodecError = Box<dyn Error + Send + Sync>;

/// Encode and decode capability for one file format.
pub trait FormatCodec: Send + Sync {
    /// Human-readable format name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Decode raw file contents into a value.
    ///
    /// # Errors
    ///
    /// Returns the underlying parser error when `bytes` is not valid for the
    /// format.
    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError>;

    /// Encode a mapping into file contents.
    ///
    /// # Errors
    ///
    /// Returns an error when the format cannot represent `map`.
    fn encode(&self, map: &ConfigMap) -> Result<Vec<u8>, CodecError>;
}

/// Extensions that are compiled in only when their cargo feature is enabled.
const FEATURE_GATED: &[(&str, &str, bool)] = &[
    ("toml", "toml", cfg!(feature = "toml")),
    ("yaml", "yaml", cfg!(feature = "yaml")),
    ("yml", "yaml", cfg!(feature = "yaml")),
];

/// Registry of codecs keyed by lower-cased file extension.
///
/// # Examples
///
/// ```rust
/// use tiered_config::CodecRegistry;
///
/// let registry = CodecRegistry::default();
/// assert!(registry.get("JSON").is_some());
/// assert!(registry.get("xml").is_none());
/// ```
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: HashMap<String, Arc<dyn FormatCodec>>,
}

impl CodecRegistry {
    /// Create a registry without any codecs.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// Register `codec` for `extension`, replacing any previous entry.
    #[must_use]
    pub fn with_codec(mut self, extension: &str, codec: Arc<dyn FormatCodec>) -> Self {
        self.register(extension, codec);
        self
    }

    /// Register `codec` for `extension`, replacing any previous entry.
    pub fn register(&mut self, extension: &str, codec: Arc<dyn FormatCodec>) {
        self.codecs
            .insert(normalise_extension(extension), codec);
    }

    /// Look up the codec registered for `extension`.
    #[must_use]
    pub fn get(&self, extension: &str) -> Option<Arc<dyn FormatCodec>> {
        self.codecs.get(&normalise_extension(extension)).cloned()
    }

    /// Resolve the codec for `path` from its extension.
    ///
    /// Returns the normalised extension on failure together with a reason
    /// suitable for [`crate::ConfigError::UnsupportedFormat`].
    pub(crate) fn resolve(&self, path: &Path) -> Result<Arc<dyn FormatCodec>, (String, String)> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(normalise_extension)
            .unwrap_or_default();
        if let Some(codec) = self.codecs.get(&extension) {
            return Ok(Arc::clone(codec));
        }
        let gated = FEATURE_GATED
            .iter()
            .find(|(ext, _, compiled)| *ext == extension && !compiled);
        let reason = match gated {
            Some((_, feature, _)) => format!(
                "{feature} feature disabled: enable the '{feature}' feature to support this file format"
            ),
            None => String::from("no codec is registered for this extension"),
        };
        Err((extension, reason))
    }
}

impl Default for CodecRegistry {
    /// Registry with every codec compiled into the crate.
    fn default() -> Self {
        let json: Arc<dyn FormatCodec> = Arc::new(JsonCodec);
        let ini: Arc<dyn FormatCodec> = Arc::new(IniCodec);
        let mut registry = Self::empty()
            .with_codec("json", json)
            .with_codec("ini", Arc::clone(&ini))
            .with_codec("cfg", Arc::clone(&ini))
            .with_codec("conf", ini);
        #[cfg(feature = "toml")]
        registry.register("toml", Arc::new(TomlCodec));
        #[cfg(feature = "yaml")]
        {
            let yaml: Arc<dyn FormatCodec> = Arc::new(YamlCodec);
            registry.register("yaml", Arc::clone(&yaml));
            registry.register("yml", yaml);
        }
        registry
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut extensions: Vec<&str> = self.codecs.keys().map(String::as_str).collect();
        extensions.sort_unstable();
        f.debug_struct("CodecRegistry")
            .field("extensions", &extensions)
            .finish()
    }
}

fn normalise_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}
