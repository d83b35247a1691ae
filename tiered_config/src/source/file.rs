//! Structured file source with atomic write-back.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::codec::{CodecRegistry, FormatCodec};
use crate::error::ConfigError;
use crate::path::{ensure_parent_dir, expand_home};
use crate::persist::write_atomic;
use crate::value::{ConfigMap, kind_name};
use crate::{ConfigResult, ConfigSource};

/// Source reading one structured configuration file.
///
/// The codec is chosen from the file extension through a [`CodecRegistry`].
/// A leading `~` in the path is expanded to the home directory.
///
/// # Examples
///
/// ```rust,no_run
/// use tiered_config::{ConfigSource, FileSource};
///
/// # fn run() -> tiered_config::ConfigResult<()> {
/// let local = FileSource::new("~/.config/app/config.toml").optional(true);
/// if let Some(map) = local.provide()? {
///     println!("loaded {} top-level keys", map.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    optional: bool,
    file_mode: Option<u32>,
    registry: CodecRegistry,
}

impl FileSource {
    /// Create a required source for `path` using the default codec registry.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: expand_home(path.as_ref()),
            optional: false,
            file_mode: None,
            registry: CodecRegistry::default(),
        }
    }

    /// Mark the source as optional: a missing file contributes nothing.
    #[must_use]
    pub const fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Permission bits applied when [`FileSource::dump`] writes the file.
    #[must_use]
    pub const fn file_mode(mut self, mode: u32) -> Self {
        self.file_mode = Some(mode);
        self
    }

    /// Use `registry` instead of the default codecs.
    #[must_use]
    pub fn with_registry(mut self, registry: CodecRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Resolved path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn codec(&self) -> ConfigResult<Arc<dyn FormatCodec>> {
        self.registry.resolve(&self.path).map_err(|(extension, reason)| {
            Arc::new(ConfigError::UnsupportedFormat {
                path: self.path.clone(),
                extension,
                reason,
            })
        })
    }

    /// Encode `map` with this file's codec and atomically replace the file.
    ///
    /// Missing parent directories are created first.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedFormat`] when no codec matches the
    /// extension, [`ConfigError::Encode`] when the format cannot represent
    /// `map`, and [`ConfigError::Write`] when the file cannot be written.
    pub fn dump(&self, map: &ConfigMap) -> ConfigResult<()> {
        let codec = self.codec()?;
        let bytes = codec
            .encode(map)
            .map_err(|err| ConfigError::encode(&self.path, err))?;
        ensure_parent_dir(&self.path).map_err(|err| ConfigError::write(&self.path, err))?;
        write_atomic(&self.path, &bytes, self.file_mode)
            .map_err(|err| ConfigError::write(&self.path, err))?;
        tracing::debug!(path = %self.path.display(), format = codec.name(), "wrote configuration file");
        Ok(())
    }
}

impl ConfigSource for FileSource {
    fn label(&self) -> String {
        self.path.display().to_string()
    }

    fn is_optional(&self) -> bool {
        self.optional
    }

    fn provide(&self) -> ConfigResult<Option<ConfigMap>> {
        if !self.path.exists() {
            if self.optional {
                tracing::debug!(path = %self.path.display(), "optional configuration file absent");
                return Ok(None);
            }
            return Err(ConfigError::missing_source(self.label()));
        }
        let codec = self.codec()?;
        let bytes = std::fs::read(&self.path).map_err(|err| ConfigError::file(&self.path, err))?;
        let value = codec
            .decode(&bytes)
            .map_err(|err| ConfigError::file(&self.path, err))?;
        match value {
            Value::Object(map) => Ok(Some(map)),
            other => Err(Arc::new(ConfigError::NotAMapping {
                label: self.label(),
                found: kind_name(&other),
            })),
        }
    }
}
