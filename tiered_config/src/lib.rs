//! Layered configuration resolution.
//!
//! `tiered_config` reads configuration from an ordered list of sources
//! (in-memory defaults, files and environment variables), deep-merges them so
//! later sources override earlier ones, optionally validates the result
//! against a schema and exposes it through the read-only [`Config`] view.
//!
//! File formats are handled by pluggable [`FormatCodec`]s. JSON and INI are
//! always available; TOML (`toml` feature, on by default) and YAML (`yaml`
//! feature) are compiled in on demand. Files are written back atomically, and
//! [`RawResource`] covers whole-file text or binary payloads such as tokens.
//!
//! ```rust
//! use serde_json::json;
//! use tiered_config::{ConfigManager, EnvSource, MapSource};
//!
//! # fn main() -> tiered_config::ConfigResult<()> {
//! let manager = ConfigManager::builder()
//!     .source(MapSource::from_value(json!({"app": {"debug": false, "workers": 2}}))?)
//!     .source(EnvSource::from_vars("APP_", [("APP_APP__DEBUG", "yes")])?)
//!     .build()?;
//! let config = manager.load()?;
//! assert_eq!(config.path("app.debug").and_then(|item| item.as_bool()), Some(true));
//! assert_eq!(config.path("app.workers").and_then(|item| item.as_i64()), Some(2));
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

pub mod codec;
mod env;
mod error;
mod manager;
mod path;
mod persist;
mod raw;
mod result_ext;
mod schema;
mod source;
mod value;
mod view;

pub use codec::{CodecRegistry, FormatCodec};
pub use env::{NESTING_SEPARATOR, coerce_scalar, decode_vars, key_path};
pub use error::{AggregatedErrors, ConfigError, ModeMismatch, RawDumpError};
pub use manager::{ConfigManager, ConfigManagerBuilder};
pub use path::expand_home;
pub use persist::{PERMISSION_MASK, apply_mode, permission_bits, write_atomic};
pub use raw::{DecodeErrors, RawMode, RawPayload, RawResource, TextEncoding};
pub use result_ext::{ConfigResultExt, IntoFigmentError, ResultIntoFigment};
#[cfg(feature = "schema")]
pub use schema::BasicSchemaValidator;
pub use schema::{SchemaValidator, SchemaViolation, default_validator};
pub use source::{ConfigSource, EnvSource, FileSource, MapSource};
pub use value::{ConfigMap, kind_name, merge_maps, merge_into, merge_value};
pub use view::{Config, ConfigItem, ConfigView};

/// Result alias used throughout the crate.
///
/// Errors are shared behind an [`Arc`] so they can be cloned into aggregates
/// and across threads without copying their sources.
pub type ConfigResult<T> = Result<T, Arc<ConfigError>>;
