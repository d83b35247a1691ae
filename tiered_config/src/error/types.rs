//! Primary error enum for configuration resolution flows.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use super::aggregate::AggregatedErrors;

/// Errors that can occur while loading, validating or writing configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A required source had nothing to provide.
    #[error("Required configuration source not found: {label}")]
    MissingSource {
        /// Diagnostic label of the source, usually its path.
        label: String,
    },

    /// No codec is available for the file extension.
    #[error("Unsupported configuration file format for '{path}' (extension '{extension}'): {reason}")]
    UnsupportedFormat {
        /// File whose format could not be handled.
        path: PathBuf,
        /// Lower-cased extension used for the codec lookup.
        extension: String,
        /// Why the extension is not supported.
        reason: String,
    },

    /// Error originating from a configuration file.
    #[error("Configuration file error in '{path}': {source}")]
    File {
        /// Path that triggered the configuration failure.
        path: PathBuf,
        /// Underlying error reported by the codec.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A mapping could not be encoded for write-back.
    #[error("Could not encode configuration for '{path}': {source}")]
    Encode {
        /// Target file of the write.
        path: PathBuf,
        /// Underlying error reported by the codec.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A source produced a document whose top level is not a mapping.
    #[error("Configuration source '{label}' did not produce a mapping (found {found})")]
    NotAMapping {
        /// Diagnostic label of the offending source.
        label: String,
        /// Kind of value found at the top level.
        found: &'static str,
    },

    /// A source was constructed with invalid parameters.
    #[error("Invalid configuration source '{label}': {message}")]
    InvalidSource {
        /// Diagnostic label of the source.
        label: String,
        /// Human-readable explanation.
        message: String,
    },

    /// A manager was built without any sources.
    #[error("At least one configuration source must be provided")]
    NoSources,

    /// Validation failures when checking the merged configuration.
    #[error("Validation failed for '{key}': {message}")]
    Validation {
        /// Dotted key path that failed validation.
        key: String,
        /// Human-readable explanation of the validation failure.
        message: String,
    },

    /// A schema was configured without a validator to apply it.
    #[error(
        "A schema was configured but no schema validator is available; enable the 'schema' feature or supply a validator"
    )]
    ValidatorUnavailable,

    /// A key was looked up on a view that does not contain it.
    #[error("Configuration key not found: '{key}'")]
    KeyNotFound {
        /// Key or dotted path that was requested.
        key: String,
    },

    /// Reading a file failed.
    #[error("Could not read '{path}': {source}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Writing a file failed.
    #[error("Could not write '{path}': {source}")]
    Write {
        /// File being written.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Raw text content could not be decoded with the configured encoding.
    #[error("Could not decode '{path}' as {encoding}: {message}")]
    Decode {
        /// File being decoded.
        path: PathBuf,
        /// Name of the configured encoding.
        encoding: &'static str,
        /// Description of the first invalid sequence.
        message: String,
    },

    /// The resolved configuration could not be deserialised into a typed value.
    #[error("Failed to deserialize configuration: {0}")]
    Deserialize(#[source] serde_json::Error),

    /// Multiple errors occurred while loading configuration.
    #[error("multiple configuration errors:\n{0}")]
    Aggregate(Box<AggregatedErrors>),
}

/// Payload kind did not match the mode a raw resource was configured with.
///
/// This signals a programming error at the call site and is kept apart from
/// [`ConfigError`], which describes runtime and environment failures.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("raw resource in {expected} mode cannot dump {found} data")]
pub struct ModeMismatch {
    /// Mode the resource was configured with (`"text"` or `"binary"`).
    pub expected: &'static str,
    /// Kind of payload that was supplied.
    pub found: &'static str,
}

/// Failure returned by [`crate::RawResource::dump`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RawDumpError {
    /// The payload does not match the configured mode.
    #[error(transparent)]
    ModeMismatch(#[from] ModeMismatch),

    /// Encoding or writing the payload failed.
    #[error(transparent)]
    Configuration(#[from] Arc<ConfigError>),
}
