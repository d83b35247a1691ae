//! Constructors and aggregation helpers for `ConfigError`.

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use super::{AggregatedErrors, ConfigError};

impl ConfigError {
    /// Combine `errors` into a single error.
    ///
    /// Returns `None` for an empty list and the error itself when exactly one
    /// uniquely owned error is given. Anything else becomes
    /// [`Self::Aggregate`].
    #[must_use]
    pub fn combine<I>(errors: I) -> Option<Self>
    where
        I: IntoIterator<Item = Arc<Self>>,
    {
        let mut errors: Vec<Arc<Self>> = errors.into_iter().collect();
        if errors.len() > 1 {
            return Some(Self::Aggregate(Box::new(AggregatedErrors::new(errors))));
        }
        let only = errors.pop()?;
        Some(Arc::try_unwrap(only).unwrap_or_else(|shared| {
            Self::Aggregate(Box::new(AggregatedErrors::new(vec![shared])))
        }))
    }

    /// Construct a [`ConfigError::File`] for a configuration path.
    #[must_use]
    pub fn file(path: &Path, err: impl Into<Box<dyn Error + Send + Sync>>) -> Arc<Self> {
        Arc::new(Self::File {
            path: path.to_path_buf(),
            source: err.into(),
        })
    }

    /// Construct a [`ConfigError::Encode`] for a write target.
    #[must_use]
    pub fn encode(path: &Path, err: impl Into<Box<dyn Error + Send + Sync>>) -> Arc<Self> {
        Arc::new(Self::Encode {
            path: path.to_path_buf(),
            source: err.into(),
        })
    }

    /// Construct a [`ConfigError::MissingSource`] from a source label.
    #[must_use]
    pub fn missing_source(label: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::MissingSource {
            label: label.into(),
        })
    }

    /// Construct a [`ConfigError::Io`] for a failed read.
    #[must_use]
    pub fn read(path: &Path, source: std::io::Error) -> Arc<Self> {
        Arc::new(Self::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Construct a [`ConfigError::Write`] for a failed write.
    #[must_use]
    pub fn write(path: &Path, source: std::io::Error) -> Arc<Self> {
        Arc::new(Self::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Construct a [`ConfigError::Validation`] for a dotted key path.
    #[must_use]
    pub fn validation(key: impl Into<String>, message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::Validation {
            key: key.into(),
            message: message.into(),
        })
    }

    /// Construct a [`ConfigError::KeyNotFound`].
    #[must_use]
    pub fn key_not_found(key: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::KeyNotFound { key: key.into() })
    }
}
