//! Configuration sources and the contract they share with the manager.
//!
//! A source produces a mapping, or reports that it has nothing to offer.
//! Absence is only acceptable from optional sources; a required source that
//! cannot produce data fails with a [`crate::ConfigError`] naming it.

mod environment;
mod file;
mod memory;

pub use environment::EnvSource;
pub use file::FileSource;
pub use memory::MapSource;

use crate::{ConfigMap, ConfigResult};

/// Provider of one configuration layer.
pub trait ConfigSource: Send + Sync {
    /// Label identifying the source in diagnostics.
    fn label(&self) -> String;

    /// Whether the source may legitimately produce nothing.
    fn is_optional(&self) -> bool {
        false
    }

    /// Produce this source's mapping, or `None` when an optional source has
    /// nothing to contribute.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::ConfigError`] when a required source is missing or
    /// its data cannot be read or decoded.
    fn provide(&self) -> ConfigResult<Option<ConfigMap>>;
}

impl<S: ConfigSource + ?Sized> ConfigSource for Box<S> {
    fn label(&self) -> String {
        (**self).label()
    }

    fn is_optional(&self) -> bool {
        (**self).is_optional()
    }

    fn provide(&self) -> ConfigResult<Option<ConfigMap>> {
        (**self).provide()
    }
}
