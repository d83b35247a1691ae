//! Error types produced while resolving and persisting configuration.

mod aggregate;
mod constructors;
mod conversions;
mod types;

pub use aggregate::AggregatedErrors;
pub use types::{ConfigError, ModeMismatch, RawDumpError};
