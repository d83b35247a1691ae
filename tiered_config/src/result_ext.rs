//! Extensions for mapping errors to `ConfigResult` concisely.
//!
//! These helpers reduce repetitive `.map_err(|e| Arc::new(e.into()))`
//! patterns when converting external error types into the crate's
//! `ConfigResult<T>` alias (`Result<T, Arc<ConfigError>>`).
//!
//! # Examples
//!
//! ```
//! use tiered_config::{ConfigResult, ConfigResultExt};
//!
//! fn port() -> ConfigResult<u16> {
//!     // serde_json::Error implements Into<ConfigError>
//!     serde_json::from_value(serde_json::json!(8080)).into_config()
//! }
//! # assert_eq!(port().ok(), Some(8080));
//! ```

use crate::{ConfigError, ConfigResult};
use std::sync::Arc;

/// Generic extension for mapping any `Result<T, E>` with `E: Into<ConfigError>`
/// into a `ConfigResult<T>`.
pub trait ConfigResultExt<T, E> {
    /// Convert `Result<T, E>` into `ConfigResult<T>` using `Into<ConfigError>`.
    ///
    /// # Errors
    ///
    /// Propagates the original error after conversion into `Arc<ConfigError>`.
    fn into_config(self) -> ConfigResult<T>;
}

impl<T, E> ConfigResultExt<T, E> for Result<T, E>
where
    E: Into<ConfigError>,
{
    fn into_config(self) -> ConfigResult<T> {
        self.map_err(|e| Arc::new(e.into()))
    }
}

/// Convert shared configuration errors into `figment::Error`, for code running
/// inside `figment::Jail` closures or other figment-based pipelines.
pub trait IntoFigmentError {
    /// Convert into a `figment::Error`, preserving message text.
    fn into_figment(self) -> figment::Error;
}

impl IntoFigmentError for Arc<ConfigError> {
    fn into_figment(self) -> figment::Error {
        figment::Error::from(self.to_string())
    }
}

/// Extension to convert `Result<T, Arc<ConfigError>>` into `Result<T, figment::Error>`.
#[expect(
    clippy::result_large_err,
    reason = "figment::Error is large; this helper bridges into figment::Jail closures"
)]
pub trait ResultIntoFigment<T> {
    /// Map the `Arc<ConfigError>` error into a `figment::Error` using
    /// [`IntoFigmentError`].
    ///
    /// # Errors
    ///
    /// Returns a `figment::Error` containing the original message.
    fn to_figment(self) -> Result<T, figment::Error>;
}

impl<T> ResultIntoFigment<T> for Result<T, Arc<ConfigError>> {
    fn to_figment(self) -> Result<T, figment::Error> {
        self.map_err(IntoFigmentError::into_figment)
    }
}
