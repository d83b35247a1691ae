//! Errors reported together by one load.

use std::{error::Error, fmt, sync::Arc};

use super::ConfigError;

/// Errors reported together by a single [`crate::ConfigManager::load`] call,
/// typically one per schema violation.
#[derive(Debug)]
pub struct AggregatedErrors(Vec<Arc<ConfigError>>);

impl AggregatedErrors {
    pub(crate) const fn new(errors: Vec<Arc<ConfigError>>) -> Self {
        Self(errors)
    }

    /// Contained errors in the order they were reported.
    pub fn iter(&self) -> impl Iterator<Item = &ConfigError> {
        self.0.iter().map(Arc::as_ref)
    }
}

impl fmt::Display for AggregatedErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (number, err) in (1_usize..).zip(&self.0) {
            if number > 1 {
                f.write_str("\n")?;
            }
            write!(f, "{number}: {err}")?;
        }
        Ok(())
    }
}

impl Error for AggregatedErrors {}
