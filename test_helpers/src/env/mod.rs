//! Helpers for safely mutating environment variables in tests.
//!
//! Every mutation holds a global re-entrant mutex and returns an RAII guard
//! that restores the previous state when dropped. Guards for the same key
//! restore in LIFO order.
//!
//! Tests exercising prefix scans should use [`isolate`], which removes every
//! variable carrying the prefix, sets the requested ones and keeps the lock
//! until the returned [`EnvScope`] is dropped.
//!
//! # Examples
//!
//! ```
//! use test_helpers::env;
//!
//! let _g = env::set_var("KEY", "VALUE");
//! // `KEY` is set to `VALUE` for the duration of the guard.
//! ```

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::env;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::sync::LazyLock;

static ENV_MUTEX: LazyLock<ReentrantMutex<()>> = LazyLock::new(ReentrantMutex::default);

/// Record `key`'s current value, apply `mutate` and return the restoring guard.
///
/// Callers must hold `ENV_MUTEX`.
fn guarded<F>(key: String, mutate: F) -> EnvVarGuard
where
    F: FnOnce(&str),
{
    let original = env::var_os(&key);
    mutate(&key);
    EnvVarGuard { key, original }
}

/// RAII guard restoring an environment variable to its prior value on drop.
#[must_use = "dropping restores the prior value"]
pub struct EnvVarGuard {
    key: String,
    original: Option<OsString>,
}

impl fmt::Debug for EnvVarGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvVarGuard")
            .field("key", &self.key)
            .field("had_original", &self.original.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        let _guard = ENV_MUTEX.lock();
        match self.original.take() {
            // SAFETY: `ENV_MUTEX` is held for the restoration.
            Some(value) => unsafe { env::set_var(&self.key, value) },
            // SAFETY: `ENV_MUTEX` is held for the restoration.
            None => unsafe { env::remove_var(&self.key) },
        }
    }
}

/// Sets an environment variable and returns a guard restoring its prior value.
///
/// # Examples
/// ```
/// use test_helpers::env;
/// let _g = env::set_var("FOO", "bar");
/// assert!(matches!(std::env::var("FOO"), Ok(ref value) if value == "bar"));
/// ```
pub fn set_var<K, V>(key: K, value: V) -> EnvVarGuard
where
    K: Into<String>,
    V: AsRef<OsStr>,
{
    let _lock = ENV_MUTEX.lock();
    // SAFETY: `ENV_MUTEX` is held for the mutation.
    guarded(key.into(), |k| unsafe { env::set_var(k, value.as_ref()) })
}

/// Removes an environment variable and returns a guard restoring its prior value.
///
/// # Examples
/// ```
/// use test_helpers::env;
/// let _g = env::remove_var("FOO");
/// assert!(std::env::var("FOO").is_err());
/// ```
pub fn remove_var<K>(key: K) -> EnvVarGuard
where
    K: Into<String>,
{
    let _lock = ENV_MUTEX.lock();
    // SAFETY: `ENV_MUTEX` is held for the mutation.
    guarded(key.into(), |k| unsafe { env::remove_var(k) })
}

/// RAII guard that serialises environment access for its lifetime.
#[must_use = "dropping releases the environment lock"]
pub struct EnvLock {
    _guard: ReentrantMutexGuard<'static, ()>,
}

impl fmt::Debug for EnvLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EnvLock")
    }
}

/// Acquire the global environment lock for the lifetime of the guard.
///
/// The lock is re-entrant, so [`set_var`] and [`remove_var`] may still be
/// called from the same thread while it is held.
///
/// # Examples
/// ```
/// use test_helpers::env;
///
/// let _lock = env::lock();
/// let _guard = env::set_var("KEY", "VALUE");
/// ```
pub fn lock() -> EnvLock {
    EnvLock {
        _guard: ENV_MUTEX.lock(),
    }
}

/// Guards plus the environment lock, released together on drop.
///
/// Guards are restored before the lock is released.
#[must_use = "dropping releases the environment lock and restores guards"]
pub struct EnvScope {
    guards: Vec<EnvVarGuard>,
    _lock: EnvLock,
}

impl fmt::Debug for EnvScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvScope")
            .field("guards", &self.guards)
            .finish_non_exhaustive()
    }
}

impl Drop for EnvScope {
    fn drop(&mut self) {
        // Restore while the lock is still held.
        drop(std::mem::take(&mut self.guards));
    }
}

/// Names of all process variables starting with `prefix`.
///
/// Names that are not valid UTF-8 are skipped.
#[must_use]
pub fn names_with_prefix(prefix: &str) -> Vec<String> {
    env::vars_os()
        .filter_map(|(name, _)| name.into_string().ok())
        .filter(|name| name.starts_with(prefix))
        .collect()
}

/// Remove every variable starting with `prefix`, then set `vars`.
///
/// The environment lock is held until the scope is dropped, at which point
/// every touched variable is restored.
///
/// # Examples
/// ```
/// use test_helpers::env;
///
/// let _scope = env::isolate("DOCTEST_", [("DOCTEST_PORT", "8080")]);
/// assert_eq!(env::names_with_prefix("DOCTEST_"), ["DOCTEST_PORT"]);
/// ```
pub fn isolate<I, K, V>(prefix: &str, vars: I) -> EnvScope
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: AsRef<OsStr>,
{
    let held = lock();
    let mut guards: Vec<EnvVarGuard> = names_with_prefix(prefix)
        .into_iter()
        .map(remove_var)
        .collect();
    guards.extend(vars.into_iter().map(|(key, value)| set_var(key, value)));
    EnvScope {
        guards,
        _lock: held,
    }
}
