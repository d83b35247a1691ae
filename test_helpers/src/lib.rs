//! Test helpers shared across the workspace.
//!
//! [`env`] serialises process environment mutation behind RAII guards and
//! [`figment`] wraps `figment::Jail` for tests that need an isolated working
//! directory and environment.

pub mod env;
pub mod figment;
