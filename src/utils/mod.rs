//! Configuration and logging utilities.

/// Layered service configuration (defaults, TOML file, environment).
pub mod config;
/// Tracing subscriber setup.
pub mod logging;
