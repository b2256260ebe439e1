//! API request handlers.

/// Chat and session handlers.
pub mod chat;
/// Liveness and service info handlers.
pub mod health;
