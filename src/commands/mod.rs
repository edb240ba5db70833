//! Command facade for a UI shell.
//!
//! Records arrive as raw JSON plus their kind; every error is flattened to a
//! `String` for the shell to show.

pub mod export;
pub mod viewer;

/// Health check command — verifies the engine is linked in
pub fn health_check() -> String {
    tracing::debug!("Health check called");
    "ok".to_string()
}
