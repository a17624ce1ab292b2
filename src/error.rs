//! Error types for Stresslens
//!
//! The per-frame pipeline itself never errors: degraded results are values.
//! Errors only occur at the configuration and serialization boundary.

use thiserror::Error;

/// Errors raised at the crate boundary (config parsing, frame decoding).
#[derive(Debug, Error)]
pub enum StressError {
    #[error("Failed to parse payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid landmark frame: {0}")]
    InvalidFrame(String),
}
