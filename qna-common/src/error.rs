//! Common error types for the Q&A panel crates

use thiserror::Error;

/// Common result type for Q&A panel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the panel crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed cue point, metadata blob, or enum value
    #[error("Parse error: {0}")]
    Parse(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
