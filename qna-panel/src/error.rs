//! Error types for qna-panel
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation. Nothing here crosses a component boundary during
//! steady-state event processing; errors short-circuit a single parse or
//! submit attempt and are caught at that attempt's entry point.

use thiserror::Error;

/// Main error type for the qna-panel crate
#[derive(Error, Debug)]
pub enum Error {
    /// Errors from the shared qna-common layer
    #[error(transparent)]
    Common(#[from] qna_common::Error),

    /// Malformed raw cue point or metadata blob
    #[error("Parse error: {0}")]
    Parse(String),

    /// Outbound submit protocol failure (any step, or a missing dependent id)
    #[error("Submit error: {0}")]
    Submit(String),

    /// HTTP transport error from the submit client
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Missing precondition for an operation (e.g. no entry id configured)
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using the qna-panel Error
pub type Result<T> = std::result::Result<T, Error>;
