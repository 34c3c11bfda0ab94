//! # AppError
//!
//! Centralized error handling for the rusty-threads ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all rt-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Thread, User, Community)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., empty thread text, self-follow)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Caller is not allowed to perform the operation
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Resource already exists or relation is already established
    /// (e.g., duplicate community username, double-follow)
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing store could not be reached or an I/O call failed
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl AppError {
    /// Shorthand for the common "looked up X by id, got nothing" case.
    pub fn not_found(kind: &str, id: impl std::fmt::Display) -> Self {
        AppError::NotFound(kind.to_string(), id.to_string())
    }
}

/// A specialized Result type for rusty-threads logic.
pub type Result<T> = std::result::Result<T, AppError>;
