//! Error types for the tutoring matchmaking service
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific matchmaking and relay scenarios
#[derive(Debug, thiserror::Error)]
pub enum TutorMatchError {
    #[error("Audit store failure: {message}")]
    AuditStoreFailed { message: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}
