//! Error types for the matchmaking service
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific matchmaking scenarios
#[derive(Debug, thiserror::Error)]
pub enum MatchmakingError {
    #[error("Invalid queue size {size}: queue size must be an even number of at least 2")]
    InvalidQueueSize { size: usize },

    #[error("Invalid queue name '{name}': {reason}")]
    InvalidQueueName { name: String, reason: String },

    #[error("Queue already exists: {name}")]
    DuplicateQueueName { name: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}

impl MatchmakingError {
    /// Whether this error is a rejected request rather than a service fault
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            MatchmakingError::InvalidQueueSize { .. }
                | MatchmakingError::InvalidQueueName { .. }
                | MatchmakingError::DuplicateQueueName { .. }
        )
    }
}
