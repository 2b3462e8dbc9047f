//! Error types for messaging operations

/// Result type for messaging operations
pub type MessagingResult<T> = std::result::Result<T, MessagingError>;

/// Errors that can occur during messaging operations
#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    /// Publish failed
    #[error("Publish failed: {0}")]
    PublishFailed(String),

    /// Subscribe failed
    #[error("Subscribe failed: {0}")]
    SubscribeFailed(String),

    /// Consume failed
    #[error("Consume failed: {0}")]
    ConsumeFailed(String),

    /// Offset commit failed
    #[error("Commit failed: {0}")]
    CommitFailed(String),

    /// Client could not be built from the supplied settings
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Invalid message format
    #[error("Invalid message format: {0}")]
    InvalidMessage(String),
}
