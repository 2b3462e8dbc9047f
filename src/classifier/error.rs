/// Result type for classification calls
pub type ClassificationResult<T> = std::result::Result<T, ClassificationError>;

/// Failure of the external classification call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassificationError {
    /// The call did not complete within the configured bound
    #[error("Classification timed out after {0}ms")]
    Timeout(u64),

    /// The request could not be sent or the connection failed
    #[error("Classification transport error: {0}")]
    Transport(String),

    /// The provider answered with a non-success status
    #[error("Classification provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    /// The provider's envelope could not be read
    #[error("Invalid classification response: {0}")]
    InvalidResponse(String),

    /// The client is misconfigured (missing credentials, bad endpoint)
    #[error("Classifier configuration error: {0}")]
    Configuration(String),
}

impl ClassificationError {
    pub fn kind(&self) -> &'static str {
        match self {
            ClassificationError::Timeout(_) => "timeout",
            ClassificationError::Transport(_) => "transport",
            ClassificationError::Provider { .. } => "provider",
            ClassificationError::InvalidResponse(_) => "invalid_response",
            ClassificationError::Configuration(_) => "configuration",
        }
    }

    /// Whether retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ClassificationError::Timeout(_) | ClassificationError::Transport(_) => true,
            ClassificationError::Provider { status, .. } => *status == 429 || *status >= 500,
            ClassificationError::InvalidResponse(_) | ClassificationError::Configuration(_) => {
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(ClassificationError::Timeout(1000).is_retryable());
        assert!(ClassificationError::Transport("reset".to_string()).is_retryable());
        let provider = |status| ClassificationError::Provider {
            status,
            message: String::new(),
        };
        assert!(provider(503).is_retryable());
        assert!(provider(429).is_retryable());
        assert!(!provider(401).is_retryable());
        assert!(!ClassificationError::InvalidResponse("no choices".to_string()).is_retryable());
    }
}
