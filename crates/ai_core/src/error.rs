//! Inference errors

use thiserror::Error;

/// Errors that can occur during inference
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Failed to connect to inference server
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request to inference server failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Model not found or not available to this key
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Response parsing failed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Timeout during inference
    #[error("Inference timeout after {0}ms")]
    Timeout(u64),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimited,

    /// API key missing or rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Server error
    #[error("Server error: {0}")]
    ServerError(String),

    /// Streaming error
    #[error("Stream error: {0}")]
    StreamError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl InferenceError {
    /// Map a transport error, reporting timeouts with the configured limit
    pub fn from_reqwest(err: &reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout_ms)
        } else if err.is_connect() {
            Self::ConnectionFailed(err.to_string())
        } else {
            Self::RequestFailed(err.to_string())
        }
    }

    /// Check if this error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::Timeout(_) | Self::RateLimited | Self::ServerError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(InferenceError::RateLimited.is_retryable());
        assert!(InferenceError::Timeout(1000).is_retryable());
        assert!(!InferenceError::Unauthorized("bad key".to_string()).is_retryable());
        assert!(!InferenceError::InvalidResponse("eof".to_string()).is_retryable());
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            InferenceError::Timeout(500).to_string(),
            "Inference timeout after 500ms"
        );
        assert_eq!(
            InferenceError::Unauthorized("invalid key".to_string()).to_string(),
            "Unauthorized: invalid key"
        );
    }
}
