//! Application-level errors

use std::fmt;

use domain::{DomainError, SequenceIndex};
use thiserror::Error;

/// Errors reported by the collaborators behind the application ports
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Inference/LLM token stream error
    #[error("Inference error: {0}")]
    Inference(String),

    /// External service error
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Credentials rejected by a service
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// Malformed or unsupported audio
    #[error("Invalid audio: {0}")]
    InvalidAudio(String),

    /// Audio output device unavailable or failing
    #[error("Audio device error: {0}")]
    Device(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::ExternalService(_) | Self::Inference(_)
        )
    }
}

/// Stage of the speech pipeline at which a run failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    /// Pulling fragments from the token source
    Upstream,
    /// Converting a chunk into encoded audio
    Synthesis,
    /// Converting encoded audio into samples
    Decode,
    /// Writing samples to the playback sink
    Playback,
    /// Run stopped by a cancellation request
    Cancelled,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upstream => write!(f, "upstream"),
            Self::Synthesis => write!(f, "synthesis"),
            Self::Decode => write!(f, "decode"),
            Self::Playback => write!(f, "playback"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Terminal failure of a pipeline run
///
/// Every variant carries the sequence index of the chunk in flight, so the
/// caller can tell which part of the text was (not) spoken.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The token source failed while chunk `index` was being accumulated
    #[error("Upstream token stream failed at chunk {index}: {source}")]
    UpstreamStream {
        index: SequenceIndex,
        source: ApplicationError,
    },

    /// Synthesis of chunk `index` failed
    #[error("Synthesis failed for chunk {index}: {source}")]
    Synthesis {
        index: SequenceIndex,
        source: ApplicationError,
    },

    /// Decoding the audio of chunk `index` failed
    #[error("Decoding failed for chunk {index}: {source}")]
    Decode {
        index: SequenceIndex,
        source: ApplicationError,
    },

    /// Playing the audio of chunk `index` failed
    #[error("Playback failed for chunk {index}: {source}")]
    Playback {
        index: SequenceIndex,
        source: ApplicationError,
    },

    /// The run was cancelled while chunk `index` was in flight
    #[error("Pipeline cancelled at chunk {index}")]
    Cancelled { index: SequenceIndex },
}

impl PipelineError {
    /// The stage that failed
    pub const fn stage(&self) -> PipelineStage {
        match self {
            Self::UpstreamStream { .. } => PipelineStage::Upstream,
            Self::Synthesis { .. } => PipelineStage::Synthesis,
            Self::Decode { .. } => PipelineStage::Decode,
            Self::Playback { .. } => PipelineStage::Playback,
            Self::Cancelled { .. } => PipelineStage::Cancelled,
        }
    }

    /// Sequence index of the chunk in flight at failure time
    pub const fn index(&self) -> SequenceIndex {
        match self {
            Self::UpstreamStream { index, .. }
            | Self::Synthesis { index, .. }
            | Self::Decode { index, .. }
            | Self::Playback { index, .. }
            | Self::Cancelled { index } => *index,
        }
    }

    /// Whether the run ended because of a cancellation request
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Whether retrying the whole run may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::UpstreamStream { source, .. } | Self::Synthesis { source, .. } => {
                source.is_retryable()
            },
            Self::Decode { .. } | Self::Playback { .. } | Self::Cancelled { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_is_retryable() {
        assert!(ApplicationError::RateLimited.is_retryable());
        assert!(!ApplicationError::Configuration("x".to_string()).is_retryable());
    }

    #[test]
    fn domain_error_converts() {
        let err: ApplicationError = DomainError::validation("bad").into();
        assert_eq!(err.to_string(), "Validation failed: bad");
    }

    #[test]
    fn pipeline_error_carries_stage_and_index() {
        let err = PipelineError::Synthesis {
            index: SequenceIndex::new(2),
            source: ApplicationError::RateLimited,
        };
        assert_eq!(err.stage(), PipelineStage::Synthesis);
        assert_eq!(err.index().get(), 2);
        assert_eq!(
            err.to_string(),
            "Synthesis failed for chunk 2: Rate limit exceeded"
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn pipeline_error_exposes_source() {
        use std::error::Error as _;

        let err = PipelineError::Playback {
            index: SequenceIndex::FIRST,
            source: ApplicationError::Device("unplugged".to_string()),
        };
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "Audio device error: unplugged");
        assert!(!err.is_retryable());
    }

    #[test]
    fn cancelled_error() {
        let err = PipelineError::Cancelled {
            index: SequenceIndex::new(3),
        };
        assert!(err.is_cancelled());
        assert_eq!(err.stage().to_string(), "cancelled");
        assert_eq!(err.to_string(), "Pipeline cancelled at chunk 3");
    }
}
