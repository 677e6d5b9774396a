//! Token source port - Interface for the upstream text stream

use async_trait::async_trait;
use domain::TextFragment;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Pull-based source of text fragments (typically an LLM token stream)
///
/// The pipeline calls `next_fragment` until it returns `Ok(None)`, which
/// marks the end of the stream. The pipeline does not know how fragments
/// are produced.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TokenSource: Send {
    /// Receive the next fragment, `None` at end of stream
    async fn next_fragment(&mut self) -> Result<Option<TextFragment>, ApplicationError>;
}
