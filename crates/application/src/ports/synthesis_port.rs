//! Synthesis port - Interface for text-to-speech services

use async_trait::async_trait;
use domain::{AudioUnit, Chunk};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for converting a chunk of text into an encoded audio unit
///
/// The returned unit must be independently decodable: it may not depend on
/// encoder state from neighbouring chunks. Retry policy, if any, lives
/// behind this port.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize the chunk's text, tagging the unit with the chunk's index
    async fn synthesize(&self, chunk: &Chunk) -> Result<AudioUnit, ApplicationError>;
}
