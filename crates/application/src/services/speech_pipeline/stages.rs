//! Stage calls shared by both pipeline modes, each tagging its failures

use std::sync::Arc;

use domain::{AudioUnit, Chunk};
use tracing::{debug, trace};

use super::pcm::DecodedPcm;
use crate::error::{ApplicationError, PipelineError};
use crate::ports::{AudioDecoder, SpeechSynthesizer};

/// Synthesize one chunk
pub(super) async fn synthesize(
    synthesizer: &dyn SpeechSynthesizer,
    chunk: &Chunk,
) -> Result<AudioUnit, PipelineError> {
    debug!(index = %chunk.index(), len = chunk.len(), "Synthesizing chunk");
    let unit = synthesizer
        .synthesize(chunk)
        .await
        .map_err(|source| PipelineError::Synthesis {
            index: chunk.index(),
            source,
        })?;
    trace!(index = %unit.index(), size = unit.size_bytes(), format = %unit.format(), "Chunk synthesized");
    Ok(unit)
}

/// Decode one audio unit completely on the blocking pool
pub(super) async fn decode(
    decoder: Arc<dyn AudioDecoder>,
    unit: AudioUnit,
) -> Result<DecodedPcm, PipelineError> {
    let index = unit.index();
    let pcm = tokio::task::spawn_blocking(move || {
        let decoded = decoder.decode(unit)?;
        DecodedPcm::collect(index, decoded)
    })
    .await
    .map_err(|e| PipelineError::Decode {
        index,
        source: ApplicationError::Internal(format!("Decoder worker failed: {e}")),
    })?
    .map_err(|source| PipelineError::Decode { index, source })?;

    trace!(index = %index, frames = pcm.frames(), "Chunk decoded");
    Ok(pcm)
}
