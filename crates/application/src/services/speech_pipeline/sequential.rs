//! Sequential mode: one chunk at a time through every stage

use std::sync::Arc;

use domain::{Chunk, Chunker, SequenceIndex};
use tracing::debug;

use super::pcm::DecodedPcm;
use super::sink_slot::SinkSlot;
use super::{
    CancellationFlag, PipelineReport, PipelineResult, PipelineState, SpeechPipeline, stages,
};
use crate::error::{ApplicationError, PipelineError};
use crate::ports::TokenSource;

pub(super) async fn run(
    pipeline: &SpeechPipeline,
    source: &mut dyn TokenSource,
    stop: &CancellationFlag,
) -> PipelineResult {
    let mut run = SequentialRun::new(pipeline);
    let result = run.execute(source, stop).await;
    run.transition(if result.is_ok() {
        PipelineState::Done
    } else {
        PipelineState::Failed
    });
    result
}

struct SequentialRun<'a> {
    pipeline: &'a SpeechPipeline,
    chunker: Chunker,
    /// `None` only while a blocking playback call owns the sink
    slot: Option<SinkSlot>,
    state: PipelineState,
    current: SequenceIndex,
    chunks_played: u64,
}

impl<'a> SequentialRun<'a> {
    fn new(pipeline: &'a SpeechPipeline) -> Self {
        Self {
            pipeline,
            chunker: Chunker::new(pipeline.config.chunk_threshold),
            slot: Some(SinkSlot::new(Arc::clone(&pipeline.device))),
            state: PipelineState::Idle,
            current: SequenceIndex::FIRST,
            chunks_played: 0,
        }
    }

    fn transition(&mut self, next: PipelineState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, index = %self.current, "Pipeline state change");
            self.state = next;
        }
    }

    async fn execute(
        &mut self,
        source: &mut dyn TokenSource,
        stop: &CancellationFlag,
    ) -> PipelineResult {
        loop {
            self.transition(PipelineState::Streaming);
            self.current = self.chunker.next_index();

            let Some(next) = stop.guard(source.next_fragment()).await else {
                return Err(PipelineError::Cancelled {
                    index: self.current,
                });
            };
            let fragment = next.map_err(|source| PipelineError::UpstreamStream {
                index: self.current,
                source,
            })?;

            match fragment {
                Some(fragment) => {
                    if let Some(chunk) = self.chunker.push(&fragment) {
                        self.speak(chunk, stop).await?;
                    }
                },
                None => break,
            }
        }

        if let Some(chunk) = self.chunker.flush() {
            self.speak(chunk, stop).await?;
        }

        self.transition(PipelineState::Draining);
        self.drain().await?;

        let slot = self.slot.as_ref();
        Ok(PipelineReport {
            chunks_played: self.chunks_played,
            blocks_played: slot.map_or(0, SinkSlot::blocks_played),
            frames_played: slot.map_or(0, SinkSlot::frames_played),
            spec: slot.and_then(SinkSlot::spec),
            ..PipelineReport::empty(self.pipeline.config.mode)
        })
    }

    /// Synthesize, decode and play one chunk
    async fn speak(&mut self, chunk: Chunk, stop: &CancellationFlag) -> Result<(), PipelineError> {
        let index = chunk.index();
        self.current = index;
        let cancelled = || PipelineError::Cancelled { index };

        self.transition(PipelineState::Synthesizing);
        let unit = stop
            .guard(stages::synthesize(self.pipeline.synthesizer.as_ref(), &chunk))
            .await
            .ok_or_else(cancelled)??;

        self.transition(PipelineState::Decoding);
        let pcm = stop
            .guard(stages::decode(Arc::clone(&self.pipeline.decoder), unit))
            .await
            .ok_or_else(cancelled)??;

        self.transition(PipelineState::Playing);
        self.play(pcm, stop).await?;
        self.chunks_played += 1;
        Ok(())
    }

    /// Write every block of `pcm` on the blocking pool
    async fn play(&mut self, pcm: DecodedPcm, stop: &CancellationFlag) -> Result<(), PipelineError> {
        let index = pcm.index();
        let block_frames = self.pipeline.config.block_frames;
        let stop = stop.clone();
        let mut slot = self.take_slot(index)?;

        let (slot, result) = tokio::task::spawn_blocking(move || {
            let result = write_blocks(&mut slot, pcm, block_frames, &stop);
            (slot, result)
        })
        .await
        .map_err(|e| playback_worker_failed(index, &e))?;

        self.slot = Some(slot);
        result
    }

    async fn drain(&mut self) -> Result<(), PipelineError> {
        let index = self.current;
        let mut slot = self.take_slot(index)?;

        let (slot, result) = tokio::task::spawn_blocking(move || {
            let result = slot.drain();
            (slot, result)
        })
        .await
        .map_err(|e| playback_worker_failed(index, &e))?;

        self.slot = Some(slot);
        result.map_err(|source| PipelineError::Playback { index, source })
    }

    fn take_slot(&mut self, index: SequenceIndex) -> Result<SinkSlot, PipelineError> {
        self.slot.take().ok_or_else(|| PipelineError::Playback {
            index,
            source: ApplicationError::Internal("Playback sink unavailable".to_string()),
        })
    }
}

fn write_blocks(
    slot: &mut SinkSlot,
    pcm: DecodedPcm,
    block_frames: usize,
    stop: &CancellationFlag,
) -> Result<(), PipelineError> {
    let index = pcm.index();
    for block in pcm.blocks(block_frames) {
        if stop.is_cancelled() {
            return Err(PipelineError::Cancelled { index });
        }
        let block = block.map_err(|e| PipelineError::Decode {
            index,
            source: e.into(),
        })?;
        slot.write(&block)
            .map_err(|source| PipelineError::Playback { index, source })?;
    }
    Ok(())
}

fn playback_worker_failed(index: SequenceIndex, error: &tokio::task::JoinError) -> PipelineError {
    PipelineError::Playback {
        index,
        source: ApplicationError::Internal(format!("Playback worker failed: {error}")),
    }
}
