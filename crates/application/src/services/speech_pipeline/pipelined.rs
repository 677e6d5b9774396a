//! Pipelined mode: producer and consumer joined by a bounded queue
//!
//! The producer runs on the caller's task and turns chunks into sample
//! blocks; the consumer runs on the blocking pool and owns the sink.

use std::future::Future;
use std::sync::Arc;

use domain::{AudioSpec, Chunk, Chunker, SequenceIndex};
use tracing::{debug, warn};

use super::handoff::{BlockReceiver, BlockSender, handoff_queue};
use super::sink_slot::SinkSlot;
use super::{CancellationFlag, PipelineReport, PipelineResult, SpeechPipeline, stages};
use crate::error::{ApplicationError, PipelineError};
use crate::ports::TokenSource;

pub(super) async fn run(
    pipeline: &SpeechPipeline,
    source: &mut dyn TokenSource,
    stop: &CancellationFlag,
) -> PipelineResult {
    let (tx, rx) = handoff_queue(pipeline.config.queue_capacity);
    // Raised by the consumer when playback fails
    let abort = CancellationFlag::new();

    let consumer = Consumer {
        slot: SinkSlot::new(Arc::clone(&pipeline.device)),
        rx,
        abort: abort.clone(),
        stop: stop.clone(),
    };
    let consumer = tokio::task::spawn_blocking(move || consumer.run());

    let producer = Producer {
        pipeline,
        chunker: Chunker::new(pipeline.config.chunk_threshold),
        tx,
        abort,
        stop: stop.clone(),
        chunks: 0,
    };
    // Consumes the producer, closing the queue before the join
    let produced = producer.run(source).await;

    let consumed = consumer.await.unwrap_or_else(|e| {
        ConsumerOutcome::Failed(PipelineError::Playback {
            index: produced.index(),
            source: ApplicationError::Internal(format!("Playback worker failed: {e}")),
        })
    });

    resolve(pipeline, produced, consumed)
}

fn resolve(
    pipeline: &SpeechPipeline,
    produced: ProducerOutcome,
    consumed: ConsumerOutcome,
) -> PipelineResult {
    match (produced, consumed) {
        (ProducerOutcome::Failed(error), _) | (_, ConsumerOutcome::Failed(error)) => Err(error),
        (ProducerOutcome::Interrupted(index), _) | (_, ConsumerOutcome::Interrupted(index)) => {
            Err(PipelineError::Cancelled { index })
        },
        (ProducerOutcome::Finished { chunks }, ConsumerOutcome::Finished(played)) => {
            Ok(PipelineReport {
                chunks_played: chunks,
                blocks_played: played.blocks,
                frames_played: played.frames,
                spec: played.spec,
                ..PipelineReport::empty(pipeline.config.mode)
            })
        },
    }
}

#[derive(Debug)]
enum ProducerOutcome {
    /// Every chunk was enqueued
    Finished { chunks: u64 },
    /// Stopped by a cancellation request or a closed queue
    Interrupted(SequenceIndex),
    /// A stage failed
    Failed(PipelineError),
}

impl ProducerOutcome {
    fn index(&self) -> SequenceIndex {
        match self {
            Self::Finished { chunks } => SequenceIndex::new(*chunks),
            Self::Interrupted(index) => *index,
            Self::Failed(error) => error.index(),
        }
    }
}

/// Why the producer stopped early
enum Halt {
    Interrupted(SequenceIndex),
    Failed(PipelineError),
}

impl From<PipelineError> for Halt {
    fn from(error: PipelineError) -> Self {
        Self::Failed(error)
    }
}

struct Producer<'a> {
    pipeline: &'a SpeechPipeline,
    chunker: Chunker,
    tx: BlockSender,
    abort: CancellationFlag,
    stop: CancellationFlag,
    chunks: u64,
}

impl Producer<'_> {
    async fn run(mut self, source: &mut dyn TokenSource) -> ProducerOutcome {
        match self.produce(source).await {
            Ok(()) => {
                debug!(chunks = self.chunks, "Producer finished, closing queue");
                ProducerOutcome::Finished {
                    chunks: self.chunks,
                }
            },
            Err(Halt::Interrupted(index)) => {
                debug!(index = %index, "Producer interrupted");
                ProducerOutcome::Interrupted(index)
            },
            Err(Halt::Failed(error)) => {
                debug!(error = %error, "Producer failed, closing queue");
                ProducerOutcome::Failed(error)
            },
        }
    }

    async fn produce(&mut self, source: &mut dyn TokenSource) -> Result<(), Halt> {
        loop {
            let index = self.chunker.next_index();
            let next = self
                .guarded(source.next_fragment())
                .await
                .ok_or(Halt::Interrupted(index))?;
            let fragment = next.map_err(|source| PipelineError::UpstreamStream { index, source })?;

            match fragment {
                Some(fragment) => {
                    if let Some(chunk) = self.chunker.push(&fragment) {
                        self.enqueue(chunk).await?;
                    }
                },
                None => break,
            }
        }

        if let Some(chunk) = self.chunker.flush() {
            self.enqueue(chunk).await?;
        }
        Ok(())
    }

    /// Synthesize and decode one chunk, then hand its blocks over in order
    async fn enqueue(&mut self, chunk: Chunk) -> Result<(), Halt> {
        let index = chunk.index();
        let interrupted = || Halt::Interrupted(index);

        let unit = self
            .guarded(stages::synthesize(self.pipeline.synthesizer.as_ref(), &chunk))
            .await
            .ok_or_else(interrupted)??;

        let pcm = self
            .guarded(stages::decode(Arc::clone(&self.pipeline.decoder), unit))
            .await
            .ok_or_else(interrupted)??;

        let frames = pcm.frames();
        for block in pcm.blocks(self.pipeline.config.block_frames) {
            let block = block.map_err(|e| PipelineError::Decode {
                index,
                source: e.into(),
            })?;
            self.guarded(self.tx.send(block))
                .await
                .ok_or_else(interrupted)?
                .map_err(|_| interrupted())?;
        }

        self.chunks += 1;
        debug!(index = %index, frames, "Chunk enqueued");
        Ok(())
    }

    /// Run `future` unless the run is stopped or aborted first
    async fn guarded<F: Future>(&self, future: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            () = self.stop.cancelled() => None,
            () = self.abort.cancelled() => None,
            output = future => Some(output),
        }
    }
}

#[derive(Debug)]
struct Played {
    blocks: u64,
    frames: u64,
    spec: Option<AudioSpec>,
}

#[derive(Debug)]
enum ConsumerOutcome {
    Finished(Played),
    Interrupted(SequenceIndex),
    Failed(PipelineError),
}

struct Consumer {
    slot: SinkSlot,
    rx: BlockReceiver,
    abort: CancellationFlag,
    stop: CancellationFlag,
}

impl Consumer {
    fn run(mut self) -> ConsumerOutcome {
        let mut last = SequenceIndex::FIRST;

        while let Some(block) = self.rx.blocking_recv() {
            last = block.index();

            if self.stop.is_cancelled() {
                let discarded = self.rx.close_and_discard();
                debug!(index = %last, discarded, "Consumer stopped");
                return ConsumerOutcome::Interrupted(last);
            }

            if let Err(source) = self.slot.write(&block) {
                self.abort.cancel();
                let discarded = self.rx.close_and_discard();
                warn!(index = %last, discarded, error = %source, "Playback failed, discarding queued audio");
                return ConsumerOutcome::Failed(PipelineError::Playback {
                    index: last,
                    source,
                });
            }
        }

        if self.stop.is_cancelled() {
            return ConsumerOutcome::Interrupted(last);
        }

        if let Err(source) = self.slot.drain() {
            self.abort.cancel();
            return ConsumerOutcome::Failed(PipelineError::Playback {
                index: last,
                source,
            });
        }

        ConsumerOutcome::Finished(Played {
            blocks: self.slot.blocks_played(),
            frames: self.slot.frames_played(),
            spec: self.slot.spec(),
        })
    }
}
