//! Speech pipeline service - streams text into continuously played audio
//!
//! Fragments from a [`TokenSource`] are grouped into chunks, each chunk is
//! synthesized, decoded and written to a playback sink. Play order always
//! equals text order. Two shapes are available:
//!
//! - [`PipelineMode::Sequential`]: every chunk goes through synthesis,
//!   decode and playback before the next fragment is pulled.
//! - [`PipelineMode::Pipelined`]: a producer (synthesis + decode) and a
//!   consumer (playback) run concurrently, joined by a bounded FIFO queue,
//!   so network and decode latency overlap with device playback.

mod cancellation;
mod handoff;
mod pcm;
mod pipelined;
mod sequential;
mod sink_slot;
mod stages;

use std::{fmt, str::FromStr, sync::Arc, time::Instant};

use domain::{AudioSpec, ChunkThreshold};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

pub use cancellation::CancellationFlag;
pub use handoff::{BlockReceiver, BlockSender, HandoffClosed, handoff_queue};

use crate::error::{ApplicationError, PipelineError};
use crate::ports::{AudioDecoder, PlaybackDevice, SpeechSynthesizer, TokenSource};

/// Concurrency shape of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PipelineMode {
    /// One control flow, one chunk at a time
    Sequential,
    /// Producer/consumer over a bounded hand-off queue
    #[default]
    Pipelined,
}

impl fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Pipelined => write!(f, "pipelined"),
        }
    }
}

impl FromStr for PipelineMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequential" | "seq" => Ok(Self::Sequential),
            "pipelined" | "pipe" => Ok(Self::Pipelined),
            _ => Err(format!(
                "Invalid pipeline mode: {s}. Use 'sequential' or 'pipelined'"
            )),
        }
    }
}

/// Configuration for the speech pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Concurrency shape
    #[serde(default)]
    pub mode: PipelineMode,

    /// Accumulated text length (UTF-8 code units) that seals a chunk
    #[serde(default)]
    pub chunk_threshold: ChunkThreshold,

    /// Hand-off queue capacity in sample blocks (pipelined mode)
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Frames per sample block
    #[serde(default = "default_block_frames")]
    pub block_frames: usize,
}

// 64 blocks of 1024 frames hold about 2.7 s of 24 kHz audio
const fn default_queue_capacity() -> usize {
    64
}

const fn default_block_frames() -> usize {
    1024
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: PipelineMode::default(),
            chunk_threshold: ChunkThreshold::default(),
            queue_capacity: default_queue_capacity(),
            block_frames: default_block_frames(),
        }
    }
}

impl PipelineConfig {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the queue capacity or block size is zero.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        if self.queue_capacity == 0 {
            return Err(ApplicationError::Configuration(
                "Queue capacity must be greater than 0".to_string(),
            ));
        }
        if self.block_frames == 0 {
            return Err(ApplicationError::Configuration(
                "Block frames must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Observable state of a sequential run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Idle,
    Streaming,
    Synthesizing,
    Decoding,
    Playing,
    Draining,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Streaming => "streaming",
            Self::Synthesizing => "synthesizing",
            Self::Decoding => "decoding",
            Self::Playing => "playing",
            Self::Draining => "draining",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Summary of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// Mode the run used
    pub mode: PipelineMode,
    /// Chunks synthesized, decoded and fully played
    pub chunks_played: u64,
    /// Sample blocks written to the sink
    pub blocks_played: u64,
    /// Frames written to the sink
    pub frames_played: u64,
    /// Layout the sink was opened with (`None` if nothing was played)
    pub spec: Option<AudioSpec>,
}

impl PipelineReport {
    fn empty(mode: PipelineMode) -> Self {
        Self {
            mode,
            chunks_played: 0,
            blocks_played: 0,
            frames_played: 0,
            spec: None,
        }
    }
}

/// Terminal outcome of one run
pub type PipelineResult = Result<PipelineReport, PipelineError>;

/// Streams text from a token source to a playback device
pub struct SpeechPipeline {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    decoder: Arc<dyn AudioDecoder>,
    device: Arc<dyn PlaybackDevice>,
    config: PipelineConfig,
}

impl fmt::Debug for SpeechPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechPipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SpeechPipeline {
    /// Create a pipeline
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` is invalid.
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        decoder: Arc<dyn AudioDecoder>,
        device: Arc<dyn PlaybackDevice>,
        config: PipelineConfig,
    ) -> Result<Self, ApplicationError> {
        config.validate()?;
        Ok(Self {
            synthesizer,
            decoder,
            device,
            config,
        })
    }

    /// The pipeline configuration
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Speak everything `source` yields
    ///
    /// Succeeds only if every chunk was synthesized, decoded and played.
    pub async fn run(&self, source: &mut dyn TokenSource) -> PipelineResult {
        self.run_until_cancelled(source, &CancellationFlag::new())
            .await
    }

    /// Like [`run`](Self::run), stopping early once `stop` is cancelled
    ///
    /// Audio already played stays played; an early stop reports
    /// [`PipelineError::Cancelled`].
    #[instrument(skip_all, fields(
        mode = %self.config.mode,
        threshold = %self.config.chunk_threshold
    ))]
    pub async fn run_until_cancelled(
        &self,
        source: &mut dyn TokenSource,
        stop: &CancellationFlag,
    ) -> PipelineResult {
        let start = Instant::now();

        let result = match self.config.mode {
            PipelineMode::Sequential => sequential::run(self, source, stop).await,
            PipelineMode::Pipelined => pipelined::run(self, source, stop).await,
        };

        match &result {
            Ok(report) => info!(
                chunks = report.chunks_played,
                blocks = report.blocks_played,
                frames = report.frames_played,
                elapsed_ms = start.elapsed().as_millis(),
                "Speech pipeline finished"
            ),
            Err(e) => warn!(
                stage = %e.stage(),
                index = %e.index(),
                error = %e,
                "Speech pipeline failed"
            ),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = PipelineConfig::default();
        assert_eq!(config.mode, PipelineMode::Pipelined);
        assert_eq!(config.chunk_threshold.get(), 128);
        assert_eq!(config.queue_capacity, 64);
        assert_eq!(config.block_frames, 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_fails_with_zero_capacity() {
        let config = PipelineConfig {
            queue_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_fails_with_zero_block_frames() {
        let config = PipelineConfig {
            block_frames: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn pipeline_mode_parses() {
        assert_eq!(
            "sequential".parse::<PipelineMode>().unwrap(),
            PipelineMode::Sequential
        );
        assert_eq!(
            "PIPELINED".parse::<PipelineMode>().unwrap(),
            PipelineMode::Pipelined
        );
        assert!("parallel".parse::<PipelineMode>().is_err());
    }

    #[test]
    fn pipeline_mode_serializes_lowercase() {
        let json = serde_json::to_string(&PipelineMode::Sequential).unwrap();
        assert_eq!(json, "\"sequential\"");
    }

    #[test]
    fn config_deserializes_from_toml() {
        let toml = r#"
            mode = "sequential"
            chunk_threshold = 20
            queue_capacity = 8
        "#;

        let config: PipelineConfig = toml::from_str(toml).unwrap();

        assert_eq!(config.mode, PipelineMode::Sequential);
        assert_eq!(config.chunk_threshold.get(), 20);
        assert_eq!(config.queue_capacity, 8);
        assert_eq!(config.block_frames, 1024);
    }

    #[test]
    fn config_rejects_zero_threshold() {
        let result: Result<PipelineConfig, _> = toml::from_str("chunk_threshold = 0");
        assert!(result.is_err());
    }

    #[test]
    fn state_display() {
        assert_eq!(PipelineState::Synthesizing.to_string(), "synthesizing");
        assert_eq!(PipelineState::Done.to_string(), "done");
    }
}
