//! Playback adapter - Implements PlaybackDevice with ai_speech sinks

use std::fmt;

use ai_speech::{AudioSink, PacedSink, SpeechError};
use application::error::ApplicationError;
use application::ports::{PlaybackDevice, PlaybackSink};
use domain::{AudioSpec, SampleBlock};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Kind of audio output the pipeline plays into
///
/// Defaults to the output device in builds with the `device` feature and to
/// the paced sink otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Consume audio at real-time speed without a device
    #[cfg_attr(not(feature = "device"), default)]
    Paced,
    /// The system's default output device
    #[cfg_attr(feature = "device", default)]
    Device,
}

impl SinkKind {
    /// Whether audio written to this sink is audible
    pub const fn is_audible(self) -> bool {
        matches!(self, Self::Device)
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Paced => write!(f, "paced"),
            Self::Device => write!(f, "device"),
        }
    }
}

impl std::str::FromStr for SinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "paced" | "null" => Ok(Self::Paced),
            "device" | "speaker" => Ok(Self::Device),
            _ => Err(format!("Invalid sink: {s}. Use 'paced' or 'device'")),
        }
    }
}

/// Adapter opening [`PlaybackSink`]s of the configured kind
#[derive(Debug, Clone, Copy)]
pub struct PlaybackAdapter {
    kind: SinkKind,
    pace: f32,
}

impl PlaybackAdapter {
    /// Create an adapter for `kind`; `pace` only applies to paced sinks
    pub const fn new(kind: SinkKind, pace: f32) -> Self {
        Self { kind, pace }
    }

    /// The configured sink kind
    pub const fn kind(&self) -> SinkKind {
        self.kind
    }

    fn map_error(err: SpeechError) -> ApplicationError {
        match err {
            SpeechError::Configuration(e) => ApplicationError::Configuration(e),
            other => ApplicationError::Device(other.to_string()),
        }
    }

    #[cfg(feature = "device")]
    fn open_device(spec: AudioSpec) -> Result<Box<dyn AudioSink>, ApplicationError> {
        let sink = ai_speech::CpalSink::open(spec.sample_rate(), spec.channels())
            .map_err(Self::map_error)?;
        Ok(Box::new(sink))
    }

    #[cfg(not(feature = "device"))]
    fn open_device(_spec: AudioSpec) -> Result<Box<dyn AudioSink>, ApplicationError> {
        Err(ApplicationError::Configuration(
            "built without audio device support (enable the `device` feature)".to_string(),
        ))
    }
}

impl PlaybackDevice for PlaybackAdapter {
    #[instrument(skip(self), fields(kind = %self.kind))]
    fn open(&self, spec: AudioSpec) -> Result<Box<dyn PlaybackSink>, ApplicationError> {
        let inner: Box<dyn AudioSink> = match self.kind {
            SinkKind::Paced => Box::new(
                PacedSink::new(spec.sample_rate(), spec.channels(), self.pace)
                    .map_err(Self::map_error)?,
            ),
            SinkKind::Device => Self::open_device(spec)?,
        };

        debug!(
            sample_rate = spec.sample_rate(),
            channels = spec.channels(),
            "Playback sink opened"
        );

        Ok(Box::new(SinkAdapter { inner, spec }))
    }
}

/// Bridges an [`AudioSink`] to the [`PlaybackSink`] port
struct SinkAdapter {
    inner: Box<dyn AudioSink>,
    spec: AudioSpec,
}

impl PlaybackSink for SinkAdapter {
    fn write(&mut self, block: &SampleBlock) -> Result<(), ApplicationError> {
        if block.spec() != self.spec {
            return Err(ApplicationError::Device(format!(
                "sink opened for {:?} cannot play block {} in {:?}",
                self.spec,
                block.index(),
                block.spec()
            )));
        }
        self.inner
            .write(block.samples())
            .map_err(PlaybackAdapter::map_error)
    }

    fn drain(&mut self) -> Result<(), ApplicationError> {
        self.inner.drain().map_err(PlaybackAdapter::map_error)
    }
}
