//! Device-free sink that consumes audio at real-time speed

use std::time::Duration;

use tracing::trace;

use crate::error::SpeechError;
use crate::ports::AudioSink;

/// Sink that sleeps for the duration of each write instead of playing it
///
/// A pace factor of `1.0` mimics a real device, `0.0` disables sleeping.
#[derive(Debug, Clone)]
pub struct PacedSink {
    sample_rate: u32,
    channels: u16,
    pace: f32,
    samples_written: u64,
}

impl PacedSink {
    /// Create a sink for the given stream layout
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::Configuration` for a zero rate or channel count
    /// or a negative or non-finite pace factor.
    pub fn new(sample_rate: u32, channels: u16, pace: f32) -> Result<Self, SpeechError> {
        if sample_rate == 0 || channels == 0 {
            return Err(SpeechError::Configuration(format!(
                "invalid stream layout: {sample_rate} Hz, {channels} channels"
            )));
        }
        if !pace.is_finite() || pace < 0.0 {
            return Err(SpeechError::Configuration(format!(
                "pace factor must be a non-negative number, got {pace}"
            )));
        }

        Ok(Self {
            sample_rate,
            channels,
            pace,
            samples_written: 0,
        })
    }

    /// Total interleaved samples accepted so far
    #[must_use]
    pub const fn samples_written(&self) -> u64 {
        self.samples_written
    }

    fn duration_of(&self, samples: usize) -> Duration {
        let frames = samples as f64 / f64::from(self.channels);
        Duration::from_secs_f64(frames / f64::from(self.sample_rate) * f64::from(self.pace))
    }
}

impl AudioSink for PacedSink {
    fn write(&mut self, samples: &[f32]) -> Result<(), SpeechError> {
        self.samples_written += samples.len() as u64;
        if self.pace > 0.0 {
            let pause = self.duration_of(samples.len());
            trace!(?pause, samples = samples.len(), "Pacing write");
            std::thread::sleep(pause);
        }
        Ok(())
    }

    fn drain(&mut self) -> Result<(), SpeechError> {
        Ok(())
    }
}
