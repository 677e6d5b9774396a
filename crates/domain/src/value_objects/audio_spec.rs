//! Audio stream layout value object

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Sample rate and channel count of a decoded audio stream
///
/// A playback sink is configured with exactly one `AudioSpec` per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioSpec {
    sample_rate: u32,
    channels: u16,
}

impl AudioSpec {
    /// Create an audio spec
    ///
    /// # Errors
    ///
    /// Returns an error if the sample rate or channel count is zero.
    pub fn new(sample_rate: u32, channels: u16) -> Result<Self, DomainError> {
        if sample_rate == 0 {
            return Err(DomainError::InvalidAudioLayout(
                "sample rate must be greater than 0".to_string(),
            ));
        }
        if channels == 0 {
            return Err(DomainError::InvalidAudioLayout(
                "channel count must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Samples per second per channel
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels
    pub const fn channels(&self) -> u16 {
        self.channels
    }

    /// Playback duration of `frames` frames
    pub fn duration_of(&self, frames: usize) -> Duration {
        Duration::from_secs_f64(frames as f64 / f64::from(self.sample_rate))
    }
}

impl fmt::Display for AudioSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz x{}", self.sample_rate, self.channels)
    }
}
