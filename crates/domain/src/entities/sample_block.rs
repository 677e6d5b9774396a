//! Sample block entity - decoded audio ready for a playback sink

use std::time::Duration;

use crate::errors::DomainError;
use crate::value_objects::{AudioSpec, SequenceIndex};

/// A slice of decoded, interleaved `f32` samples
///
/// Every block holds a whole number of frames in the layout described by its
/// [`AudioSpec`], and remembers which audio unit it was cut from.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBlock {
    index: SequenceIndex,
    spec: AudioSpec,
    samples: Vec<f32>,
}

impl SampleBlock {
    /// Create a block
    ///
    /// # Errors
    ///
    /// Returns an error if the sample count is not a multiple of the
    /// channel count.
    pub fn new(
        index: SequenceIndex,
        spec: AudioSpec,
        samples: Vec<f32>,
    ) -> Result<Self, DomainError> {
        if samples.len() % usize::from(spec.channels()) != 0 {
            return Err(DomainError::InvalidAudioLayout(format!(
                "{} samples do not divide into {} channels",
                samples.len(),
                spec.channels()
            )));
        }
        Ok(Self {
            index,
            spec,
            samples,
        })
    }

    /// Index of the audio unit this block came from
    pub const fn index(&self) -> SequenceIndex {
        self.index
    }

    /// Layout of the samples
    pub const fn spec(&self) -> AudioSpec {
        self.spec
    }

    /// Interleaved samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.spec.channels())
    }

    /// Playback duration of this block
    pub fn duration(&self) -> Duration {
        self.spec.duration_of(self.frames())
    }

    /// Consume and return the samples
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo() -> AudioSpec {
        AudioSpec::new(8_000, 2).unwrap()
    }

    #[test]
    fn rejects_ragged_frames() {
        let result = SampleBlock::new(SequenceIndex::FIRST, stereo(), vec![0.0; 3]);
        assert!(result.is_err());
    }

    #[test]
    fn counts_frames_and_duration() {
        let block = SampleBlock::new(SequenceIndex::FIRST, stereo(), vec![0.0; 16_000]).unwrap();
        assert_eq!(block.frames(), 8_000);
        assert_eq!(block.duration(), Duration::from_secs(1));
    }
}
