//! Fully decoded audio of one chunk, cut into sample blocks on demand

use domain::{AudioSpec, DomainError, SampleBlock, SequenceIndex};

use crate::error::ApplicationError;
use crate::ports::DecodedAudio;

/// Interleaved samples of one completely decoded audio unit
///
/// Decoding finishes before any block is cut, so a unit that fails to
/// decode never reaches the sink. Blocks are materialized lazily, one per
/// [`Blocks::next`] call.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct DecodedPcm {
    index: SequenceIndex,
    spec: AudioSpec,
    samples: Vec<f32>,
}

impl DecodedPcm {
    /// Drain every packet of `decoded`
    ///
    /// A trailing partial frame is rejected as malformed audio.
    pub(super) fn collect(
        index: SequenceIndex,
        decoded: DecodedAudio,
    ) -> Result<Self, ApplicationError> {
        let spec = decoded.spec();
        let mut samples = Vec::new();
        for packet in decoded.into_packets() {
            samples.extend_from_slice(&packet?);
        }

        let channels = usize::from(spec.channels());
        if samples.len() % channels != 0 {
            return Err(ApplicationError::InvalidAudio(format!(
                "{} samples do not form whole {channels}-channel frames",
                samples.len()
            )));
        }

        Ok(Self {
            index,
            spec,
            samples,
        })
    }

    pub(super) const fn index(&self) -> SequenceIndex {
        self.index
    }

    pub(super) fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.spec.channels())
    }

    /// Cut into blocks of `block_frames` frames; the last may be shorter
    pub(super) fn blocks(self, block_frames: usize) -> Blocks {
        let block_len = block_frames.max(1) * usize::from(self.spec.channels());
        Blocks {
            pcm: self,
            block_len,
            position: 0,
        }
    }
}

/// Lazy iterator over the sample blocks of a [`DecodedPcm`]
#[derive(Debug)]
pub(super) struct Blocks {
    pcm: DecodedPcm,
    block_len: usize,
    position: usize,
}

impl Iterator for Blocks {
    type Item = Result<SampleBlock, DomainError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.pcm.samples.len() {
            return None;
        }
        let end = (self.position + self.block_len).min(self.pcm.samples.len());
        let samples = self.pcm.samples[self.position..end].to_vec();
        self.position = end;
        Some(SampleBlock::new(self.pcm.index, self.pcm.spec, samples))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.pcm.samples.len() - self.position;
        let blocks = remaining.div_ceil(self.block_len);
        (blocks, Some(blocks))
    }
}
