//! Decoder port - Interface for audio codecs

use std::fmt;

use domain::{AudioSpec, AudioUnit};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Lazy, consume-once sequence of interleaved `f32` sample packets
pub type PcmPackets = Box<dyn Iterator<Item = Result<Vec<f32>, ApplicationError>> + Send>;

/// Decoder output: the stream layout plus its packets
pub struct DecodedAudio {
    spec: AudioSpec,
    packets: PcmPackets,
}

impl DecodedAudio {
    /// Wrap a packet iterator
    pub fn new<I>(spec: AudioSpec, packets: I) -> Self
    where
        I: Iterator<Item = Result<Vec<f32>, ApplicationError>> + Send + 'static,
    {
        Self {
            spec,
            packets: Box::new(packets),
        }
    }

    /// Sample rate and channel count of the stream
    pub const fn spec(&self) -> AudioSpec {
        self.spec
    }

    /// Take the packet iterator
    pub fn into_packets(self) -> PcmPackets {
        self.packets
    }
}

impl fmt::Debug for DecodedAudio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedAudio")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

/// Port for turning an encoded audio unit into raw samples
///
/// Decoding is CPU-bound and synchronous; the pipeline runs it on the
/// blocking thread pool.
#[cfg_attr(test, automock)]
pub trait AudioDecoder: Send + Sync {
    /// Start decoding `unit`
    ///
    /// Errors for malformed input may be returned here or from the packet
    /// iterator, whichever the codec detects first.
    fn decode(&self, unit: AudioUnit) -> Result<DecodedAudio, ApplicationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoded_audio_yields_packets_once() {
        let spec = AudioSpec::new(16_000, 1).unwrap();
        let decoded = DecodedAudio::new(spec, vec![Ok(vec![0.5, -0.5])].into_iter());

        assert_eq!(decoded.spec(), spec);
        let packets: Vec<_> = decoded.into_packets().collect();
        assert_eq!(packets.len(), 1);
    }

    #[test]
    fn decoded_audio_debug_hides_packets() {
        let spec = AudioSpec::new(16_000, 1).unwrap();
        let decoded = DecodedAudio::new(spec, std::iter::empty());
        assert!(format!("{decoded:?}").contains("DecodedAudio"));
    }
}
