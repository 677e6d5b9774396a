//! Decoder adapter - Implements AudioDecoder using symphonia via ai_speech

use ai_speech::SymphoniaDecoder;
use application::error::ApplicationError;
use application::ports::{AudioDecoder, DecodedAudio};
use domain::{AudioSpec, AudioUnit};
use tracing::instrument;

use super::speech_synthesis_adapter::SpeechSynthesisAdapter;

/// Adapter decoding synthesized units into interleaved `f32` packets
#[derive(Debug, Clone, Copy, Default)]
pub struct DecoderAdapter {
    decoder: SymphoniaDecoder,
}

impl DecoderAdapter {
    /// Create a new decoder adapter
    pub const fn new() -> Self {
        Self {
            decoder: SymphoniaDecoder::new(),
        }
    }
}

impl AudioDecoder for DecoderAdapter {
    #[instrument(skip(self, unit), fields(index = %unit.index(), bytes = unit.size_bytes()))]
    fn decode(&self, unit: AudioUnit) -> Result<DecodedAudio, ApplicationError> {
        let format = SpeechSynthesisAdapter::domain_to_ai_format(unit.format());
        let stream = self
            .decoder
            .decode(unit.into_data(), format)
            .map_err(SpeechSynthesisAdapter::map_error)?;

        let spec = AudioSpec::new(stream.sample_rate(), stream.channels())?;
        let packets = stream
            .into_packets()
            .map(|packet| packet.map_err(SpeechSynthesisAdapter::map_error));

        Ok(DecodedAudio::new(spec, packets))
    }
}

#[cfg(test)]
mod tests {
    use domain::{AudioFormat, SequenceIndex};

    use super::*;

    fn wav_silence(sample_rate: u32, frames: u32) -> Vec<u8> {
        let data_len = frames * 2;
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVEfmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        out.resize(out.len() + data_len as usize, 0);
        out
    }

    #[test]
    fn decodes_wav_unit() {
        let unit = AudioUnit::new(
            SequenceIndex::FIRST,
            AudioFormat::Wav,
            wav_silence(16_000, 1600),
        );

        let decoded = DecoderAdapter::new().decode(unit).unwrap();
        assert_eq!(decoded.spec(), AudioSpec::new(16_000, 1).unwrap());

        let samples: usize = decoded
            .into_packets()
            .map(|p| p.unwrap().len())
            .sum();
        assert_eq!(samples, 1600);
    }

    #[test]
    fn garbage_unit_is_invalid_audio() {
        let unit = AudioUnit::new(SequenceIndex::FIRST, AudioFormat::Mp3, vec![0x11; 64]);

        let err = DecoderAdapter::new().decode(unit).unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidAudio(_)));
    }
}
