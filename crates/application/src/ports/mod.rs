//! Port definitions for application layer
//!
//! Ports are interfaces that define how the speech pipeline interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod decoder_port;
mod playback_port;
mod synthesis_port;
mod token_source_port;

#[cfg(test)]
pub use decoder_port::MockAudioDecoder;
pub use decoder_port::{AudioDecoder, DecodedAudio, PcmPackets};
#[cfg(test)]
pub use playback_port::MockPlaybackDevice;
pub use playback_port::{PlaybackDevice, PlaybackSink};
#[cfg(test)]
pub use synthesis_port::MockSpeechSynthesizer;
pub use synthesis_port::SpeechSynthesizer;
#[cfg(test)]
pub use token_source_port::MockTokenSource;
pub use token_source_port::TokenSource;
