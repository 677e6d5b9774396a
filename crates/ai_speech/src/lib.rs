//! AI Speech - synthesis, decoding and playback of spoken audio
//!
//! Provides the pieces a streaming speech pipeline needs around its core:
//! - `TextToSpeech` - synthesize encoded audio from text
//! - `SymphoniaDecoder` - decode encoded audio into interleaved `f32` packets
//! - `AudioSink` - play interleaved samples (`PacedSink`, or `CpalSink`
//!   with the `device` feature)
//!
//! # Architecture
//!
//! This crate follows the ports & adapters pattern:
//! - `ports` module defines the traits (ports)
//! - `providers` and `playback` contain concrete implementations (adapters)
//!
//! # Example
//!
//! ```ignore
//! use ai_speech::{AudioSink, OpenAITtsProvider, PacedSink, SymphoniaDecoder, TextToSpeech};
//!
//! let provider = OpenAITtsProvider::new(config)?;
//! let audio = provider.synthesize("Hello, world!", None).await?;
//!
//! let stream = SymphoniaDecoder::new().decode(audio.into_data(), provider.output_format())?;
//! let mut sink = PacedSink::new(stream.sample_rate(), stream.channels(), 1.0)?;
//! for packet in stream.into_packets() {
//!     sink.write(&packet?)?;
//! }
//! sink.drain()?;
//! ```

pub mod config;
pub mod decoder;
pub mod error;
pub mod playback;
pub mod ports;
pub mod providers;
pub mod types;

pub use config::SpeechConfig;
pub use decoder::{DecodedPackets, DecodedStream, SymphoniaDecoder};
pub use error::SpeechError;
#[cfg(feature = "device")]
pub use playback::CpalSink;
pub use playback::PacedSink;
pub use ports::{AudioSink, TextToSpeech};
pub use providers::OpenAITtsProvider;
pub use types::{AudioData, AudioFormat};
