//! Port definitions for speech processing
//!
//! Defines the traits (ports) that speech adapters must implement.

use async_trait::async_trait;

use crate::error::SpeechError;
use crate::types::{AudioData, AudioFormat};

/// Port for Text-to-Speech (TTS) implementations
///
/// # Example
///
/// ```ignore
/// use ai_speech::TextToSpeech;
///
/// async fn speak(tts: &impl TextToSpeech, text: &str) -> Result<Vec<u8>, SpeechError> {
///     let audio = tts.synthesize(text, None).await?;
///     Ok(audio.into_data())
/// }
/// ```
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Convert text to speech
    ///
    /// `voice` overrides the configured default voice.
    ///
    /// # Errors
    ///
    /// Returns `SpeechError` if synthesis fails.
    async fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<AudioData, SpeechError>;

    /// Format of the audio returned by [`synthesize`](Self::synthesize)
    fn output_format(&self) -> AudioFormat;
}

/// Port for audio outputs that consume interleaved `f32` samples
///
/// Writes may block while the output is busy; a sink is used by one
/// thread at a time.
pub trait AudioSink: Send {
    /// Queue interleaved samples for playback
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::Device` if the output failed.
    fn write(&mut self, samples: &[f32]) -> Result<(), SpeechError>;

    /// Block until everything written has been played
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::Device` if the output failed.
    fn drain(&mut self) -> Result<(), SpeechError>;
}
