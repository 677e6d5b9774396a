//! Speech synthesis adapter - Implements SpeechSynthesizer using ai_speech crate

use std::sync::Arc;

use ai_speech::{
    AudioFormat as AiAudioFormat, OpenAITtsProvider, SpeechConfig, SpeechError, TextToSpeech,
};
use application::error::ApplicationError;
use application::ports::SpeechSynthesizer;
use async_trait::async_trait;
use domain::{AudioFormat, AudioUnit, Chunk};
use tracing::{debug, instrument};

/// Adapter for text-to-speech services using ai_speech crate
pub struct SpeechSynthesisAdapter {
    provider: Arc<dyn TextToSpeech>,
    voice: Option<String>,
}

impl std::fmt::Debug for SpeechSynthesisAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechSynthesisAdapter")
            .field("format", &self.provider.output_format())
            .field("voice", &self.voice)
            .finish()
    }
}

impl SpeechSynthesisAdapter {
    /// Create an adapter backed by the OpenAI TTS endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails to initialize.
    pub fn new(config: SpeechConfig) -> Result<Self, ApplicationError> {
        let provider = OpenAITtsProvider::new(config).map_err(Self::map_error)?;
        Ok(Self::with_provider(Arc::new(provider)))
    }

    /// Create an adapter around any TTS provider
    pub fn with_provider(provider: Arc<dyn TextToSpeech>) -> Self {
        Self {
            provider,
            voice: None,
        }
    }

    /// Override the provider's default voice
    #[must_use]
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    /// Convert ai_speech AudioFormat to domain AudioFormat
    pub(crate) const fn ai_to_domain_format(format: AiAudioFormat) -> AudioFormat {
        match format {
            AiAudioFormat::Mp3 => AudioFormat::Mp3,
            AiAudioFormat::Opus => AudioFormat::Opus,
            AiAudioFormat::Aac => AudioFormat::Aac,
            AiAudioFormat::Flac => AudioFormat::Flac,
            AiAudioFormat::Wav => AudioFormat::Wav,
        }
    }

    /// Convert domain AudioFormat to ai_speech AudioFormat
    pub(crate) const fn domain_to_ai_format(format: AudioFormat) -> AiAudioFormat {
        match format {
            AudioFormat::Mp3 => AiAudioFormat::Mp3,
            AudioFormat::Opus => AiAudioFormat::Opus,
            AudioFormat::Aac => AiAudioFormat::Aac,
            AudioFormat::Flac => AiAudioFormat::Flac,
            AudioFormat::Wav => AiAudioFormat::Wav,
        }
    }

    /// Map speech error to application error
    pub(crate) fn map_error(err: SpeechError) -> ApplicationError {
        match err {
            SpeechError::Configuration(e) => ApplicationError::Configuration(e),
            SpeechError::ConnectionFailed(e) | SpeechError::RequestFailed(e) => {
                ApplicationError::ExternalService(e)
            },
            SpeechError::InvalidAudio(e) => ApplicationError::InvalidAudio(e),
            SpeechError::SynthesisFailed(e) => {
                ApplicationError::ExternalService(format!("Synthesis failed: {e}"))
            },
            SpeechError::InvalidResponse(e) => {
                ApplicationError::Internal(format!("Invalid response: {e}"))
            },
            SpeechError::Timeout(ms) => {
                ApplicationError::ExternalService(format!("Speech service timeout after {ms}ms"))
            },
            SpeechError::RateLimited => ApplicationError::RateLimited,
            SpeechError::Unauthorized(e) => ApplicationError::NotAuthorized(e),
            SpeechError::VoiceNotFound(v) => {
                ApplicationError::Configuration(format!("Voice not found: {v}"))
            },
            SpeechError::ModelNotAvailable(m) => {
                ApplicationError::Configuration(format!("Model not available: {m}"))
            },
            SpeechError::Device(e) => ApplicationError::Device(e),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for SpeechSynthesisAdapter {
    #[instrument(skip(self, chunk), fields(index = %chunk.index(), text_len = chunk.len()))]
    async fn synthesize(&self, chunk: &Chunk) -> Result<AudioUnit, ApplicationError> {
        let audio = self
            .provider
            .synthesize(chunk.text(), self.voice.as_deref())
            .await
            .map_err(Self::map_error)?;

        debug!(bytes = audio.size_bytes(), "Chunk synthesized");

        let format = Self::ai_to_domain_format(audio.format());
        Ok(AudioUnit::new(chunk.index(), format, audio.into_data()))
    }
}

#[cfg(test)]
mod tests {
    use ai_speech::AudioData;
    use domain::SequenceIndex;
    use parking_lot::Mutex;

    use super::*;

    #[derive(Default)]
    struct EchoTts {
        requests: Mutex<Vec<(String, Option<String>)>>,
        fail: Option<fn() -> SpeechError>,
    }

    #[async_trait]
    impl TextToSpeech for EchoTts {
        async fn synthesize(
            &self,
            text: &str,
            voice: Option<&str>,
        ) -> Result<AudioData, SpeechError> {
            self.requests
                .lock()
                .push((text.to_string(), voice.map(str::to_string)));
            if let Some(fail) = self.fail {
                return Err(fail());
            }
            Ok(AudioData::new(text.as_bytes().to_vec(), AiAudioFormat::Flac))
        }

        fn output_format(&self) -> AiAudioFormat {
            AiAudioFormat::Flac
        }
    }

    #[tokio::test]
    async fn tags_unit_with_chunk_index_and_format() {
        let tts = Arc::new(EchoTts::default());
        let adapter = SpeechSynthesisAdapter::with_provider(tts.clone()).with_voice("nova");
        let chunk = Chunk::new(SequenceIndex::new(3), "Hello").unwrap();

        let unit = adapter.synthesize(&chunk).await.unwrap();

        assert_eq!(unit.index(), SequenceIndex::new(3));
        assert_eq!(unit.format(), AudioFormat::Flac);
        assert_eq!(unit.data(), b"Hello");
        assert_eq!(
            *tts.requests.lock(),
            vec![("Hello".to_string(), Some("nova".to_string()))]
        );
    }

    #[tokio::test]
    async fn provider_errors_are_mapped() {
        let tts = Arc::new(EchoTts {
            fail: Some(|| SpeechError::RateLimited),
            ..Default::default()
        });
        let adapter = SpeechSynthesisAdapter::with_provider(tts);
        let chunk = Chunk::new(SequenceIndex::FIRST, "Hi").unwrap();

        let err = adapter.synthesize(&chunk).await.unwrap_err();
        assert!(matches!(err, ApplicationError::RateLimited));
    }

    #[test]
    fn new_rejects_invalid_config() {
        let result = SpeechSynthesisAdapter::new(SpeechConfig::default());
        assert!(matches!(result, Err(ApplicationError::Configuration(_))));
    }

    #[test]
    fn format_mapping_round_trips() {
        for format in [
            AudioFormat::Mp3,
            AudioFormat::Wav,
            AudioFormat::Flac,
            AudioFormat::Opus,
            AudioFormat::Aac,
        ] {
            let ai = SpeechSynthesisAdapter::domain_to_ai_format(format);
            assert_eq!(SpeechSynthesisAdapter::ai_to_domain_format(ai), format);
        }
    }

    #[test]
    fn map_error_timeout() {
        let err = SpeechSynthesisAdapter::map_error(SpeechError::Timeout(30000));
        let ApplicationError::ExternalService(msg) = err else {
            unreachable!("Expected ExternalService error");
        };
        assert!(msg.contains("30000"));
    }

    #[test]
    fn map_error_unauthorized() {
        let err = SpeechSynthesisAdapter::map_error(SpeechError::Unauthorized("no".to_string()));
        assert!(matches!(err, ApplicationError::NotAuthorized(_)));
    }

    #[test]
    fn map_error_device() {
        let err = SpeechSynthesisAdapter::map_error(SpeechError::Device("gone".to_string()));
        assert!(matches!(err, ApplicationError::Device(_)));
    }

    #[test]
    fn map_error_voice_not_found() {
        let err = SpeechSynthesisAdapter::map_error(SpeechError::VoiceNotFound("x".to_string()));
        assert!(matches!(err, ApplicationError::Configuration(msg) if msg.contains("Voice")));
    }
}
