//! OpenAI text-to-speech provider
//!
//! Implements `TextToSpeech` against the `/audio/speech` endpoint.
//!
//! Supported response formats: mp3, opus, aac, flac, wav.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::SpeechConfig;
use crate::error::SpeechError;
use crate::ports::TextToSpeech;
use crate::types::{AudioData, AudioFormat};

/// Maximum input length accepted by the endpoint, in bytes
pub const MAX_INPUT_BYTES: usize = 4096;

/// OpenAI TTS provider
#[derive(Debug, Clone)]
pub struct OpenAITtsProvider {
    client: Client,
    config: SpeechConfig,
}

impl OpenAITtsProvider {
    /// Create a new OpenAI TTS provider
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::Configuration` if the configuration is invalid.
    pub fn new(config: SpeechConfig) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Configuration)?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| {
                SpeechError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    /// Get the API key
    fn api_key(&self) -> &str {
        self.config.openai_api_key.as_deref().unwrap_or_default()
    }

    /// Build the TTS endpoint URL
    fn tts_url(&self) -> String {
        format!(
            "{}/audio/speech",
            self.config.openai_base_url.trim_end_matches('/')
        )
    }

    /// Speed is omitted from the request when it is the service default
    fn speed(&self) -> Option<f32> {
        if (self.config.speed - 1.0).abs() < f32::EPSILON {
            None
        } else {
            Some(self.config.speed)
        }
    }

    fn map_error(&self, status: StatusCode, body: &str, voice: &str) -> SpeechError {
        if let Ok(api_error) = serde_json::from_str::<ApiError>(body) {
            return match api_error.error.code.as_deref() {
                Some("rate_limit_exceeded") => SpeechError::RateLimited,
                Some("model_not_found") => {
                    SpeechError::ModelNotAvailable(self.config.tts_model.clone())
                },
                Some("invalid_voice") => SpeechError::VoiceNotFound(voice.to_string()),
                Some("invalid_api_key") => SpeechError::Unauthorized(api_error.error.message),
                _ if status == StatusCode::TOO_MANY_REQUESTS => SpeechError::RateLimited,
                _ if status == StatusCode::UNAUTHORIZED => {
                    SpeechError::Unauthorized(api_error.error.message)
                },
                _ => SpeechError::SynthesisFailed(api_error.error.message),
            };
        }

        match status {
            StatusCode::TOO_MANY_REQUESTS => SpeechError::RateLimited,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                SpeechError::Unauthorized(format!("HTTP {status}"))
            },
            _ => SpeechError::SynthesisFailed(format!("HTTP {status}: {body}")),
        }
    }
}

/// OpenAI TTS request body
#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    speed: Option<f32>,
}

/// OpenAI API error response
#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    code: Option<String>,
}

#[async_trait]
impl TextToSpeech for OpenAITtsProvider {
    #[instrument(skip(self, text), fields(text_len = text.len(), format = %self.config.output_format))]
    async fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<AudioData, SpeechError> {
        if text.is_empty() {
            return Err(SpeechError::SynthesisFailed(
                "Text cannot be empty".to_string(),
            ));
        }

        if text.len() > MAX_INPUT_BYTES {
            return Err(SpeechError::SynthesisFailed(format!(
                "Text too long: {} bytes exceeds {MAX_INPUT_BYTES} limit",
                text.len()
            )));
        }

        let voice = voice.unwrap_or(&self.config.default_voice);
        let format = self.config.output_format;

        let request = TtsRequest {
            model: &self.config.tts_model,
            input: text,
            voice,
            response_format: format.response_format(),
            speed: self.speed(),
        };

        let response = self
            .client
            .post(self.tts_url())
            .bearer_auth(self.api_key())
            .json(&request)
            .send()
            .await
            .map_err(|e| SpeechError::from_reqwest(&e, self.config.timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let err = self.map_error(status, &error_body, voice);
            warn!(%status, error = %err, "TTS request rejected");
            return Err(err);
        }

        let audio_bytes: Bytes = response
            .bytes()
            .await
            .map_err(|e| SpeechError::InvalidResponse(format!("Failed to read audio: {e}")))?;

        if audio_bytes.is_empty() {
            return Err(SpeechError::InvalidResponse(
                "Empty audio body".to_string(),
            ));
        }

        debug!(audio_size = audio_bytes.len(), "Speech synthesis complete");

        Ok(AudioData::new(audio_bytes.to_vec(), format))
    }

    fn output_format(&self) -> AudioFormat {
        self.config.output_format
    }
}
