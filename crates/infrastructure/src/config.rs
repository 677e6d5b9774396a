//! Application configuration
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML
//! file, then `VOICESTREAM_`-prefixed environment variables using `__`
//! between sections and keys (e.g. `VOICESTREAM_PIPELINE__MODE=sequential`).

use std::path::Path;

use ai_core::InferenceConfig;
use ai_speech::SpeechConfig;
use application::error::ApplicationError;
use application::services::PipelineConfig;
use serde::{Deserialize, Serialize};

use crate::adapters::{PlaybackAdapter, SinkKind};

/// Prefix of environment variables read by [`AppConfig::load`]
pub const ENV_PREFIX: &str = "VOICESTREAM";

/// Environment variable used when no API key is configured
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Chat completion settings
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Text-to-speech settings
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Chunking and scheduling settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Audio output settings
    #[serde(default)]
    pub playback: PlaybackConfig,
}

/// Audio output configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Output kind
    #[serde(default)]
    pub sink: SinkKind,

    /// Real-time factor for the paced sink (0 disables pacing)
    #[serde(default = "default_pace")]
    pub pace: f32,
}

const fn default_pace() -> f32 {
    1.0
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            sink: SinkKind::default(),
            pace: default_pace(),
        }
    }
}

impl PlaybackConfig {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error message if the pace factor is negative or not a
    /// number, or if the device sink is selected in a build without audio
    /// device support.
    pub fn validate(&self) -> Result<(), String> {
        if !self.pace.is_finite() || self.pace < 0.0 {
            return Err(format!(
                "Pace must be a non-negative number, got {}",
                self.pace
            ));
        }
        #[cfg(not(feature = "device"))]
        if self.sink == SinkKind::Device {
            return Err(
                "Sink 'device' needs a build with the `device` feature; use 'paced'".to_string(),
            );
        }
        Ok(())
    }

    /// Build the playback device described by this configuration
    pub const fn device(&self) -> PlaybackAdapter {
        PlaybackAdapter::new(self.sink, self.pace)
    }
}

impl AppConfig {
    /// Load configuration from an optional file and the environment
    ///
    /// Without `path`, `config.toml` in the working directory is used when
    /// present. An explicit `path` must exist. Missing API keys are taken
    /// from `OPENAI_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or a value has the wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let env = config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true);

        let mut config = match path {
            Some(path) => Self::build(config::File::from(path).required(true), env)?,
            None => Self::build(config::File::with_name("config").required(false), env)?,
        };

        config.fill_api_keys(std::env::var(OPENAI_API_KEY_VAR).ok().as_deref());
        Ok(config)
    }

    fn build<S>(file: S, env: config::Environment) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        config::Config::builder()
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()
    }

    /// Use `key` wherever no API key is configured
    pub fn fill_api_keys(&mut self, key: Option<&str>) {
        let Some(key) = key.filter(|k| !k.is_empty()) else {
            return;
        };
        if self.inference.api_key.as_deref().is_none_or(str::is_empty) {
            self.inference.api_key = Some(key.to_string());
        }
        if self.speech.openai_api_key.as_deref().is_none_or(str::is_empty) {
            self.speech.openai_api_key = Some(key.to_string());
        }
    }

    /// Validate every section, reporting all problems at once
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Configuration` listing each invalid section.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        let mut problems = Vec::new();

        if let Err(e) = self.inference.validate() {
            problems.push(format!("inference: {e}"));
        }
        if let Err(e) = self.speech.validate() {
            problems.push(format!("speech: {e}"));
        }
        if let Err(e) = self.pipeline.validate() {
            problems.push(format!("pipeline: {e}"));
        }
        if let Err(e) = self.playback.validate() {
            problems.push(format!("playback: {e}"));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ApplicationError::Configuration(problems.join("; ")))
        }
    }
}
