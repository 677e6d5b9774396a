//! Port definitions for inference engine
//!
//! Defines the traits (ports) that inference adapters must implement.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::InferenceError;

/// Request for inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceRequest {
    /// Messages in the conversation
    pub messages: Vec<InferenceMessage>,
    /// Model to use (overrides config default)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Temperature for sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Whether to stream the response
    #[serde(default)]
    pub stream: bool,
}

/// A message in the inference request (OpenAI-compatible format)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceMessage {
    pub role: String,
    pub content: String,
}

impl InferenceMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

impl InferenceRequest {
    /// Create a simple single-turn request
    pub fn simple(user_message: impl Into<String>) -> Self {
        Self {
            messages: vec![InferenceMessage::user(user_message)],
            model: None,
            max_tokens: None,
            temperature: None,
            stream: false,
        }
    }

    /// Create a request with system prompt
    pub fn with_system(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![InferenceMessage::system(system), InferenceMessage::user(user)],
            ..Self::simple(String::new())
        }
    }

    /// Enable streaming for this request
    pub const fn streaming(mut self) -> Self {
        self.stream = true;
        self
    }

    /// Set the model for this request
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set temperature
    pub const fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// Set the generation limit
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A chunk of a streaming response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingChunk {
    /// Content delta
    pub content: String,
    /// Whether this is the final chunk
    pub done: bool,
    /// Model name, when the server reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl StreamingChunk {
    /// A content delta
    pub fn delta(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            done: false,
            model: None,
        }
    }

    /// The end-of-stream marker
    pub const fn finished() -> Self {
        Self {
            content: String::new(),
            done: true,
            model: None,
        }
    }
}

/// Type alias for streaming response
pub type StreamingResponse =
    Pin<Box<dyn Stream<Item = Result<StreamingChunk, InferenceError>> + Send>>;

/// Port for inference engine implementations
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    /// Generate a streaming response
    ///
    /// Errors that occur before the first byte arrives (connection, status)
    /// are returned here; later failures arrive as stream items.
    async fn generate_stream(
        &self,
        request: InferenceRequest,
    ) -> Result<StreamingResponse, InferenceError>;

    /// Get the current default model
    fn default_model(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inference_request_simple() {
        let req = InferenceRequest::simple("Hello");
        assert_eq!(req.messages, vec![InferenceMessage::user("Hello")]);
        assert!(!req.stream);
    }

    #[test]
    fn inference_request_with_system() {
        let req = InferenceRequest::with_system("You are helpful", "Hi");
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].role, "system");
        assert_eq!(req.messages[0].content, "You are helpful");
        assert_eq!(req.messages[1].role, "user");
        assert_eq!(req.messages[1].content, "Hi");
    }

    #[test]
    fn inference_request_chaining() {
        let req = InferenceRequest::simple("Test")
            .with_model("gpt-4o-mini")
            .with_temperature(0.3)
            .with_max_tokens(64)
            .streaming();
        assert_eq!(req.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(req.temperature, Some(0.3));
        assert_eq!(req.max_tokens, Some(64));
        assert!(req.stream);
    }

    #[test]
    fn inference_request_skip_none_fields() {
        let req = InferenceRequest::simple("Test");
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("model"));
        assert!(!json.contains("max_tokens"));
        assert!(!json.contains("temperature"));
    }

    #[test]
    fn streaming_chunk_constructors() {
        let delta = StreamingChunk::delta("Hello");
        assert_eq!(delta.content, "Hello");
        assert!(!delta.done);

        let done = StreamingChunk::finished();
        assert!(done.done);
        assert!(done.content.is_empty());
    }
}
