//! OpenAI chat completion client implementation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::streaming::create_stream;
use crate::config::InferenceConfig;
use crate::error::InferenceError;
use crate::ports::{InferenceEngine, InferenceMessage, InferenceRequest, StreamingResponse};

/// Streaming chat completion engine for OpenAI-compatible APIs
pub struct OpenAIChatEngine {
    client: Client,
    config: InferenceConfig,
}

impl std::fmt::Debug for OpenAIChatEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIChatEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OpenAIChatEngine {
    /// Create a new chat engine
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: InferenceConfig) -> Result<Self, InferenceError> {
        config.validate()?;

        // A total timeout would cut long answers off mid-stream
        let timeout = Duration::from_millis(config.timeout_ms);
        let client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .map_err(|e| InferenceError::ConnectionFailed(e.to_string()))?;

        info!(
            base_url = %config.base_url,
            model = %config.default_model,
            "Initialized OpenAI chat engine"
        );

        Ok(Self { client, config })
    }

    /// Build the API URL for a given endpoint
    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// Get the model to use for a request
    fn resolve_model<'a>(&'a self, request: &'a InferenceRequest) -> &'a str {
        request
            .model
            .as_deref()
            .unwrap_or(&self.config.default_model)
    }

    /// Prepend the configured system prompt unless the request has one
    fn messages(&self, request: &InferenceRequest) -> Vec<InferenceMessage> {
        let has_system = request.messages.iter().any(|m| m.role == "system");
        match &self.config.system_prompt {
            Some(prompt) if !has_system => std::iter::once(InferenceMessage::system(prompt))
                .chain(request.messages.iter().cloned())
                .collect(),
            _ => request.messages.clone(),
        }
    }
}

/// OpenAI chat completion request body
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<InferenceMessage>,
    stream: bool,
    max_tokens: u32,
    temperature: f32,
}

/// OpenAI error response body
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Map a non-success status and body to an inference error
fn map_status_error(status: StatusCode, body: &str, model: &str) -> InferenceError {
    let message = serde_json::from_str::<ApiErrorResponse>(body)
        .map_or_else(|_| body.to_string(), |r| r.error.message);

    match status {
        StatusCode::TOO_MANY_REQUESTS => InferenceError::RateLimited,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => InferenceError::Unauthorized(message),
        StatusCode::NOT_FOUND => InferenceError::ModelNotAvailable(format!("{model}: {message}")),
        s if s.is_server_error() => InferenceError::ServerError(format!("Status {s}: {message}")),
        s => InferenceError::RequestFailed(format!("Status {s}: {message}")),
    }
}

#[async_trait]
impl InferenceEngine for OpenAIChatEngine {
    #[instrument(skip(self, request), fields(model = %self.resolve_model(&request)))]
    async fn generate_stream(
        &self,
        request: InferenceRequest,
    ) -> Result<StreamingResponse, InferenceError> {
        let model = self.resolve_model(&request);
        let body = ChatCompletionRequest {
            model,
            messages: self.messages(&request),
            stream: true,
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
            temperature: request.temperature.unwrap_or(self.config.temperature),
        };

        debug!(messages = body.messages.len(), "Starting streaming chat completion");

        let mut builder = self.client.post(self.api_url("chat/completions")).json(&body);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| InferenceError::from_reqwest(&e, self.config.timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Chat completion request failed");
            return Err(map_status_error(status, &body, model));
        }

        Ok(create_stream(response))
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(config: InferenceConfig) -> OpenAIChatEngine {
        OpenAIChatEngine::new(config).unwrap()
    }

    #[test]
    fn builds_api_urls() {
        let engine = engine(InferenceConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..Default::default()
        });
        assert_eq!(
            engine.api_url("chat/completions"),
            "http://localhost:8080/v1/chat/completions"
        );
        assert_eq!(
            engine.api_url("/chat/completions"),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn request_model_overrides_default() {
        let engine = engine(InferenceConfig::default());
        let request = InferenceRequest::simple("Hi").with_model("gpt-4o");
        assert_eq!(engine.resolve_model(&request), "gpt-4o");
        assert_eq!(engine.default_model(), "gpt-3.5-turbo");
    }

    #[test]
    fn configured_system_prompt_is_prepended() {
        let engine = engine(InferenceConfig {
            system_prompt: Some("Answer briefly.".to_string()),
            ..Default::default()
        });

        let messages = engine.messages(&InferenceRequest::simple("Hi"));
        assert_eq!(messages[0], InferenceMessage::system("Answer briefly."));
        assert_eq!(messages.len(), 2);

        let explicit = engine.messages(&InferenceRequest::with_system("Be loud.", "Hi"));
        assert_eq!(explicit[0].content, "Be loud.");
        assert_eq!(explicit.len(), 2);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let result = OpenAIChatEngine::new(InferenceConfig {
            timeout_ms: 0,
            ..Default::default()
        });
        assert!(matches!(result, Err(InferenceError::InvalidConfig(_))));
    }

    #[test]
    fn maps_status_codes() {
        let body = r#"{"error":{"message":"Incorrect API key provided"}}"#;
        assert!(matches!(
            map_status_error(StatusCode::UNAUTHORIZED, body, "m"),
            InferenceError::Unauthorized(ref msg) if msg == "Incorrect API key provided"
        ));
        assert!(matches!(
            map_status_error(StatusCode::TOO_MANY_REQUESTS, "", "m"),
            InferenceError::RateLimited
        ));
        assert!(matches!(
            map_status_error(StatusCode::NOT_FOUND, "nope", "gpt-9"),
            InferenceError::ModelNotAvailable(ref msg) if msg.contains("gpt-9")
        ));
        assert!(matches!(
            map_status_error(StatusCode::BAD_GATEWAY, "down", "m"),
            InferenceError::ServerError(_)
        ));
        assert!(matches!(
            map_status_error(StatusCode::BAD_REQUEST, "bad", "m"),
            InferenceError::RequestFailed(_)
        ));
    }
}
