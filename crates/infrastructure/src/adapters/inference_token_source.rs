//! Token source backed by a streaming chat completion

use std::fmt;
use std::sync::Arc;

use ai_core::{InferenceEngine, InferenceError, InferenceRequest, StreamingResponse};
use application::error::ApplicationError;
use application::ports::TokenSource;
use async_trait::async_trait;
use domain::TextFragment;
use futures::StreamExt;
use tracing::{debug, instrument, trace};

/// Adapter exposing an LLM token stream as a [`TokenSource`]
///
/// Empty deltas (such as the role-only first delta) are skipped. The source
/// ends at the first `done` chunk or when the underlying stream ends.
pub struct InferenceTokenSource {
    stream: StreamingResponse,
    finished: bool,
    fragments: usize,
}

impl fmt::Debug for InferenceTokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceTokenSource")
            .field("finished", &self.finished)
            .field("fragments", &self.fragments)
            .finish_non_exhaustive()
    }
}

impl InferenceTokenSource {
    /// Wrap an already-open response stream
    pub fn new(stream: StreamingResponse) -> Self {
        Self {
            stream,
            finished: false,
            fragments: 0,
        }
    }

    /// Send `prompt` to the engine and wrap the streaming answer
    ///
    /// # Errors
    ///
    /// Returns the mapped inference error if the request is rejected before
    /// streaming starts.
    #[instrument(skip(engine, prompt), fields(prompt_len = prompt.len(), model = engine.default_model()))]
    pub async fn ask(
        engine: Arc<dyn InferenceEngine>,
        prompt: &str,
    ) -> Result<Self, ApplicationError> {
        let request = InferenceRequest::simple(prompt).streaming();
        let stream = engine
            .generate_stream(request)
            .await
            .map_err(Self::map_error)?;
        debug!("Chat completion stream opened");
        Ok(Self::new(stream))
    }

    /// Convert ai_core error to application error
    fn map_error(e: InferenceError) -> ApplicationError {
        match e {
            InferenceError::RateLimited => ApplicationError::RateLimited,
            InferenceError::Unauthorized(msg) => ApplicationError::NotAuthorized(msg),
            InferenceError::InvalidConfig(msg) => ApplicationError::Configuration(msg),
            InferenceError::ConnectionFailed(msg) => {
                ApplicationError::ExternalService(format!("Inference connection failed: {msg}"))
            },
            other => ApplicationError::Inference(other.to_string()),
        }
    }
}

#[async_trait]
impl TokenSource for InferenceTokenSource {
    async fn next_fragment(&mut self) -> Result<Option<TextFragment>, ApplicationError> {
        while !self.finished {
            match self.stream.next().await {
                Some(Ok(chunk)) => {
                    if chunk.done {
                        self.finished = true;
                    }
                    if chunk.content.is_empty() {
                        continue;
                    }
                    self.fragments += 1;
                    trace!(len = chunk.content.len(), "Received token delta");
                    return Ok(Some(TextFragment::new(chunk.content)));
                },
                Some(Err(e)) => {
                    self.finished = true;
                    return Err(ApplicationError::Inference(e.to_string()));
                },
                None => {
                    self.finished = true;
                },
            }
        }

        debug!(fragments = self.fragments, "Token stream ended");
        Ok(None)
    }
}
