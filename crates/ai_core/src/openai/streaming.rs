//! Server-sent event handling for streamed chat completions

use futures::stream::{self, BoxStream, StreamExt};
use reqwest::Response;
use serde::Deserialize;
use tracing::trace;

use crate::{
    error::InferenceError,
    ports::{StreamingChunk, StreamingResponse},
};

/// Event payload that terminates the stream
const DONE_MARKER: &str = "[DONE]";

/// `chat.completion.chunk` object
#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<StreamErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamErrorBody {
    message: String,
}

/// Create a streaming response from an HTTP response
pub fn create_stream(response: Response) -> StreamingResponse {
    let state = StreamState {
        bytes: response.bytes_stream().boxed(),
        lines: SseLineBuffer::default(),
        finished: false,
    };

    let chunk_stream = stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }
        let batch = match state.bytes.next().await {
            Some(Ok(bytes)) => state.lines.feed(&bytes),
            Some(Err(e)) => {
                state.finished = true;
                vec![Err(InferenceError::StreamError(e.to_string()))]
            },
            None => {
                state.finished = true;
                state.lines.finish()
            },
        };
        Some((batch, state))
    })
    .flat_map(stream::iter);

    Box::pin(chunk_stream)
}

struct StreamState {
    bytes: BoxStream<'static, reqwest::Result<bytes::Bytes>>,
    lines: SseLineBuffer,
    finished: bool,
}

/// Reassembles SSE lines split across network packets
#[derive(Debug, Default)]
struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    /// Consume a packet, parsing every line it completes
    fn feed(&mut self, bytes: &[u8]) -> Vec<Result<StreamingChunk, InferenceError>> {
        self.pending.extend_from_slice(bytes);

        let mut results = Vec::new();
        while let Some(newline) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            if let Some(result) = parse_line(&line) {
                results.push(result);
            }
        }
        results
    }

    /// Parse a final line that lacked a terminating newline
    fn finish(&mut self) -> Vec<Result<StreamingChunk, InferenceError>> {
        let line = std::mem::take(&mut self.pending);
        parse_line(&line).into_iter().collect()
    }
}

/// Parse one SSE line; `None` for blank lines, comments and other fields
fn parse_line(raw: &[u8]) -> Option<Result<StreamingChunk, InferenceError>> {
    let line = match std::str::from_utf8(raw) {
        Ok(line) => line.trim_end_matches(['\r', '\n']),
        Err(e) => {
            return Some(Err(InferenceError::InvalidResponse(format!(
                "Invalid UTF-8: {e}"
            ))));
        },
    };

    let payload = line.strip_prefix("data:")?.trim_start();
    trace!(payload = %payload, "Parsing stream event");

    if payload == DONE_MARKER {
        return Some(Ok(StreamingChunk::finished()));
    }

    Some(parse_payload(payload))
}

fn parse_payload(payload: &str) -> Result<StreamingChunk, InferenceError> {
    let chunk: ChatCompletionChunk = serde_json::from_str(payload)
        .map_err(|e| InferenceError::InvalidResponse(format!("JSON parse error: {e}")))?;

    if let Some(error) = chunk.error {
        return Err(InferenceError::StreamError(error.message));
    }

    let content = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .unwrap_or_default();

    Ok(StreamingChunk {
        content,
        done: false,
        model: chunk.model,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(content: &str) -> String {
        format!(
            "data: {{\"model\":\"gpt-3.5-turbo\",\"choices\":[{{\"index\":0,\"delta\":{{\"content\":\"{content}\"}}}}]}}\n\n"
        )
    }

    #[test]
    fn parses_single_event() {
        let mut buffer = SseLineBuffer::default();
        let chunks = buffer.feed(event("Hello").as_bytes());

        assert_eq!(chunks.len(), 1);
        let chunk = chunks[0].as_ref().unwrap();
        assert_eq!(chunk.content, "Hello");
        assert!(!chunk.done);
        assert_eq!(chunk.model.as_deref(), Some("gpt-3.5-turbo"));
    }

    #[test]
    fn reassembles_line_split_across_packets() {
        let text = event("Hello world");
        let (first, second) = text.split_at(25);
        let mut buffer = SseLineBuffer::default();

        assert!(buffer.feed(first.as_bytes()).is_empty());
        let chunks = buffer.feed(second.as_bytes());

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].as_ref().unwrap().content, "Hello world");
    }

    #[test]
    fn reassembles_multibyte_character_split_across_packets() {
        let text = event("Grüße");
        let bytes = text.as_bytes();
        let split = text.find('ü').unwrap() + 1;
        let mut buffer = SseLineBuffer::default();

        assert!(buffer.feed(&bytes[..split]).is_empty());
        let chunks = buffer.feed(&bytes[split..]);

        assert_eq!(chunks[0].as_ref().unwrap().content, "Grüße");
    }

    #[test]
    fn done_marker_finishes_stream() {
        let mut buffer = SseLineBuffer::default();
        let chunks = buffer.feed(b"data: [DONE]\n\n");

        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].as_ref().unwrap().done);
    }

    #[test]
    fn role_only_delta_yields_empty_content() {
        let payload = r#"{"model":"gpt-3.5-turbo","choices":[{"index":0,"delta":{"role":"assistant"}}]}"#;
        let chunk = parse_payload(payload).unwrap();
        assert!(chunk.content.is_empty());
        assert!(!chunk.done);
    }

    #[test]
    fn ignores_comments_and_other_fields() {
        let mut buffer = SseLineBuffer::default();
        let chunks = buffer.feed(b": keep-alive\nevent: message\nid: 7\n\n");
        assert!(chunks.is_empty());
    }

    #[test]
    fn handles_crlf_line_endings() {
        let mut buffer = SseLineBuffer::default();
        let chunks = buffer.feed(b"data: [DONE]\r\n\r\n");
        assert!(chunks[0].as_ref().unwrap().done);
    }

    #[test]
    fn error_event_is_stream_error() {
        let mut buffer = SseLineBuffer::default();
        let chunks = buffer.feed(b"data: {\"error\":{\"message\":\"overloaded\"}}\n");
        assert!(matches!(
            chunks[0],
            Err(InferenceError::StreamError(ref msg)) if msg == "overloaded"
        ));
    }

    #[test]
    fn invalid_json_is_invalid_response() {
        let mut buffer = SseLineBuffer::default();
        let chunks = buffer.feed(b"data: {not json}\n");
        assert!(matches!(chunks[0], Err(InferenceError::InvalidResponse(_))));
    }

    #[test]
    fn finish_parses_unterminated_last_line() {
        let mut buffer = SseLineBuffer::default();
        assert!(buffer.feed(b"data: [DONE]").is_empty());
        let chunks = buffer.finish();
        assert_eq!(chunks.len(), 1);
        assert!(buffer.finish().is_empty());
    }
}
