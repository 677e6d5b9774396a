//! AI Core - Streaming chat inference
//!
//! Provides the inference engine abstraction and an OpenAI-compatible
//! chat completion client that streams the answer token by token over
//! server-sent events.

pub mod config;
pub mod error;
pub mod openai;
pub mod ports;

pub use config::InferenceConfig;
pub use error::InferenceError;
pub use openai::OpenAIChatEngine;
pub use ports::{
    InferenceEngine, InferenceMessage, InferenceRequest, StreamingChunk, StreamingResponse,
};
