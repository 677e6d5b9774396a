//! OpenAI-compatible chat completion engine
//!
//! Works against api.openai.com and any server that speaks the same
//! `/chat/completions` streaming protocol.

mod client;
mod streaming;

pub use client::OpenAIChatEngine;
