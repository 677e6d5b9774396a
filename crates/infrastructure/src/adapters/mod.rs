//! Infrastructure adapters
//!
//! Adapters connect application ports to concrete implementations.

mod decoder_adapter;
mod inference_token_source;
mod playback_adapter;
mod speech_synthesis_adapter;
mod text_token_source;

pub use decoder_adapter::DecoderAdapter;
pub use inference_token_source::InferenceTokenSource;
pub use playback_adapter::{PlaybackAdapter, SinkKind};
pub use speech_synthesis_adapter::SpeechSynthesisAdapter;
pub use text_token_source::TextTokenSource;
