//! Speech provider implementations

mod openai;

pub use openai::OpenAITtsProvider;
