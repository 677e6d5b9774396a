//! Application layer - Use cases and orchestration
//!
//! Contains the port definitions for the speech pipeline collaborators
//! (token source, synthesizer, decoder, playback device) and the pipeline
//! service that drives text from the first fragment to the last played sample.

pub mod error;
pub mod ports;
pub mod services;

pub use error::{ApplicationError, PipelineError, PipelineStage};
pub use ports::*;
pub use services::*;
