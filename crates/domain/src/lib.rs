//! Domain layer for VoiceStream
//!
//! Contains the text and audio entities that flow through the speech
//! pipeline, the value objects that constrain them and the chunker that
//! turns a fragment stream into synthesizable chunks.
//! This layer has no I/O and defines the ubiquitous language.

pub mod chunker;
pub mod entities;
pub mod errors;
pub mod value_objects;

pub use chunker::Chunker;
pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
