//! Value Objects - Immutable, identity-less domain primitives

mod audio_spec;
mod chunk_threshold;
mod sequence_index;
mod text_fragment;

pub use audio_spec::AudioSpec;
pub use chunk_threshold::ChunkThreshold;
pub use sequence_index::SequenceIndex;
pub use text_fragment::TextFragment;
