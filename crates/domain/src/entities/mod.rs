//! Domain entities

mod audio_unit;
mod chunk;
mod sample_block;

pub use audio_unit::{AudioFormat, AudioUnit};
pub use chunk::Chunk;
pub use sample_block::SampleBlock;
