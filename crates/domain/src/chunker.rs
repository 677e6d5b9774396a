//! Chunker - segments an open-ended fragment stream into synthesizable chunks
//!
//! Fragments are appended to an accumulation buffer. As soon as the buffer
//! reaches the configured threshold the whole buffer is sealed into one
//! [`Chunk`]; a chunk is never split inside a fragment. At end of stream
//! [`Chunker::flush`] seals whatever is left.

use crate::entities::Chunk;
use crate::value_objects::{ChunkThreshold, SequenceIndex, TextFragment};

/// Accumulates fragments and emits chunks by a size threshold
#[derive(Debug, Clone, Default)]
pub struct Chunker {
    threshold: ChunkThreshold,
    buffer: String,
    next_index: SequenceIndex,
}

impl Chunker {
    /// Create a chunker with the given threshold
    pub fn new(threshold: ChunkThreshold) -> Self {
        Self {
            threshold,
            buffer: String::new(),
            next_index: SequenceIndex::FIRST,
        }
    }

    /// The configured threshold
    pub const fn threshold(&self) -> ChunkThreshold {
        self.threshold
    }

    /// Number of code units currently buffered
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Index the next sealed chunk will carry
    pub const fn next_index(&self) -> SequenceIndex {
        self.next_index
    }

    /// Append a fragment, sealing the full buffer once it reaches the threshold
    pub fn push(&mut self, fragment: &TextFragment) -> Option<Chunk> {
        self.push_str(fragment.as_str())
    }

    /// Append raw text, see [`Chunker::push`]
    pub fn push_str(&mut self, text: &str) -> Option<Chunk> {
        self.buffer.push_str(text);
        if self.buffer.len() >= self.threshold.get() {
            self.seal()
        } else {
            None
        }
    }

    /// Seal whatever remains in the buffer
    ///
    /// Returns `None` when nothing is buffered, so calling it again after a
    /// flush yields nothing.
    pub fn flush(&mut self) -> Option<Chunk> {
        self.seal()
    }

    fn seal(&mut self) -> Option<Chunk> {
        let text = std::mem::take(&mut self.buffer);
        let chunk = Chunk::seal(self.next_index, text)?;
        self.next_index = self.next_index.next();
        Some(chunk)
    }
}
