//! Chunk entity

use std::fmt;

use crate::errors::DomainError;
use crate::value_objects::SequenceIndex;

/// A sealed, ordered group of fragments ready for synthesis
///
/// Chunks are only created by the [`Chunker`](crate::Chunker); once emitted
/// their text never changes. A chunk is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    index: SequenceIndex,
    text: String,
}

impl Chunk {
    /// Create a chunk outside of a chunker (replays, tests)
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty text.
    pub fn new(index: SequenceIndex, text: impl Into<String>) -> Result<Self, DomainError> {
        Self::seal(index, text.into())
            .ok_or_else(|| DomainError::validation("Chunk text cannot be empty"))
    }

    /// Seal `text` as the chunk at `index`
    ///
    /// Returns `None` for empty text.
    pub(crate) fn seal(index: SequenceIndex, text: String) -> Option<Self> {
        if text.is_empty() {
            None
        } else {
            Some(Self { index, text })
        }
    }

    /// Position of this chunk in emission order
    pub const fn index(&self) -> SequenceIndex {
        self.index
    }

    /// The chunk text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in UTF-8 code units
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Consume and return the text
    pub fn into_text(self) -> String {
        self.text
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
