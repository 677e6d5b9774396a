//! Sequence index value object

use std::fmt;

use serde::{Deserialize, Serialize};

/// 1-based position of a chunk (and of the audio derived from it) in the
/// emission order of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SequenceIndex(u64);

impl SequenceIndex {
    /// Index of the first chunk of a run
    pub const FIRST: Self = Self(1);

    /// Create an index from a raw 1-based position
    ///
    /// Position 0 is clamped to the first index.
    pub const fn new(position: u64) -> Self {
        if position == 0 { Self::FIRST } else { Self(position) }
    }

    /// The index following this one
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Get the raw 1-based position
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Default for SequenceIndex {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for SequenceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SequenceIndex {
    fn from(position: u64) -> Self {
        Self::new(position)
    }
}
