//! Chunk threshold value object

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Minimum accumulated length, in UTF-8 code units, at which the chunker
/// seals a chunk
///
/// This is a trigger, not a cap: a single fragment longer than the threshold
/// still produces one (oversized) chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct ChunkThreshold(usize);

impl ChunkThreshold {
    /// Default threshold used when nothing is configured
    pub const DEFAULT: usize = 128;

    /// Create a threshold
    ///
    /// # Errors
    ///
    /// Returns a validation error if `code_units` is zero.
    pub fn new(code_units: usize) -> Result<Self, DomainError> {
        if code_units == 0 {
            return Err(DomainError::validation(
                "Chunk threshold must be greater than 0",
            ));
        }
        Ok(Self(code_units))
    }

    /// Get the threshold in code units
    pub const fn get(self) -> usize {
        self.0
    }
}

impl Default for ChunkThreshold {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<usize> for ChunkThreshold {
    type Error = DomainError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ChunkThreshold> for usize {
    fn from(threshold: ChunkThreshold) -> Self {
        threshold.0
    }
}

impl fmt::Display for ChunkThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_128() {
        assert_eq!(ChunkThreshold::default().get(), 128);
    }

    #[test]
    fn zero_is_rejected() {
        assert!(ChunkThreshold::new(0).is_err());
    }

    #[test]
    fn positive_is_accepted() {
        assert_eq!(ChunkThreshold::new(20).unwrap().get(), 20);
    }

    #[test]
    fn deserializes_from_number() {
        let threshold: ChunkThreshold = serde_json::from_str("64").unwrap();
        assert_eq!(threshold.get(), 64);
    }

    #[test]
    fn deserialize_rejects_zero() {
        let result: Result<ChunkThreshold, _> = serde_json::from_str("0");
        assert!(result.is_err());
    }
}
