//! Audio unit entity - encoded audio synthesized from one chunk

use serde::{Deserialize, Serialize};

use crate::value_objects::SequenceIndex;

/// Encoding of an audio unit as returned by the synthesis service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// MP3 format
    #[default]
    Mp3,
    /// WAV format (PCM in a RIFF container)
    Wav,
    /// FLAC format (lossless)
    Flac,
    /// Opus codec in an OGG container
    Opus,
    /// AAC in an MP4/ADTS container
    Aac,
}

impl AudioFormat {
    /// Get the MIME type for this format
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Wav => "audio/wav",
            Self::Flac => "audio/flac",
            Self::Opus => "audio/ogg",
            Self::Aac => "audio/aac",
        }
    }

    /// Get the file extension for this format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Flac => "flac",
            Self::Opus => "ogg",
            Self::Aac => "aac",
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mp3 => write!(f, "mp3"),
            Self::Wav => write!(f, "wav"),
            Self::Flac => write!(f, "flac"),
            Self::Opus => write!(f, "opus"),
            Self::Aac => write!(f, "aac"),
        }
    }
}

/// Encoded audio produced by synthesizing exactly one chunk
///
/// Owns its byte buffer until it is handed to a decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioUnit {
    index: SequenceIndex,
    format: AudioFormat,
    data: Vec<u8>,
}

impl AudioUnit {
    /// Create an audio unit for the chunk at `index`
    pub const fn new(index: SequenceIndex, format: AudioFormat, data: Vec<u8>) -> Self {
        Self {
            index,
            format,
            data,
        }
    }

    /// Index of the chunk this unit was synthesized from
    pub const fn index(&self) -> SequenceIndex {
        self.index
    }

    /// Encoding of the bytes
    pub const fn format(&self) -> AudioFormat {
        self.format
    }

    /// Encoded bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Size of the encoded bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Whether the unit carries no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consume and return the encoded bytes
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}
