//! Playback port - Interface for audio output devices

use domain::{AudioSpec, SampleBlock};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// An open audio output configured for exactly one [`AudioSpec`]
///
/// A sink has a single writer. Dropping it releases the device.
pub trait PlaybackSink: Send {
    /// Queue a block for playback, blocking while the device buffer is full
    fn write(&mut self, block: &SampleBlock) -> Result<(), ApplicationError>;

    /// Block until everything written so far has been played
    fn drain(&mut self) -> Result<(), ApplicationError>;
}

/// Factory for playback sinks
#[cfg_attr(test, automock)]
pub trait PlaybackDevice: Send + Sync {
    /// Open a sink for audio in the given layout
    fn open(&self, spec: AudioSpec) -> Result<Box<dyn PlaybackSink>, ApplicationError>;
}
