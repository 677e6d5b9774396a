//! Lazily opened, exclusively owned playback sink for one run

use std::fmt;
use std::sync::Arc;

use domain::{AudioSpec, SampleBlock};
use tracing::debug;

use crate::error::ApplicationError;
use crate::ports::{PlaybackDevice, PlaybackSink};

/// Holds the run's sink, opening it from the first block's layout
///
/// The sink is released when the slot is dropped, on every exit path.
pub(super) struct SinkSlot {
    device: Arc<dyn PlaybackDevice>,
    sink: Option<(AudioSpec, Box<dyn PlaybackSink>)>,
    blocks_played: u64,
    frames_played: u64,
}

impl fmt::Debug for SinkSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkSlot")
            .field("spec", &self.spec())
            .field("blocks_played", &self.blocks_played)
            .field("frames_played", &self.frames_played)
            .finish_non_exhaustive()
    }
}

impl SinkSlot {
    pub(super) fn new(device: Arc<dyn PlaybackDevice>) -> Self {
        Self {
            device,
            sink: None,
            blocks_played: 0,
            frames_played: 0,
        }
    }

    /// Layout the sink was opened with, if it is open
    pub(super) fn spec(&self) -> Option<AudioSpec> {
        self.sink.as_ref().map(|(spec, _)| *spec)
    }

    pub(super) const fn blocks_played(&self) -> u64 {
        self.blocks_played
    }

    pub(super) const fn frames_played(&self) -> u64 {
        self.frames_played
    }

    /// Write one block, opening the sink on first use
    pub(super) fn write(&mut self, block: &SampleBlock) -> Result<(), ApplicationError> {
        let (open_spec, sink) = match self.sink.take() {
            Some(open) => open,
            None => {
                debug!(spec = %block.spec(), "Opening playback sink");
                (block.spec(), self.device.open(block.spec())?)
            },
        };
        let (open_spec, sink) = self.sink.insert((open_spec, sink));

        if *open_spec != block.spec() {
            return Err(ApplicationError::Device(format!(
                "block layout {} does not match sink layout {open_spec}",
                block.spec()
            )));
        }

        sink.write(block)?;
        self.blocks_played += 1;
        self.frames_played += block.frames() as u64;
        Ok(())
    }

    /// Wait for the device to play everything written; no-op if never opened
    pub(super) fn drain(&mut self) -> Result<(), ApplicationError> {
        match self.sink.as_mut() {
            Some((_, sink)) => sink.drain(),
            None => Ok(()),
        }
    }
}
