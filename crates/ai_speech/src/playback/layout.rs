//! Mapping decoded frames onto the channel layout an output device accepts

#![cfg_attr(not(feature = "device"), allow(dead_code))]

use std::collections::VecDeque;

/// One supported output configuration: channel count and sample rate range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OutputRange {
    pub channels: u16,
    pub min_rate: u32,
    pub max_rate: u32,
}

impl OutputRange {
    const fn accepts(&self, channels: u16, sample_rate: u32) -> bool {
        self.channels == channels && self.min_rate <= sample_rate && sample_rate <= self.max_rate
    }
}

/// Channel count to open the device with for `source` channels at `sample_rate`
///
/// The source layout is kept when the device lists it. Otherwise mono is
/// widened to stereo, since many devices do not offer mono at all.
pub(crate) fn output_channels(source: u16, sample_rate: u32, supported: &[OutputRange]) -> u16 {
    if supported.iter().any(|r| r.accepts(source, sample_rate)) {
        source
    } else {
        source.max(2)
    }
}

/// Fill `data`, interleaved with `output` channels, from a queue of
/// interleaved `source`-channel frames
///
/// Output channel `c` takes source channel `c % source`, so mono is copied
/// to every output channel. Frames not yet complete in the queue are left
/// there and played as `silence`.
pub(crate) fn fill_frames<T: Copy>(
    data: &mut [T],
    output: u16,
    source: u16,
    queue: &mut VecDeque<f32>,
    silence: T,
    convert: impl Fn(f32) -> T,
) {
    let output = usize::from(output.max(1));
    let source = usize::from(source.max(1));

    for out in data.chunks_mut(output) {
        if queue.len() < source {
            out.fill(silence);
            continue;
        }
        for (c, sample) in out.iter_mut().enumerate() {
            *sample = convert(queue[c % source]);
        }
        queue.drain(..source);
    }
}
