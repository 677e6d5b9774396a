//! Hand-written fakes for the speech pipeline ports
//!
//! The fake synthesizer encodes a chunk's text as its bytes and the fake
//! decoder turns each byte into one mono sample, so the played samples
//! spell out exactly the text that was spoken.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use application::{
    ApplicationError, AudioDecoder, DecodedAudio, PlaybackDevice, PlaybackSink, SpeechSynthesizer,
    TokenSource,
};
use async_trait::async_trait;
use domain::{AudioFormat, AudioSpec, AudioUnit, Chunk, SampleBlock, TextFragment};
use parking_lot::Mutex;

pub const SAMPLE_RATE: u32 = 8_000;

// ============ Token source ============

/// Yields scripted fragments, optionally failing at one position
pub struct ScriptedSource {
    items: VecDeque<Result<String, ApplicationError>>,
    delay: Duration,
}

impl ScriptedSource {
    pub fn new(fragments: &[&str]) -> Self {
        Self {
            items: fragments.iter().map(|f| Ok((*f).to_string())).collect(),
            delay: Duration::ZERO,
        }
    }

    /// Fail after yielding every fragment
    pub fn failing_after(fragments: &[&str]) -> Self {
        let mut source = Self::new(fragments);
        source
            .items
            .push_back(Err(ApplicationError::Inference("connection reset".to_string())));
        source
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl TokenSource for ScriptedSource {
    async fn next_fragment(&mut self) -> Result<Option<TextFragment>, ApplicationError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.items.pop_front() {
            Some(Ok(text)) => Ok(Some(TextFragment::new(text))),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }
}

// ============ Synthesizer ============

#[derive(Default)]
pub struct FakeSynthesizer {
    fail_at: Option<u64>,
    hang_at: Option<u64>,
    delays: HashMap<u64, Duration>,
    calls: Mutex<Vec<u64>>,
}

impl FakeSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(mut self, index: u64) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Never complete synthesis of chunk `index`
    pub fn hanging_at(mut self, index: u64) -> Self {
        self.hang_at = Some(index);
        self
    }

    pub fn with_delays(mut self, delays: HashMap<u64, Duration>) -> Self {
        self.delays = delays;
        self
    }

    /// Indices of every chunk synthesis was started for
    pub fn calls(&self) -> Vec<u64> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, chunk: &Chunk) -> Result<AudioUnit, ApplicationError> {
        let index = chunk.index().get();
        self.calls.lock().push(index);

        if let Some(delay) = self.delays.get(&index) {
            tokio::time::sleep(*delay).await;
        }
        if self.hang_at == Some(index) {
            std::future::pending::<()>().await;
        }
        if self.fail_at == Some(index) {
            return Err(ApplicationError::ExternalService(format!(
                "synthesis refused chunk {index}"
            )));
        }

        Ok(AudioUnit::new(
            chunk.index(),
            AudioFormat::Wav,
            chunk.text().as_bytes().to_vec(),
        ))
    }
}

// ============ Decoder ============

/// One mono sample per encoded byte
#[derive(Default)]
pub struct ByteDecoder {
    fail_at: Option<u64>,
}

impl ByteDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail midway through the packets of chunk `index`
    pub fn failing_at(index: u64) -> Self {
        Self {
            fail_at: Some(index),
        }
    }
}

impl AudioDecoder for ByteDecoder {
    fn decode(&self, unit: AudioUnit) -> Result<DecodedAudio, ApplicationError> {
        let spec = AudioSpec::new(SAMPLE_RATE, 1)?;
        let fail = self.fail_at == Some(unit.index().get());

        let samples: Vec<f32> = unit.data().iter().map(|b| f32::from(*b)).collect();
        let half = samples.len() / 2;
        let mut packets = vec![Ok(samples[..half].to_vec())];
        if fail {
            packets.push(Err(ApplicationError::InvalidAudio(
                "corrupt frame".to_string(),
            )));
        }
        packets.push(Ok(samples[half..].to_vec()));

        Ok(DecodedAudio::new(spec, packets.into_iter()))
    }
}

// ============ Playback ============

/// What a recording sink observed
#[derive(Default)]
pub struct Recording {
    pub blocks: Vec<SampleBlock>,
    pub opened: usize,
    pub drained: usize,
    pub released: usize,
}

impl Recording {
    /// Sequence index of every block, in write order
    pub fn indices(&self) -> Vec<u64> {
        self.blocks.iter().map(|b| b.index().get()).collect()
    }

    /// Whether every opened sink has been dropped again
    pub fn all_released(&self) -> bool {
        self.released == self.opened
    }

    /// The played samples decoded back into text
    pub fn text(&self) -> String {
        let bytes: Vec<u8> = self
            .blocks
            .iter()
            .flat_map(|b| b.samples().iter().map(|s| *s as u8))
            .collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

#[derive(Clone, Default)]
pub struct RecordingDevice {
    recording: Arc<Mutex<Recording>>,
    fail_at: Option<u64>,
    write_delay: Duration,
    stalled: Arc<AtomicBool>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the first write of a block of chunk `index`
    pub fn failing_at(mut self, index: u64) -> Self {
        self.fail_at = Some(index);
        self
    }

    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }

    /// Hold every write until [`release`](Self::release) is called
    pub fn stalled(self) -> Self {
        self.stalled.store(true, Ordering::SeqCst);
        self
    }

    pub fn release(&self) {
        self.stalled.store(false, Ordering::SeqCst);
    }

    pub fn recording(&self) -> parking_lot::MutexGuard<'_, Recording> {
        self.recording.lock()
    }
}

impl PlaybackDevice for RecordingDevice {
    fn open(&self, _spec: AudioSpec) -> Result<Box<dyn PlaybackSink>, ApplicationError> {
        self.recording.lock().opened += 1;
        Ok(Box::new(RecordingSink {
            recording: Arc::clone(&self.recording),
            fail_at: self.fail_at,
            write_delay: self.write_delay,
            stalled: Arc::clone(&self.stalled),
        }))
    }
}

struct RecordingSink {
    recording: Arc<Mutex<Recording>>,
    fail_at: Option<u64>,
    write_delay: Duration,
    stalled: Arc<AtomicBool>,
}

impl PlaybackSink for RecordingSink {
    fn write(&mut self, block: &SampleBlock) -> Result<(), ApplicationError> {
        while self.stalled.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(1));
        }
        if !self.write_delay.is_zero() {
            std::thread::sleep(self.write_delay);
        }
        if self.fail_at == Some(block.index().get()) {
            return Err(ApplicationError::Device("device unplugged".to_string()));
        }
        self.recording.lock().blocks.push(block.clone());
        Ok(())
    }

    fn drain(&mut self) -> Result<(), ApplicationError> {
        self.recording.lock().drained += 1;
        Ok(())
    }
}

impl Drop for RecordingSink {
    fn drop(&mut self) {
        self.recording.lock().released += 1;
    }
}
