//! Playback through the default output device

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::layout::{OutputRange, fill_frames, output_channels};
use crate::error::SpeechError;
use crate::ports::AudioSink;

/// Seconds of audio buffered ahead of the device before `write` blocks
const BUFFER_SECONDS: u32 = 1;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Time left for the device to play out its own buffer after ours empties
const DRAIN_GRACE: Duration = Duration::from_millis(100);

#[derive(Default)]
struct Shared {
    queue: VecDeque<f32>,
    failure: Option<String>,
}

/// Sink feeding the default cpal output device
///
/// Mono audio is widened to stereo unless the device lists a mono layout
/// at the stream's rate. An `i16` stream is used when the device rejects
/// `f32`.
///
/// The cpal stream is not `Send`, so it is created and owned by a dedicated
/// thread that keeps it alive until the sink is dropped. Samples pass
/// through a shared queue that the output callback pops from, emitting
/// silence on underrun.
pub struct CpalSink {
    shared: Arc<Mutex<Shared>>,
    high_water: usize,
    shutdown: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl CpalSink {
    /// Open the default output device with the given stream layout
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::Device` if there is no output device or it
    /// rejects the requested layout.
    pub fn open(sample_rate: u32, channels: u16) -> Result<Self, SpeechError> {
        let shared = Arc::new(Mutex::new(Shared::default()));
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), SpeechError>>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let thread_shared = Arc::clone(&shared);
        let thread = std::thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || {
                let stream = match build_stream(sample_rate, channels, &thread_shared) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    },
                };
                let _ = ready_tx.send(Ok(()));
                // Blocks until the sender is dropped.
                let _ = shutdown_rx.recv();
                drop(stream);
                debug!("Audio output stream closed");
            })
            .map_err(|e| SpeechError::Device(format!("failed to spawn output thread: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {},
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            },
            Err(_) => {
                let _ = thread.join();
                return Err(SpeechError::Device(
                    "output thread exited before opening the stream".to_string(),
                ));
            },
        }

        info!(sample_rate, channels, "Audio output device opened");

        Ok(Self {
            shared,
            high_water: sample_rate as usize * usize::from(channels) * BUFFER_SECONDS as usize,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    fn check_failure(&self) -> Result<(), SpeechError> {
        match &self.shared.lock().failure {
            Some(msg) => Err(SpeechError::Device(msg.clone())),
            None => Ok(()),
        }
    }
}

fn build_stream(
    sample_rate: u32,
    channels: u16,
    shared: &Arc<Mutex<Shared>>,
) -> Result<cpal::Stream, SpeechError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| SpeechError::Device("no output device available".to_string()))?;

    if let Ok(name) = device.name() {
        debug!(device = %name, "Using output device");
    }

    let supported: Vec<OutputRange> = device
        .supported_output_configs()
        .map(|configs| {
            configs
                .map(|range| {
                    debug!(config = ?range, "Supported output config");
                    OutputRange {
                        channels: range.channels(),
                        min_rate: range.min_sample_rate().0,
                        max_rate: range.max_sample_rate().0,
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let output = output_channels(channels, sample_rate, &supported);
    let config = cpal::StreamConfig {
        channels: output,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let stream = match build_typed::<f32>(&device, &config, channels, shared) {
        Ok(stream) => stream,
        Err(e) => {
            debug!(error = %e, "f32 output stream rejected, trying i16");
            build_typed::<i16>(&device, &config, channels, shared).map_err(|e2| {
                SpeechError::Device(format!(
                    "failed to build output stream: {e} (i16 fallback: {e2})"
                ))
            })?
        },
    };

    stream
        .play()
        .map_err(|e| SpeechError::Device(format!("failed to start output stream: {e}")))?;

    debug!(source_channels = channels, output_channels = output, "Output stream started");
    Ok(stream)
}

/// Build a stream writing samples of type `T`, widening `source` channels
/// to the configured output layout
fn build_typed<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    source: u16,
    shared: &Arc<Mutex<Shared>>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample + cpal::FromSample<f32> + Send + 'static,
{
    let output = config.channels;
    let data_shared = Arc::clone(shared);
    let err_shared = Arc::clone(shared);
    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let mut shared = data_shared.lock();
            fill_frames(
                data,
                output,
                source,
                &mut shared.queue,
                T::EQUILIBRIUM,
                |sample: f32| T::from_sample(sample),
            );
        },
        move |err| {
            warn!(error = %err, "Audio output stream error");
            err_shared.lock().failure = Some(err.to_string());
        },
        None,
    )
}

impl AudioSink for CpalSink {
    fn write(&mut self, samples: &[f32]) -> Result<(), SpeechError> {
        loop {
            {
                let mut shared = self.shared.lock();
                if let Some(msg) = &shared.failure {
                    return Err(SpeechError::Device(msg.clone()));
                }
                if shared.queue.len() < self.high_water {
                    shared.queue.extend(samples.iter().copied());
                    return Ok(());
                }
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    fn drain(&mut self) -> Result<(), SpeechError> {
        loop {
            {
                let shared = self.shared.lock();
                if let Some(msg) = &shared.failure {
                    return Err(SpeechError::Device(msg.clone()));
                }
                if shared.queue.is_empty() {
                    break;
                }
            }
            std::thread::sleep(POLL_INTERVAL);
        }
        std::thread::sleep(DRAIN_GRACE);
        self.check_failure()
    }
}

impl Drop for CpalSink {
    fn drop(&mut self) {
        self.shutdown.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Audio output thread panicked");
            }
        }
    }
}

impl std::fmt::Debug for CpalSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpalSink")
            .field("high_water", &self.high_water)
            .field("queued", &self.shared.lock().queue.len())
            .finish_non_exhaustive()
    }
}
