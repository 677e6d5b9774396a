//! In-memory audio decoding with symphonia
//!
//! Each synthesized unit is a complete encoded file. [`SymphoniaDecoder`]
//! probes it, reports the stream layout and hands back a lazy iterator of
//! interleaved `f32` packets so callers can start playback before the whole
//! unit is decoded.

use std::io::Cursor;

use symphonia::core::audio::{SampleBuffer, SignalSpec};
use symphonia::core::codecs::{CODEC_TYPE_NULL, Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, instrument, trace, warn};

use crate::error::SpeechError;
use crate::types::AudioFormat;

/// Decoder for encoded audio held in memory
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    /// Create a new decoder
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Probe `data` and prepare it for packet-by-packet decoding
    ///
    /// `format` is used as a probe hint; the container is still detected
    /// from the bytes themselves.
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::InvalidAudio` if the data is empty, the
    /// container is not recognised, there is no decodable track, or the
    /// stream layout cannot be determined.
    #[instrument(skip(self, data), fields(bytes = data.len(), format = %format))]
    pub fn decode(&self, data: Vec<u8>, format: AudioFormat) -> Result<DecodedStream, SpeechError> {
        if data.is_empty() {
            return Err(SpeechError::InvalidAudio("empty audio data".to_string()));
        }

        let mss = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());

        let mut hint = Hint::new();
        hint.with_extension(format.extension());
        hint.mime_type(format.mime_type());

        let fmt_opts = FormatOptions::default();
        let meta_opts = MetadataOptions::default();

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &fmt_opts, &meta_opts)
            .map_err(|e| SpeechError::InvalidAudio(format!("unrecognised container: {e}")))?;
        let format_reader = probed.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| SpeechError::InvalidAudio("no decodable track".to_string()))?;
        let track_id = track.id;
        let declared = match (track.codec_params.sample_rate, &track.codec_params.channels) {
            (Some(rate), Some(channels)) => Some(Layout {
                rate,
                channels: channels.count(),
            }),
            _ => None,
        };

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| SpeechError::InvalidAudio(format!("unsupported codec: {e}")))?;

        let mut packets = DecodedPackets {
            format: format_reader,
            decoder,
            track_id,
            layout: None,
            sample_buf: None,
            pending: None,
            finished: false,
        };

        // The decoded layout can differ from the declared one (e.g. AAC with
        // SBR doubles the rate), so the first packet is decoded up front.
        let first = packets.next().transpose()?;
        let Layout { rate: sample_rate, channels } = stream_layout(declared, packets.layout)?;
        packets.pending = first;

        let channels = u16::try_from(channels)
            .map_err(|_| SpeechError::InvalidAudio(format!("too many channels: {channels}")))?;

        debug!(sample_rate, channels, "Audio stream opened");

        Ok(DecodedStream {
            sample_rate,
            channels,
            packets,
        })
    }
}

/// A probed audio stream whose packets are decoded on demand
pub struct DecodedStream {
    sample_rate: u32,
    channels: u16,
    packets: DecodedPackets,
}

impl DecodedStream {
    /// Sample rate in Hz
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels
    #[must_use]
    pub const fn channels(&self) -> u16 {
        self.channels
    }

    /// Consume the stream and iterate over its decoded packets
    #[must_use]
    pub fn into_packets(self) -> DecodedPackets {
        self.packets
    }
}

impl std::fmt::Debug for DecodedStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedStream")
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}

/// Lazy iterator over interleaved `f32` samples, one item per packet
pub struct DecodedPackets {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    layout: Option<Layout>,
    sample_buf: Option<SampleBuffer<f32>>,
    pending: Option<Vec<f32>>,
    finished: bool,
}

impl std::fmt::Debug for DecodedPackets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedPackets")
            .field("track_id", &self.track_id)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl DecodedPackets {
    fn next_packet(&mut self) -> Option<Result<Vec<f32>, SpeechError>> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return None;
                },
                Err(SymphoniaError::ResetRequired) => return None,
                Err(e) => {
                    return Some(Err(SpeechError::InvalidAudio(format!(
                        "failed to read packet: {e}"
                    ))));
                },
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    trace!(error = %e, "Skipping undecodable packet");
                    continue;
                },
                Err(e) => {
                    return Some(Err(SpeechError::InvalidAudio(format!(
                        "failed to decode packet: {e}"
                    ))));
                },
            };

            if decoded.frames() == 0 {
                continue;
            }

            let spec = *decoded.spec();
            if let Err(e) = check_layout(&mut self.layout, Layout::from(spec)) {
                return Some(Err(e));
            }

            let needed = decoded.capacity() * spec.channels.count();
            let buf = match &mut self.sample_buf {
                Some(buf) if buf.capacity() >= needed => buf,
                slot => slot.insert(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec)),
            };
            buf.copy_interleaved_ref(decoded);
            return Some(Ok(buf.samples().to_vec()));
        }
    }
}

/// Sample rate and channel count of decoded audio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    rate: u32,
    channels: usize,
}

impl From<SignalSpec> for Layout {
    fn from(spec: SignalSpec) -> Self {
        Self {
            rate: spec.rate,
            channels: spec.channels.count(),
        }
    }
}

/// Layout reported for a stream: what the decoder produced, or the
/// container's declaration when no packet decoded
fn stream_layout(declared: Option<Layout>, decoded: Option<Layout>) -> Result<Layout, SpeechError> {
    match (declared, decoded) {
        (Some(declared), Some(decoded)) if declared != decoded => {
            warn!(
                declared_rate = declared.rate,
                declared_channels = declared.channels,
                rate = decoded.rate,
                channels = decoded.channels,
                "Decoded layout differs from the container declaration"
            );
            Ok(decoded)
        },
        (_, Some(decoded)) => Ok(decoded),
        (Some(declared), None) => Ok(declared),
        (None, None) => Err(SpeechError::InvalidAudio(
            "stream contains no audio".to_string(),
        )),
    }
}

fn check_layout(known: &mut Option<Layout>, layout: Layout) -> Result<(), SpeechError> {
    match *known {
        Some(prev) if prev != layout => Err(SpeechError::InvalidAudio(format!(
            "stream layout changed from {} Hz/{} ch to {} Hz/{} ch",
            prev.rate, prev.channels, layout.rate, layout.channels
        ))),
        Some(_) => Ok(()),
        None => {
            *known = Some(layout);
            Ok(())
        },
    }
}

impl Iterator for DecodedPackets {
    type Item = Result<Vec<f32>, SpeechError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(samples) = self.pending.take() {
            return Some(Ok(samples));
        }
        if self.finished {
            return None;
        }
        let item = self.next_packet();
        if !matches!(item, Some(Ok(_))) {
            self.finished = true;
        }
        item
    }
}
