//! Audio outputs implementing [`AudioSink`](crate::ports::AudioSink)

#[cfg(feature = "device")]
mod cpal;
mod layout;
mod paced;

#[cfg(feature = "device")]
pub use self::cpal::CpalSink;
pub use paced::PacedSink;
