//! Capture/playback seam.
//!
//! [`AudioBackend`] is the only way the pipeline touches audio hardware.  It
//! is object-safe, so the binary can choose at runtime between the cpal
//! microphone backend ([`crate::audio::CpalBackend`]) and the synthetic
//! [`crate::audio::ToneBackend`].
//!
//! Device choice is an explicit [`CaptureRequest`] field threaded through
//! every call; the backend keeps no "current device" state.

use std::sync::atomic::AtomicBool;
use std::time::Duration;

use thiserror::Error;

use super::Waveform;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure to obtain a reference recording.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no audio input devices available")]
    NoDevice,

    #[error("input device index {index} out of range ({count} input devices)")]
    DeviceIndexOutOfRange { index: usize, count: usize },

    #[error("device '{device}' cannot record at {sample_rate} Hz")]
    UnsupportedSampleRate { device: String, sample_rate: u32 },

    #[error("device '{device}' offers no usable sample format")]
    UnsupportedSampleFormat { device: String },

    #[error("failed to enumerate audio devices: {0}")]
    Devices(String),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("capture interrupted")]
    Interrupted,

    #[error("device delivered no samples")]
    Empty,
}

/// Failure to play a waveform back.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no audio output device available")]
    NoDevice,

    #[error("output device offers no usable configuration: {0}")]
    Config(String),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("playback unavailable: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// Request / device types
// ---------------------------------------------------------------------------

/// One entry of [`AudioBackend::input_devices`].
#[derive(Debug, Clone, PartialEq)]
pub struct InputDeviceInfo {
    /// Position in the input-only device list; what [`CaptureRequest::device`]
    /// refers to.
    pub index: usize,
    pub name: String,
    pub max_input_channels: u16,
    pub default_sample_rate: u32,
}

impl std::fmt::Display for InputDeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} ({} ch, {} Hz)",
            self.index, self.name, self.max_input_channels, self.default_sample_rate
        )
    }
}

/// Parameters of a single reference recording.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    /// Index into [`AudioBackend::input_devices`]; `None` for the host default.
    pub device: Option<usize>,
    pub sample_rate: u32,
    pub duration: Duration,
}

impl CaptureRequest {
    /// Number of mono samples a complete recording contains.
    pub fn expected_samples(&self) -> usize {
        (self.duration.as_secs_f64() * f64::from(self.sample_rate)).round() as usize
    }
}

// ---------------------------------------------------------------------------
// AudioBackend
// ---------------------------------------------------------------------------

/// Source of reference recordings and sink for playback.
pub trait AudioBackend {
    /// Input-capable devices in a stable order.
    fn input_devices(&self) -> Result<Vec<InputDeviceInfo>, CaptureError>;

    /// Record `request.duration` of mono audio, blocking.
    ///
    /// Returns [`CaptureError::Interrupted`] once `interrupt` is observed set.
    fn capture(&self, request: &CaptureRequest, interrupt: &AtomicBool) -> Result<Waveform, CaptureError>;

    /// Play `waveform` to the default output, blocking until it finishes.
    fn play(&self, waveform: &Waveform) -> Result<(), PlaybackError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_samples_rounds() {
        let req = CaptureRequest {
            device: None,
            sample_rate: 44_100,
            duration: Duration::from_millis(1_500),
        };
        assert_eq!(req.expected_samples(), 66_150);
    }

    #[test]
    fn device_info_display() {
        let info = InputDeviceInfo {
            index: 2,
            name: "USB Mic".into(),
            max_input_channels: 1,
            default_sample_rate: 48_000,
        };
        assert_eq!(info.to_string(), "[2] USB Mic (1 ch, 48000 Hz)");
    }

    #[test]
    fn unsupported_rate_message_names_device_and_rate() {
        let err = CaptureError::UnsupportedSampleRate {
            device: "Built-in".into(),
            sample_rate: 96_000,
        };
        let msg = err.to_string();
        assert!(msg.contains("Built-in") && msg.contains("96000"), "{msg}");
    }
}
