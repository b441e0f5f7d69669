//! Audio: waveforms, capture/playback adapters, resampling and reference checks.
//!
//! # Data flow
//!
//! ```text
//! AudioBackend::capture ──▶ Waveform (reference, mono f32)
//!   CpalBackend  (microphone, cpal)         │
//!   ToneBackend  (synthetic sine)           ├─▶ ReferenceCheck
//!                                           └─▶ resample(…, rate) ──▶ Waveform
//! AudioBackend::play ◀── Waveform
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::atomic::AtomicBool;
//! use std::time::Duration;
//! use snr_lab::audio::{resample, AudioBackend, CaptureRequest, ToneBackend};
//!
//! let backend = ToneBackend::new(440.0);
//! let request = CaptureRequest { device: None, sample_rate: 48_000, duration: Duration::from_secs(1) };
//! let reference = backend.capture(&request, &AtomicBool::new(false)).unwrap();
//!
//! let low = resample(&reference, 8_000).unwrap();
//! assert_eq!(low.len(), 8_000);
//! ```

pub mod backend;
pub mod capture;
pub mod playback;
pub mod quality;
pub mod resample;
pub mod tone;
pub mod waveform;

pub use backend::{AudioBackend, CaptureError, CaptureRequest, InputDeviceInfo, PlaybackError};
pub use capture::CpalBackend;
pub use quality::{QualityIssue, ReferenceCheck};
pub use resample::{align_to_len, resample, resampled_len, stereo_to_mono, ResampleError};
pub use tone::ToneBackend;
pub use waveform::Waveform;
