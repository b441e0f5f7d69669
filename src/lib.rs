//! snr-lab: measure how much fidelity a recording loses at lower sample
//! rates and bit depths.
//!
//! ```text
//! AudioBackend::capture → reference Waveform
//!   for rate in rates:   resample(reference, rate)
//!     for depth in depths: encode → WAV artifact
//!                          quantize (preview) → compute_snr vs rate-matched reference
//! → RunReport (sorted by SNR) → ReportSink
//! ```

pub mod atomic;
pub mod audio;
pub mod codec;
pub mod config;
pub mod interactive;
pub mod metrics;
pub mod pipeline;
pub mod report;
