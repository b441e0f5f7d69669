//! Fidelity metrics.
//!
//! Only one metric is computed: the signal-to-noise ratio of a degraded
//! waveform against the reference, see [`snr`].

pub mod snr;

pub use snr::{align_reference, compare, compute_snr, try_compute_snr, SnrError, SNR_SENTINEL};
