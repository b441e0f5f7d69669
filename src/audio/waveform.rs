//! Immutable mono waveform.
//!
//! A [`Waveform`] is the unit of data that flows through the whole tool:
//! capture produces one, the resampler and quantizer each produce a new one,
//! and the SNR estimator compares two of them.  Samples live behind an
//! `Arc<[f32]>`, so cloning a waveform never copies audio and no transform
//! can mutate a waveform another stage still holds.
//!
//! # Example
//!
//! ```rust
//! use snr_lab::audio::Waveform;
//!
//! // 1 second of a 440 Hz tone at 16 kHz
//! let samples: Vec<f32> = (0..16_000)
//!     .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 16_000.0).sin() * 0.5)
//!     .collect();
//!
//! let w = Waveform::new(samples, 16_000);
//! assert_eq!(w.len(), 16_000);
//! assert!((w.duration_secs() - 1.0).abs() < 1e-9);
//! assert!((w.rms() - 0.5 / 2f64.sqrt()).abs() < 1e-3);
//! ```

use std::sync::Arc;

// ---------------------------------------------------------------------------
// Waveform
// ---------------------------------------------------------------------------

/// Mono `f32` samples tagged with their sample rate.
///
/// Samples are conventionally in `[-1.0, 1.0]` but the type does not enforce
/// it; use [`Waveform::clipped`] before anything that depends on the range.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Arc<[f32]>,
    sample_rate: u32,
}

impl Waveform {
    /// Wrap `samples` recorded at `sample_rate` Hz.
    ///
    /// # Panics
    ///
    /// Panics if `sample_rate == 0`.
    pub fn new(samples: impl Into<Arc<[f32]>>, sample_rate: u32) -> Self {
        assert!(sample_rate > 0, "Waveform sample rate must be > 0");
        Self {
            samples: samples.into(),
            sample_rate,
        }
    }

    /// A waveform with no samples at `sample_rate` Hz.
    pub fn empty(sample_rate: u32) -> Self {
        Self::new(Vec::new(), sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel count.  Only mono is supported.
    pub fn channels(&self) -> u16 {
        1
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Sum of squared samples.
    pub fn energy(&self) -> f64 {
        self.samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum()
    }

    /// Mean of squared samples, `0.0` for an empty waveform.
    pub fn mean_power(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.energy() / self.samples.len() as f64
    }

    /// Root-mean-square amplitude.
    pub fn rms(&self) -> f64 {
        self.mean_power().sqrt()
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max)
    }

    /// A copy with every sample clamped to `[-1.0, 1.0]`.
    ///
    /// Returns a cheap clone when nothing is out of range.
    pub fn clipped(&self) -> Waveform {
        if self.samples.iter().all(|s| (-1.0..=1.0).contains(s)) {
            return self.clone();
        }
        let samples: Vec<f32> = self.samples.iter().map(|s| s.clamp(-1.0, 1.0)).collect();
        Waveform::new(samples, self.sample_rate)
    }

    /// `true` when both waveforms point at the same sample buffer.
    pub fn shares_samples_with(&self, other: &Waveform) -> bool {
        Arc::ptr_eq(&self.samples, &other.samples)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_matches_rate() {
        let w = Waveform::new(vec![0.0_f32; 44_100], 44_100);
        assert!((w.duration_secs() - 1.0).abs() < 1e-12);
        assert_eq!(w.channels(), 1);
    }

    #[test]
    #[should_panic(expected = "sample rate must be > 0")]
    fn zero_rate_panics() {
        let _ = Waveform::new(vec![0.0_f32; 4], 0);
    }

    #[test]
    fn empty_waveform_has_zero_power() {
        let w = Waveform::empty(8_000);
        assert!(w.is_empty());
        assert_eq!(w.mean_power(), 0.0);
        assert_eq!(w.rms(), 0.0);
        assert_eq!(w.peak(), 0.0);
    }

    #[test]
    fn constant_signal_power() {
        let w = Waveform::new(vec![0.5_f32; 1_000], 8_000);
        assert!((w.mean_power() - 0.25).abs() < 1e-9);
        assert!((w.energy() - 250.0).abs() < 1e-6);
        assert!((w.rms() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn clipped_clamps_out_of_range() {
        let w = Waveform::new(vec![1.5_f32, -2.0, 0.25], 8_000);
        let c = w.clipped();
        assert_eq!(c.samples(), &[1.0, -1.0, 0.25]);
        assert_eq!(c.sample_rate(), 8_000);
        // the source waveform is untouched
        assert_eq!(w.samples()[0], 1.5);
    }

    #[test]
    fn clipped_in_range_shares_buffer() {
        let w = Waveform::new(vec![0.1_f32, -0.9, 1.0], 8_000);
        assert!(w.clipped().shares_samples_with(&w));
    }

    #[test]
    fn clone_shares_buffer() {
        let w = Waveform::new(vec![0.3_f32; 16], 16_000);
        let c = w.clone();
        assert!(c.shares_samples_with(&w));
        assert_eq!(c, w);
    }

    #[test]
    fn peak_uses_absolute_value() {
        let w = Waveform::new(vec![0.2_f32, -0.8, 0.5], 8_000);
        assert!((w.peak() - 0.8).abs() < 1e-7);
    }
}
