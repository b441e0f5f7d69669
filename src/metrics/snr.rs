//! Signal-to-noise ratio between a reference and a degraded signal.
//!
//! ```text
//! noise        = reference - test
//! signal_power = mean(reference²)
//! noise_power  = mean(noise²)
//! SNR          = 10 · log10(signal_power / noise_power)   [dB]
//! ```
//!
//! This is a plain power ratio.  It says how far the degraded samples are
//! from the reference samples and nothing about how the difference sounds;
//! it is not a perceptual metric.
//!
//! | Input                                   | Result   |
//! |-----------------------------------------|----------|
//! | empty, or lengths differ                | `-∞` ([`SNR_SENTINEL`]) |
//! | `noise_power == 0`, `signal_power > 0`  | `+∞`     |
//! | `noise_power == 0`, `signal_power == 0` | `0.0`    |
//!
//! The silent/silent case returns `0.0` rather than `NaN` so results stay
//! sortable.
//!
//! [`compare`] handles two [`Waveform`]s that do not line up: a different
//! rate is fixed by resampling the reference to the test's rate, and any
//! remaining length difference by linear interpolation.

use thiserror::Error;

use crate::audio::{align_to_len, resample, Waveform};

/// SNR reported when the inputs cannot be compared.
pub const SNR_SENTINEL: f64 = f64::NEG_INFINITY;

// ---------------------------------------------------------------------------
// SnrError
// ---------------------------------------------------------------------------

/// Inputs for which no SNR exists.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SnrError {
    #[error("cannot compute SNR of empty signals")]
    Empty,

    #[error("cannot compute SNR: reference has {reference} samples, test has {test}")]
    LengthMismatch { reference: usize, test: usize },

    #[error("cannot compute SNR: signal contains NaN or infinite samples")]
    NonFinite,
}

// ---------------------------------------------------------------------------
// compute_snr
// ---------------------------------------------------------------------------

/// SNR in dB, or the reason it is undefined.
pub fn try_compute_snr(reference: &[f32], test: &[f32]) -> Result<f64, SnrError> {
    if reference.len() != test.len() {
        return Err(SnrError::LengthMismatch {
            reference: reference.len(),
            test: test.len(),
        });
    }
    if reference.is_empty() {
        return Err(SnrError::Empty);
    }

    let n = reference.len() as f64;
    let (signal_sum, noise_sum) = reference.iter().zip(test).fold(
        (0.0_f64, 0.0_f64),
        |(signal, noise), (&r, &t)| {
            let r = f64::from(r);
            let e = r - f64::from(t);
            (signal + r * r, noise + e * e)
        },
    );
    let signal_power = signal_sum / n;
    let noise_power = noise_sum / n;
    if !(signal_power.is_finite() && noise_power.is_finite()) {
        return Err(SnrError::NonFinite);
    }

    if noise_power <= 0.0 {
        return Ok(if signal_power > 0.0 { f64::INFINITY } else { 0.0 });
    }

    Ok(10.0 * (signal_power / noise_power).log10())
}

/// SNR in dB; degenerate inputs yield [`SNR_SENTINEL`] instead of an error.
///
/// ```rust
/// use snr_lab::metrics::{compute_snr, SNR_SENTINEL};
///
/// let x = [0.5_f32, -0.25, 0.125];
/// assert_eq!(compute_snr(&x, &x), f64::INFINITY);
/// assert_eq!(compute_snr(&x, &x[..2]), SNR_SENTINEL);
/// assert_eq!(compute_snr(&[], &[]), SNR_SENTINEL);
/// ```
pub fn compute_snr(reference: &[f32], test: &[f32]) -> f64 {
    try_compute_snr(reference, test).unwrap_or_else(|e| {
        log::warn!("snr: {e}");
        SNR_SENTINEL
    })
}

// ---------------------------------------------------------------------------
// compare
// ---------------------------------------------------------------------------

/// Bring `reference` onto the rate and length of `test`.
///
/// Resampling handles a rate difference.  If the lengths still differ
/// afterwards the reference is linearly interpolated onto the test's time
/// axis, which is the less accurate fallback and is logged.
pub fn align_reference(reference: &Waveform, test: &Waveform) -> Waveform {
    let rate_matched = if reference.sample_rate() == test.sample_rate() {
        reference.clone()
    } else {
        match resample(reference, test.sample_rate()) {
            Ok(w) => w,
            Err(e) => {
                log::warn!("snr: {e}; falling back to interpolation");
                reference.clone()
            }
        }
    };

    if rate_matched.len() == test.len() && rate_matched.sample_rate() == test.sample_rate() {
        return rate_matched;
    }

    log::debug!(
        "snr: interpolating reference ({} samples) onto test axis ({} samples)",
        rate_matched.len(),
        test.len()
    );
    Waveform::new(
        align_to_len(rate_matched.samples(), test.len()),
        test.sample_rate(),
    )
}

/// SNR of `test` against `reference` after [`align_reference`].
pub fn compare(reference: &Waveform, test: &Waveform) -> f64 {
    let aligned = align_reference(reference, test);
    compute_snr(aligned.samples(), test.samples())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{quantize, BitDepth};
    use std::f32::consts::PI;

    fn sine(freq: f32, amplitude: f32, rate: u32, len: usize) -> Waveform {
        let samples: Vec<f32> = (0..len)
            .map(|i| amplitude * (2.0 * PI * freq * i as f32 / rate as f32).sin())
            .collect();
        Waveform::new(samples, rate)
    }

    #[test]
    fn identical_signals_are_infinite() {
        let w = sine(440.0, 0.5, 8_000, 800);
        assert_eq!(compute_snr(w.samples(), w.samples()), f64::INFINITY);
    }

    #[test]
    fn empty_input_is_sentinel() {
        assert_eq!(compute_snr(&[], &[]), SNR_SENTINEL);
        assert_eq!(try_compute_snr(&[], &[]), Err(SnrError::Empty));
    }

    #[test]
    fn non_finite_samples_are_sentinel() {
        let reference = [0.5_f32, -0.5, 0.25];
        let test = [0.5_f32, f32::NAN, 0.25];
        assert_eq!(try_compute_snr(&reference, &test), Err(SnrError::NonFinite));
        assert_eq!(compute_snr(&reference, &test), SNR_SENTINEL);
        assert_eq!(compute_snr(&[f32::INFINITY, 0.0], &[0.0, 0.0]), SNR_SENTINEL);
    }

    #[test]
    fn length_mismatch_is_sentinel() {
        let a = [0.1_f32; 10];
        let b = [0.1_f32; 9];
        assert_eq!(compute_snr(&a, &b), SNR_SENTINEL);
        assert_eq!(
            try_compute_snr(&a, &b),
            Err(SnrError::LengthMismatch { reference: 10, test: 9 })
        );
        // one side empty is a mismatch, not a panic
        assert_eq!(compute_snr(&a, &[]), SNR_SENTINEL);
    }

    #[test]
    fn silence_against_silence_is_zero() {
        let z = [0.0_f32; 100];
        assert_eq!(compute_snr(&z, &z), 0.0);
    }

    #[test]
    fn silent_reference_with_noise_is_negative_infinity() {
        let z = [0.0_f32; 4];
        let n = [0.1_f32; 4];
        assert_eq!(compute_snr(&z, &n), f64::NEG_INFINITY);
    }

    #[test]
    fn known_ratio() {
        // signal power 1.0, noise power 0.01 → 20 dB
        let reference = [1.0_f32, -1.0, 1.0, -1.0];
        let test = [0.9_f32, -0.9, 0.9, -0.9];
        let snr = compute_snr(&reference, &test);
        assert!((snr - 20.0).abs() < 1e-4, "snr = {snr}");
    }

    #[test]
    fn quantized_sine_tracks_theoretical_bound() {
        let w = sine(997.0, 1.0, 48_000, 48_000);

        let snr8 = compare(&w, &quantize(&w, BitDepth::Eight));
        let snr16 = compare(&w, &quantize(&w, BitDepth::Sixteen));
        let snr24 = compare(&w, &quantize(&w, BitDepth::TwentyFour));

        let bound8 = BitDepth::Eight.theoretical_snr_db().unwrap();
        let bound16 = BitDepth::Sixteen.theoretical_snr_db().unwrap();
        assert!((snr8 - bound8).abs() < 3.0, "8-bit: {snr8} vs {bound8}");
        assert!((snr16 - bound16).abs() < 3.0, "16-bit: {snr16} vs {bound16}");
        assert!(snr8 < snr16 && snr16 < snr24, "{snr8} < {snr16} < {snr24}");
    }

    #[test]
    fn snr_falls_as_bits_drop() {
        let w = sine(440.0, 0.8, 16_000, 16_000);
        let snrs: Vec<f64> = [BitDepth::TwentyFour, BitDepth::Sixteen, BitDepth::Twelve, BitDepth::Eight]
            .into_iter()
            .map(|d| compare(&w, &quantize(&w, d)))
            .collect();
        assert!(snrs.windows(2).all(|p| p[0] > p[1]), "{snrs:?}");
    }

    #[test]
    fn passthrough_scores_infinite() {
        let w = sine(440.0, 0.8, 16_000, 1_600);
        assert_eq!(compare(&w, &quantize(&w, BitDepth::ThirtyTwo)), f64::INFINITY);
    }

    #[test]
    fn compare_resamples_reference_to_test_rate() {
        let reference = sine(500.0, 0.5, 48_000, 48_000);
        let test = resample(&reference, 16_000).unwrap();
        let aligned = align_reference(&reference, &test);
        assert_eq!(aligned.sample_rate(), 16_000);
        assert_eq!(aligned.len(), test.len());
        assert_eq!(compare(&reference, &test), f64::INFINITY);
    }

    #[test]
    fn compare_interpolates_leftover_length_difference() {
        let reference = Waveform::new(vec![0.25_f32; 100], 8_000);
        let test = Waveform::new(vec![0.25_f32; 80], 8_000);
        let aligned = align_reference(&reference, &test);
        assert_eq!(aligned.len(), 80);
        assert_eq!(compare(&reference, &test), f64::INFINITY);
    }
}
