//! Sample-rate conversion and channel mixing.
//!
//! Three conversions live here:
//!
//! 1. [`stereo_to_mono`]: downmix interleaved device buffers to mono.
//! 2. [`resample`]: rational-ratio conversion of a [`Waveform`] to a new
//!    sample rate using `rubato`'s synchronous FFT resampler.
//! 3. [`align_to_len`]: linear interpolation of a sample slice onto a time
//!    axis of a different length.  Only used as a fallback when two signals
//!    of different origin rates must be compared and no rate-matched
//!    reference exists.
//!
//! ## Resampler
//!
//! `rubato::FftFixedIn` reduces `target / source` by the GCD of the two
//! rates and evaluates the band-limiting low-pass as an overlap-add FFT
//! convolution, the frequency-domain equivalent of a polyphase FIR.  The
//! filter has unity passband gain, so amplitude is preserved, and its
//! cutoff sits just below the lower of the two Nyquist frequencies.
//!
//! The filter delay reported by rubato is trimmed from the front of the
//! output and the tail is cut so the result has exactly
//! `round(len * target / source)` samples.

use rubato::{FftFixedIn, Resampler};
use thiserror::Error;

use super::Waveform;

/// Input chunk length handed to rubato per call.
const CHUNK_SIZE: usize = 1024;

/// FFT sub-chunks per input chunk.
const SUB_CHUNKS: usize = 2;

// ---------------------------------------------------------------------------
// ResampleError
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResampleError {
    #[error("invalid target sample rate: {0} Hz")]
    InvalidRate(u32),

    #[error("resampling {from} Hz -> {to} Hz failed: {reason}")]
    Filter { from: u32, to: u32, reason: String },
}

// ---------------------------------------------------------------------------
// stereo_to_mono
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging all channels.
///
/// The output length is `samples.len() / channels`.
///
/// * If `channels == 1` the input slice is returned as an owned `Vec`.
/// * If `channels == 0` an empty vector is returned.
///
/// # Example
///
/// ```rust
/// use snr_lab::audio::stereo_to_mono;
///
/// let stereo = vec![0.5_f32, -0.5, 0.2, -0.2]; // L R L R
/// let mono = stereo_to_mono(&stereo, 2);
/// assert_eq!(mono.len(), 2);
/// assert!((mono[0] - 0.0).abs() < 1e-6);
/// ```
pub fn stereo_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// resample
// ---------------------------------------------------------------------------

/// Number of samples a waveform of `len` samples has after conversion from
/// `from` Hz to `to` Hz: `round(len * to / from)`.
pub fn resampled_len(len: usize, from: u32, to: u32) -> usize {
    let from = u64::from(from);
    ((len as u64 * u64::from(to) + from / 2) / from) as usize
}

/// Convert `waveform` to `target_rate` Hz.
///
/// * Same rate: the input is returned unchanged (same sample buffer, no
///   filtering).
/// * Empty input: an empty waveform at `target_rate`.
///
/// # Errors
///
/// [`ResampleError::InvalidRate`] for `target_rate == 0`,
/// [`ResampleError::Filter`] when rubato rejects the rate pair.
///
/// # Example
///
/// ```rust
/// use snr_lab::audio::{resample, Waveform};
///
/// let w = Waveform::new(vec![0.25_f32; 4_800], 48_000);
/// let lo = resample(&w, 16_000).unwrap();
/// assert_eq!(lo.sample_rate(), 16_000);
/// assert_eq!(lo.len(), 1_600);
///
/// let same = resample(&w, 48_000).unwrap();
/// assert_eq!(same, w);
/// ```
pub fn resample(waveform: &Waveform, target_rate: u32) -> Result<Waveform, ResampleError> {
    if target_rate == 0 {
        return Err(ResampleError::InvalidRate(target_rate));
    }

    let source_rate = waveform.sample_rate();
    if source_rate == target_rate {
        return Ok(waveform.clone());
    }

    if waveform.is_empty() {
        return Ok(Waveform::empty(target_rate));
    }

    let filter_err = |reason: String| ResampleError::Filter {
        from: source_rate,
        to: target_rate,
        reason,
    };

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        target_rate as usize,
        CHUNK_SIZE,
        SUB_CHUNKS,
        1, // mono
    )
    .map_err(|e| filter_err(e.to_string()))?;

    let samples = waveform.samples();
    let expected = resampled_len(samples.len(), source_rate, target_rate);
    let delay = resampler.output_delay();
    let needed = expected + delay;

    let mut output: Vec<f32> = Vec::with_capacity(needed + resampler.output_frames_max());
    let mut chunk: Vec<f32> = Vec::with_capacity(resampler.input_frames_max());
    let mut pos = 0;

    // Feed the input, then zeros, until the delayed output covers `expected`.
    while output.len() < needed {
        let frames = resampler.input_frames_next();
        chunk.clear();
        if pos < samples.len() {
            let end = (pos + frames).min(samples.len());
            chunk.extend_from_slice(&samples[pos..end]);
        }
        chunk.resize(frames, 0.0);
        pos += frames;

        let out = resampler
            .process(std::slice::from_ref(&chunk), None)
            .map_err(|e| filter_err(e.to_string()))?;
        if let Some(channel) = out.first() {
            output.extend_from_slice(channel);
        }
    }

    output.drain(..delay);
    output.truncate(expected);

    log::trace!(
        "resample: {} samples @ {} Hz -> {} samples @ {} Hz",
        samples.len(),
        source_rate,
        output.len(),
        target_rate
    );

    Ok(Waveform::new(output, target_rate))
}

// ---------------------------------------------------------------------------
// align_to_len
// ---------------------------------------------------------------------------

/// Linearly interpolate `samples` onto a time axis of `len` points.
///
/// Both signals are assumed to span the same duration: output point `j`
/// sits at `j / len` of the way through, which maps to fractional input
/// index `j * samples.len() / len`.  Positions past the last input sample
/// hold the last value.
///
/// * `samples.len() == len`: returned as-is.
/// * empty `samples` or `len == 0`: empty vector.
///
/// ```rust
/// use snr_lab::audio::align_to_len;
///
/// let ramp = [0.0_f32, 1.0, 2.0, 3.0];
/// let stretched = align_to_len(&ramp, 8);
/// assert_eq!(stretched, vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.0]);
/// ```
pub fn align_to_len(samples: &[f32], len: usize) -> Vec<f32> {
    if samples.len() == len {
        return samples.to_vec();
    }

    if samples.is_empty() || len == 0 {
        return Vec::new();
    }

    let step = samples.len() as f64 / len as f64;
    let mut output = Vec::with_capacity(len);

    for j in 0..len {
        let src_pos = j as f64 * step;
        let idx = src_pos as usize;
        let frac = (src_pos - idx as f64) as f32;

        let sample = if idx + 1 < samples.len() {
            samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
        } else {
            samples[samples.len() - 1]
        };

        output.push(sample);
    }

    output
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(freq: f32, amplitude: f32, rate: u32, len: usize) -> Waveform {
        let samples: Vec<f32> = (0..len)
            .map(|i| amplitude * (2.0 * PI * freq * i as f32 / rate as f32).sin())
            .collect();
        Waveform::new(samples, rate)
    }

    /// RMS of the middle half, away from filter edge transients.
    fn middle_rms(samples: &[f32]) -> f64 {
        let quarter = samples.len() / 4;
        let mid = &samples[quarter..samples.len() - quarter];
        (mid.iter().map(|&s| f64::from(s) * f64::from(s)).sum::<f64>() / mid.len() as f64).sqrt()
    }

    // ---- stereo_to_mono ----------------------------------------------------

    #[test]
    fn stereo_to_mono_already_mono() {
        let input = vec![0.1_f32, 0.2, 0.3];
        assert_eq!(stereo_to_mono(&input, 1), input);
    }

    #[test]
    fn stereo_to_mono_two_channel() {
        let out = stereo_to_mono(&[1.0_f32, -1.0, 0.5, 0.5], 2);
        assert_eq!(out.len(), 2);
        assert!((out[0] - 0.0).abs() < 1e-6);
        assert!((out[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn stereo_to_mono_zero_channels() {
        assert!(stereo_to_mono(&[1.0_f32, 2.0], 0).is_empty());
    }

    // ---- resample ----------------------------------------------------------

    #[test]
    fn same_rate_is_identity() {
        let w = sine(440.0, 0.5, 44_100, 4_410);
        let out = resample(&w, 44_100).unwrap();
        assert_eq!(out, w);
        assert!(out.shares_samples_with(&w));
    }

    #[test]
    fn zero_target_rate_rejected() {
        let w = Waveform::new(vec![0.0_f32; 10], 8_000);
        assert_eq!(resample(&w, 0), Err(ResampleError::InvalidRate(0)));
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let out = resample(&Waveform::empty(48_000), 16_000).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.sample_rate(), 16_000);
    }

    #[test]
    fn output_length_is_rounded_ratio() {
        assert_eq!(resampled_len(480, 48_000, 16_000), 160);
        assert_eq!(resampled_len(44_100, 44_100, 16_000), 16_000);
        // 1000 * 8000 / 44100 = 181.4
        assert_eq!(resampled_len(1_000, 44_100, 8_000), 181);
        // 3000 * 8000 / 44100 = 544.2
        assert_eq!(resampled_len(3_000, 44_100, 8_000), 544);

        let w = Waveform::new(vec![0.1_f32; 1_000], 44_100);
        assert_eq!(resample(&w, 8_000).unwrap().len(), 181);

        let w = Waveform::new(vec![0.1_f32; 800], 8_000);
        assert_eq!(resample(&w, 44_100).unwrap().len(), 4_410);
    }

    #[test]
    fn constant_signal_keeps_level() {
        let w = Waveform::new(vec![0.5_f32; 48_000], 48_000);
        let out = resample(&w, 16_000).unwrap();
        let quarter = out.len() / 4;
        for &s in &out.samples()[quarter..out.len() - quarter] {
            assert!((s - 0.5).abs() < 1e-2, "amplitude drift: {s}");
        }
    }

    #[test]
    fn sine_amplitude_preserved_when_downsampling() {
        let w = sine(1_000.0, 0.5, 48_000, 48_000);
        let out = resample(&w, 16_000).unwrap();
        let expected = 0.5 / 2f64.sqrt();
        let got = middle_rms(out.samples());
        assert!((got - expected).abs() / expected < 0.01, "rms {got} vs {expected}");
    }

    #[test]
    fn round_trip_through_44100_preserves_energy() {
        // 5 s at 96 kHz, content well below 22.05 kHz
        let w = sine(1_000.0, 0.8, 96_000, 480_000);
        let down = resample(&w, 44_100).unwrap();
        assert_eq!(down.len(), 220_500);
        let back = resample(&down, 96_000).unwrap();
        assert_eq!(back.len(), w.len());
        assert_eq!(back.sample_rate(), 96_000);

        let before = middle_rms(w.samples());
        let after = middle_rms(back.samples());
        assert!((after - before).abs() / before < 0.01, "rms {after} vs {before}");
    }

    #[test]
    fn content_above_new_nyquist_is_removed() {
        // 7 kHz is above the 4 kHz Nyquist of an 8 kHz output
        let w = sine(7_000.0, 0.5, 48_000, 48_000);
        let out = resample(&w, 8_000).unwrap();
        let got = middle_rms(out.samples());
        assert!(got < 0.02, "aliased energy left: rms {got}");
    }

    #[test]
    fn round_trip_96k_44k1_preserves_energy() {
        // 5 s at 96 kHz, 32-bit float reference
        let w = sine(1_000.0, 0.5, 96_000, 5 * 96_000);
        let down = resample(&w, 44_100).unwrap();
        assert_eq!(down.len(), 5 * 44_100);

        let back = resample(&down, 96_000).unwrap();
        assert_eq!(back.len(), w.len());
        assert_eq!(back.sample_rate(), 96_000);

        let ratio = back.energy() / w.energy();
        assert!((ratio - 1.0).abs() < 0.01, "energy ratio {ratio}");
    }

    #[test]
    fn resample_is_deterministic() {
        let w = sine(300.0, 0.7, 44_100, 10_000);
        assert_eq!(resample(&w, 16_000).unwrap(), resample(&w, 16_000).unwrap());
    }

    // ---- align_to_len ------------------------------------------------------

    #[test]
    fn align_same_length_is_copy() {
        let input = vec![0.1_f32, 0.2, 0.3];
        assert_eq!(align_to_len(&input, 3), input);
    }

    #[test]
    fn align_empty_inputs() {
        assert!(align_to_len(&[], 10).is_empty());
        assert!(align_to_len(&[1.0_f32], 0).is_empty());
    }

    #[test]
    fn align_shrinks_by_picking_time_points() {
        let input: Vec<f32> = (0..8).map(|i| i as f32).collect();
        assert_eq!(align_to_len(&input, 4), vec![0.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn align_constant_signal_stays_constant() {
        let out = align_to_len(&[0.4_f32; 441], 160);
        assert_eq!(out.len(), 160);
        assert!(out.iter().all(|&s| (s - 0.4).abs() < 1e-6));
    }
}
