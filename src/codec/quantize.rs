//! Quantizer.
//!
//! Two views of the same operation:
//!
//! * [`quantize`]: *lossy preview*.  Clip, scale by `max_value`, round,
//!   scale back.  The result is a float [`Waveform`] carrying exactly the
//!   quantization error, which is what the SNR estimator scores.
//! * [`encode`]: the integer codes that go into the WAV file, in the
//!   storage type of the depth (see [`BitDepth::storage`]).  [`decode`]
//!   turns them back into a float waveform.
//!
//! Both clip to `[-1, 1]` first so out-of-range input saturates instead of
//! wrapping.  32-bit is a pass-through in both views.
//!
//! ```rust
//! use snr_lab::audio::Waveform;
//! use snr_lab::codec::{quantize, BitDepth};
//!
//! let w = Waveform::new(vec![0.3_f32, -0.7, 1.4], 8_000);
//! let q = quantize(&w, BitDepth::Eight);
//!
//! let max_err = 1.0 / 127.0;
//! assert!((q.samples()[0] - 0.3).abs() <= max_err);
//! assert_eq!(q.samples()[2], 1.0); // clipped, not wrapped
//! ```

use crate::audio::Waveform;

use super::bit_depth::{BitDepth, FormatError, RangeTransform, StorageKind};

// ---------------------------------------------------------------------------
// EncodedWaveform
// ---------------------------------------------------------------------------

/// Integer (or float) codes in the storage type of a [`BitDepth`].
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedSamples {
    Unsigned8(Vec<u8>),
    /// 16-bit container; also holds 12-bit codes shifted left by 4.
    Signed16(Vec<i16>),
    /// 24-bit codes sign-extended into `i32`.
    Signed24(Vec<i32>),
    Float32(Vec<f32>),
}

impl EncodedSamples {
    pub fn len(&self) -> usize {
        match self {
            EncodedSamples::Unsigned8(s) => s.len(),
            EncodedSamples::Signed16(s) => s.len(),
            EncodedSamples::Signed24(s) => s.len(),
            EncodedSamples::Float32(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn storage(&self) -> StorageKind {
        match self {
            EncodedSamples::Unsigned8(_) => StorageKind::UnsignedPcm8,
            EncodedSamples::Signed16(_) => StorageKind::SignedPcm16,
            EncodedSamples::Signed24(_) => StorageKind::SignedPcm24,
            EncodedSamples::Float32(_) => StorageKind::Float32,
        }
    }
}

/// A waveform in its on-disk representation.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedWaveform {
    depth: BitDepth,
    sample_rate: u32,
    samples: EncodedSamples,
}

impl EncodedWaveform {
    /// Wrap already-encoded `samples`.
    ///
    /// Returns `None` when the storage type of `samples` does not match
    /// `depth`.
    pub fn from_parts(depth: BitDepth, sample_rate: u32, samples: EncodedSamples) -> Option<Self> {
        (samples.storage() == depth.storage() && sample_rate > 0).then_some(Self {
            depth,
            sample_rate,
            samples,
        })
    }

    pub fn depth(&self) -> BitDepth {
        self.depth
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &EncodedSamples {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// ---------------------------------------------------------------------------
// quantize (lossy preview)
// ---------------------------------------------------------------------------

/// Quantize `waveform` to `depth` and return the float result.
///
/// Per sample: `round(clip(x) * max) / max` with `max = 2^(bits-1) - 1`.
/// 32-bit returns the input unchanged.
pub fn quantize(waveform: &Waveform, depth: BitDepth) -> Waveform {
    let Some(max) = depth.max_value() else {
        return waveform.clone();
    };

    let max = f64::from(max);
    let samples: Vec<f32> = waveform
        .samples()
        .iter()
        .map(|&s| ((f64::from(s.clamp(-1.0, 1.0)) * max).round() / max) as f32)
        .collect();

    Waveform::new(samples, waveform.sample_rate())
}

/// [`quantize`] for a raw bit count.
///
/// # Errors
///
/// [`FormatError::UnsupportedBitDepth`] for anything but 8, 12, 16, 24, 32.
pub fn quantize_bits(waveform: &Waveform, bits: u16) -> Result<Waveform, FormatError> {
    Ok(quantize(waveform, BitDepth::try_from(bits)?))
}

// ---------------------------------------------------------------------------
// encode / decode
// ---------------------------------------------------------------------------

/// Integer code for one clipped sample, before container shifting.
fn to_code(sample: f64, depth: BitDepth, max: f64) -> f64 {
    match depth.range_transform() {
        RangeTransform::Bipolar => (sample * max).round(),
        RangeTransform::Unipolar => ((sample + 1.0) / 2.0 * unipolar_max(depth)).round(),
    }
}

/// Inverse of [`to_code`].
fn from_code(code: f64, depth: BitDepth, max: f64) -> f64 {
    match depth.range_transform() {
        RangeTransform::Bipolar => code / max,
        RangeTransform::Unipolar => code / unipolar_max(depth) * 2.0 - 1.0,
    }
}

/// Top of the unsigned code range, `2^bits - 1`.
fn unipolar_max(depth: BitDepth) -> f64 {
    f64::from((1u32 << depth.bits()) - 1)
}

/// Encode `waveform` into the storage codes of `depth`.
///
/// * 8-bit: `[-1,1]` is remapped to `[0,1]` and scaled to `0..=255`.
/// * 12/16/24-bit: `round(clip(x) * max)`, 12-bit shifted into a 16-bit
///   container.
/// * 32-bit: the float samples as-is.
pub fn encode(waveform: &Waveform, depth: BitDepth) -> EncodedWaveform {
    let input = waveform.samples();
    let max = depth.max_value().map(f64::from).unwrap_or(1.0);
    let shift = depth.container_shift();
    let codes = move || {
        input
            .iter()
            .map(move |&s| to_code(f64::from(s.clamp(-1.0, 1.0)), depth, max))
    };

    let samples = match depth.storage() {
        StorageKind::Float32 => EncodedSamples::Float32(input.to_vec()),
        StorageKind::UnsignedPcm8 => EncodedSamples::Unsigned8(codes().map(|c| c as u8).collect()),
        StorageKind::SignedPcm16 => EncodedSamples::Signed16(
            codes().map(|c| ((c as i32) << shift) as i16).collect(),
        ),
        StorageKind::SignedPcm24 => EncodedSamples::Signed24(codes().map(|c| c as i32).collect()),
    };

    EncodedWaveform {
        depth,
        sample_rate: waveform.sample_rate(),
        samples,
    }
}

/// Convert storage codes back to a float waveform in `[-1, 1]`.
pub fn decode(encoded: &EncodedWaveform) -> Waveform {
    let depth = encoded.depth;
    let max = depth.max_value().map(f64::from).unwrap_or(1.0);
    let container = f64::from(1u32 << depth.container_shift());
    let value = |code: f64| from_code(code / container, depth, max) as f32;

    let samples: Vec<f32> = match &encoded.samples {
        EncodedSamples::Float32(samples) => samples.clone(),
        EncodedSamples::Unsigned8(codes) => codes.iter().map(|&c| value(f64::from(c))).collect(),
        EncodedSamples::Signed16(codes) => codes.iter().map(|&c| value(f64::from(c))).collect(),
        EncodedSamples::Signed24(codes) => codes.iter().map(|&c| value(f64::from(c))).collect(),
    };

    Waveform::new(samples, encoded.sample_rate)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
