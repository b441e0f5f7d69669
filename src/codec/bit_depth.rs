//! Supported bit depths and their storage formats.
//!
//! Every depth dispatches through one row of a fixed table:
//!
//! | Depth | `max_value` | Storage          | Range transform         |
//! |-------|-------------|------------------|-------------------------|
//! | 8     | 127         | unsigned 8-bit   | `[-1,1]` → `[0,1]`      |
//! | 12    | 2047        | signed 16-bit ¹  | none                    |
//! | 16    | 32767       | signed 16-bit    | none                    |
//! | 24    | 8388607     | signed 24-bit    | none                    |
//! | 32    | n/a         | 32-bit float     | none (pass-through)     |
//!
//! ¹ 12-bit codes are left-aligned in a 16-bit container (shifted by 4) so
//! the file plays back at the right level; the low 4 bits are always zero.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// FormatError
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("unsupported bit depth: {0} (supported: 8, 12, 16, 24, 32)")]
    UnsupportedBitDepth(u16),
}

// ---------------------------------------------------------------------------
// StorageKind / RangeTransform
// ---------------------------------------------------------------------------

/// WAV sample subtype a depth is persisted as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    UnsignedPcm8,
    SignedPcm16,
    SignedPcm24,
    Float32,
}

impl StorageKind {
    /// `bits_per_sample` written to the WAV header.
    pub fn bits_per_sample(self) -> u16 {
        match self {
            StorageKind::UnsignedPcm8 => 8,
            StorageKind::SignedPcm16 => 16,
            StorageKind::SignedPcm24 => 24,
            StorageKind::Float32 => 32,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, StorageKind::Float32)
    }
}

/// Mapping applied to a clipped sample before it is scaled to integer codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeTransform {
    /// Keep `[-1, 1]`; codes are symmetric around zero.
    Bipolar,
    /// Remap `[-1, 1]` to `[0, 1]`; codes run from zero to the unsigned max.
    Unipolar,
}

// ---------------------------------------------------------------------------
// Format table
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct DepthFormat {
    bits: u16,
    /// `2^(bits-1) - 1`, `None` for the float pass-through.
    max_value: Option<u32>,
    storage: StorageKind,
    range: RangeTransform,
    /// Left shift applied to integer codes inside the storage container.
    container_shift: u32,
}

const FORMATS: [DepthFormat; 5] = [
    DepthFormat {
        bits: 8,
        max_value: Some(127),
        storage: StorageKind::UnsignedPcm8,
        range: RangeTransform::Unipolar,
        container_shift: 0,
    },
    DepthFormat {
        bits: 12,
        max_value: Some(2_047),
        storage: StorageKind::SignedPcm16,
        range: RangeTransform::Bipolar,
        container_shift: 4,
    },
    DepthFormat {
        bits: 16,
        max_value: Some(32_767),
        storage: StorageKind::SignedPcm16,
        range: RangeTransform::Bipolar,
        container_shift: 0,
    },
    DepthFormat {
        bits: 24,
        max_value: Some(8_388_607),
        storage: StorageKind::SignedPcm24,
        range: RangeTransform::Bipolar,
        container_shift: 0,
    },
    DepthFormat {
        bits: 32,
        max_value: None,
        storage: StorageKind::Float32,
        range: RangeTransform::Bipolar,
        container_shift: 0,
    },
];

// ---------------------------------------------------------------------------
// BitDepth
// ---------------------------------------------------------------------------

/// A supported quantization depth.
///
/// Serialised as the plain bit count (`8`, `16`, …); deserialising any
/// other number fails with [`FormatError::UnsupportedBitDepth`].
///
/// ```rust
/// use snr_lab::codec::{BitDepth, FormatError};
///
/// assert_eq!(BitDepth::try_from(16).unwrap(), BitDepth::Sixteen);
/// assert_eq!(BitDepth::Sixteen.max_value(), Some(32_767));
/// assert_eq!(BitDepth::try_from(20), Err(FormatError::UnsupportedBitDepth(20)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum BitDepth {
    Eight,
    Twelve,
    Sixteen,
    TwentyFour,
    ThirtyTwo,
}

impl BitDepth {
    pub const ALL: [BitDepth; 5] = [
        BitDepth::Eight,
        BitDepth::Twelve,
        BitDepth::Sixteen,
        BitDepth::TwentyFour,
        BitDepth::ThirtyTwo,
    ];

    fn format(self) -> &'static DepthFormat {
        &FORMATS[self as usize]
    }

    pub fn bits(self) -> u16 {
        self.format().bits
    }

    /// Largest positive integer code, `2^(bits-1) - 1`.  `None` for 32-bit,
    /// which is stored as float without quantization.
    pub fn max_value(self) -> Option<u32> {
        self.format().max_value
    }

    pub fn storage(self) -> StorageKind {
        self.format().storage
    }

    pub fn range_transform(self) -> RangeTransform {
        self.format().range
    }

    pub(crate) fn container_shift(self) -> u32 {
        self.format().container_shift
    }

    /// `true` for the 32-bit float pass-through.
    pub fn is_passthrough(self) -> bool {
        self.max_value().is_none()
    }

    /// Ideal SNR of a uniform quantizer for a full-scale sine,
    /// `6.02 * bits + 1.76` dB.  Only defined for integer depths (≤ 24).
    pub fn theoretical_snr_db(self) -> Option<f64> {
        if self.is_passthrough() {
            return None;
        }
        Some(6.02 * f64::from(self.bits()) + 1.76)
    }
}

impl TryFrom<u16> for BitDepth {
    type Error = FormatError;

    fn try_from(bits: u16) -> Result<Self, Self::Error> {
        BitDepth::ALL
            .into_iter()
            .find(|d| d.bits() == bits)
            .ok_or(FormatError::UnsupportedBitDepth(bits))
    }
}

impl From<BitDepth> for u16 {
    fn from(depth: BitDepth) -> u16 {
        depth.bits()
    }
}

impl std::fmt::Display for BitDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_rows_match_variants() {
        let bits: Vec<u16> = BitDepth::ALL.iter().map(|d| d.bits()).collect();
        assert_eq!(bits, vec![8, 12, 16, 24, 32]);
    }

    #[test]
    fn max_value_is_half_range_minus_one() {
        for depth in BitDepth::ALL {
            match depth.max_value() {
                Some(max) => assert_eq!(max, (1u32 << (depth.bits() - 1)) - 1, "{depth}"),
                None => assert_eq!(depth, BitDepth::ThirtyTwo),
            }
        }
    }

    #[test]
    fn storage_subtypes() {
        assert_eq!(BitDepth::Eight.storage(), StorageKind::UnsignedPcm8);
        assert_eq!(BitDepth::Twelve.storage(), StorageKind::SignedPcm16);
        assert_eq!(BitDepth::Sixteen.storage(), StorageKind::SignedPcm16);
        assert_eq!(BitDepth::TwentyFour.storage(), StorageKind::SignedPcm24);
        assert_eq!(BitDepth::ThirtyTwo.storage(), StorageKind::Float32);
        assert!(BitDepth::ThirtyTwo.storage().is_float());
    }

    #[test]
    fn only_eight_bit_is_unipolar() {
        for depth in BitDepth::ALL {
            let expected = if depth == BitDepth::Eight {
                RangeTransform::Unipolar
            } else {
                RangeTransform::Bipolar
            };
            assert_eq!(depth.range_transform(), expected);
        }
    }

    #[test]
    fn unsupported_depths_rejected() {
        for bits in [0u16, 1, 4, 10, 20, 64] {
            assert_eq!(BitDepth::try_from(bits), Err(FormatError::UnsupportedBitDepth(bits)));
        }
    }

    #[test]
    fn theoretical_snr_values() {
        let snr8 = BitDepth::Eight.theoretical_snr_db().unwrap();
        assert!((snr8 - 49.92).abs() < 1e-9);
        let snr16 = BitDepth::Sixteen.theoretical_snr_db().unwrap();
        assert!((snr16 - 98.08).abs() < 1e-9);
        assert!(BitDepth::ThirtyTwo.theoretical_snr_db().is_none());
    }

    #[test]
    fn display_shows_bits() {
        assert_eq!(BitDepth::TwentyFour.to_string(), "24-bit");
    }
}
