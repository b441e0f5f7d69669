//! Bit-depth handling: quantization, storage codes and WAV files.
//!
//! ```text
//! Waveform ──quantize──▶ Waveform (float, carries quantization error)
//!          ──encode────▶ EncodedWaveform ──write_wav──▶ audio_{rate}Hz_{bits}bit.wav
//!                        EncodedWaveform ◀──read_wav───
//!          ◀─decode─────
//! ```

pub mod bit_depth;
pub mod quantize;
pub mod wav;

pub use bit_depth::{BitDepth, FormatError, RangeTransform, StorageKind};
pub use quantize::{decode, encode, quantize, quantize_bits, EncodedSamples, EncodedWaveform};
pub use wav::{read_waveform, read_wav, write_wav, PersistError};
