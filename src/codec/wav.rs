//! WAV persistence via `hound`.
//!
//! [`write_wav`] stores an [`EncodedWaveform`] using the subtype of its bit
//! depth (unsigned 8-bit, signed 16/24-bit PCM or 32-bit float).  The file
//! is written through [`write_atomically`], so the destination path only
//! ever holds a complete file.
//!
//! [`read_wav`] reads a file back into codes for a known depth;
//! [`read_waveform`] infers the depth from the header and decodes to float.

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use thiserror::Error;

use crate::atomic::write_atomically;
use crate::audio::Waveform;

use super::bit_depth::{BitDepth, StorageKind};
use super::quantize::{decode, EncodedSamples, EncodedWaveform};

// ---------------------------------------------------------------------------
// PersistError
// ---------------------------------------------------------------------------

/// Failure to write or read a WAV artifact.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("{}: expected mono, found {channels} channels", path.display())]
    NotMono { path: PathBuf, channels: u16 },

    #[error("{}: {bits}-bit {format:?} samples cannot hold {depth} audio", path.display())]
    FormatMismatch {
        path: PathBuf,
        bits: u16,
        format: SampleFormat,
        depth: BitDepth,
    },

    #[error("{}: unsupported WAV subtype ({bits}-bit {format:?})", path.display())]
    UnsupportedSubtype {
        path: PathBuf,
        bits: u16,
        format: SampleFormat,
    },
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

fn wav_spec(storage: StorageKind, sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: storage.bits_per_sample(),
        sample_format: if storage.is_float() {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    }
}

/// Write `encoded` to `path` as a mono WAV file.
///
/// # Errors
///
/// [`PersistError::Write`] on any I/O or encoding failure; nothing is left
/// at `path` in that case.
pub fn write_wav(path: &Path, encoded: &EncodedWaveform) -> Result<(), PersistError> {
    let spec = wav_spec(encoded.depth().storage(), encoded.sample_rate());

    write_atomically(path, |file| -> hound::Result<()> {
        let mut writer = WavWriter::new(BufWriter::new(file), spec)?;
        match encoded.samples() {
            EncodedSamples::Unsigned8(codes) => {
                // hound takes signed 8-bit values and stores them offset by 128
                for &c in codes {
                    writer.write_sample((i16::from(c) - 128) as i8)?;
                }
            }
            EncodedSamples::Signed16(codes) => {
                for &c in codes {
                    writer.write_sample(c)?;
                }
            }
            EncodedSamples::Signed24(codes) => {
                for &c in codes {
                    writer.write_sample(c)?;
                }
            }
            EncodedSamples::Float32(samples) => {
                for &s in samples {
                    writer.write_sample(s)?;
                }
            }
        }
        writer.finalize()
    })
    .map_err(|source| PersistError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    log::debug!(
        "wav: wrote {} ({} samples, {} Hz, {})",
        path.display(),
        encoded.len(),
        encoded.sample_rate(),
        encoded.depth()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Read a mono WAV written for `depth` back into storage codes.
///
/// # Errors
///
/// * [`PersistError::Read`]: missing file, malformed header, truncated data.
/// * [`PersistError::NotMono`]: more than one channel.
/// * [`PersistError::FormatMismatch`]: the header's subtype is not the one
///   `depth` is stored as.
pub fn read_wav(path: &Path, depth: BitDepth) -> Result<EncodedWaveform, PersistError> {
    let read_err = |source| PersistError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = WavReader::open(path).map_err(read_err)?;
    let spec = reader.spec();

    if spec.channels != 1 {
        return Err(PersistError::NotMono {
            path: path.to_path_buf(),
            channels: spec.channels,
        });
    }

    let expected = wav_spec(depth.storage(), spec.sample_rate);
    if spec.bits_per_sample != expected.bits_per_sample || spec.sample_format != expected.sample_format {
        return Err(PersistError::FormatMismatch {
            path: path.to_path_buf(),
            bits: spec.bits_per_sample,
            format: spec.sample_format,
            depth,
        });
    }

    let samples = match depth.storage() {
        StorageKind::UnsignedPcm8 => EncodedSamples::Unsigned8(
            reader
                .samples::<i8>()
                .map(|s| s.map(|v| (i16::from(v) + 128) as u8))
                .collect::<Result<_, _>>()
                .map_err(read_err)?,
        ),
        StorageKind::SignedPcm16 => EncodedSamples::Signed16(
            reader
                .samples::<i16>()
                .collect::<Result<_, _>>()
                .map_err(read_err)?,
        ),
        StorageKind::SignedPcm24 => EncodedSamples::Signed24(
            reader
                .samples::<i32>()
                .collect::<Result<_, _>>()
                .map_err(read_err)?,
        ),
        StorageKind::Float32 => EncodedSamples::Float32(
            reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(read_err)?,
        ),
    };

    EncodedWaveform::from_parts(depth, spec.sample_rate, samples).ok_or(PersistError::FormatMismatch {
        path: path.to_path_buf(),
        bits: spec.bits_per_sample,
        format: spec.sample_format,
        depth,
    })
}

/// Bit depth a WAV header most likely came from.
///
/// A 16-bit container is reported as 16-bit even if it holds 12-bit codes.
fn depth_from_spec(spec: &WavSpec) -> Option<BitDepth> {
    match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 8) => Some(BitDepth::Eight),
        (SampleFormat::Int, 16) => Some(BitDepth::Sixteen),
        (SampleFormat::Int, 24) => Some(BitDepth::TwentyFour),
        (SampleFormat::Float, 32) => Some(BitDepth::ThirtyTwo),
        _ => None,
    }
}

/// Read any supported mono WAV and decode it to a float [`Waveform`].
pub fn read_waveform(path: &Path) -> Result<Waveform, PersistError> {
    let spec = WavReader::open(path)
        .map_err(|source| PersistError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .spec();

    let depth = depth_from_spec(&spec).ok_or(PersistError::UnsupportedSubtype {
        path: path.to_path_buf(),
        bits: spec.bits_per_sample,
        format: spec.sample_format,
    })?;

    Ok(decode(&read_wav(path, depth)?))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
