//! Reference recording sanity checks.
//!
//! [`ReferenceCheck`] inspects the captured reference before any
//! degradation runs:
//!
//! | Check    | Condition                                   | Severity |
//! |----------|---------------------------------------------|----------|
//! | Duration | shorter than `min_secs` (or empty)          | fatal    |
//! | Silence  | peak below `silence_threshold`              | warning  |
//! | Clipping | more than `clipping_max_pct`% at full scale | warning  |
//!
//! A quiet or clipped reference still produces numbers, they are just
//! misleading, so those only warn.
//!
//! # Example
//!
//! ```rust
//! use snr_lab::audio::{QualityIssue, ReferenceCheck, Waveform};
//!
//! let check = ReferenceCheck::new(0.5);
//!
//! let ok = Waveform::new(vec![0.1_f32; 8_000], 16_000);
//! assert!(check.check(&ok).unwrap().is_empty());
//!
//! let short = Waveform::new(vec![0.1_f32; 100], 16_000);
//! assert!(matches!(check.check(&short), Err(QualityIssue::TooShort { .. })));
//! ```

use thiserror::Error;

use super::Waveform;

// ---------------------------------------------------------------------------
// QualityIssue
// ---------------------------------------------------------------------------

/// Something wrong with the reference recording.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QualityIssue {
    #[error("reference too short: {got_secs:.2}s (minimum {min_secs:.2}s)")]
    TooShort { min_secs: f64, got_secs: f64 },

    #[error("reference nearly silent: peak {amplitude:.4} (threshold {threshold:.4}); SNR figures will be unreliable")]
    TooQuiet { amplitude: f32, threshold: f32 },

    #[error("reference clipping: {clipped_pct:.1}% of samples at full scale (max {max_pct:.1}%)")]
    Clipping { clipped_pct: f32, max_pct: f32 },
}

impl QualityIssue {
    /// `true` when the run cannot continue with this reference.
    pub fn is_fatal(&self) -> bool {
        matches!(self, QualityIssue::TooShort { .. })
    }
}

// ---------------------------------------------------------------------------
// ReferenceCheck
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ReferenceCheck {
    /// Minimum reference duration in seconds (default: `0.1`).
    pub min_secs: f64,
    /// Peak amplitude below which the reference counts as silent
    /// (default: `0.001`).
    pub silence_threshold: f32,
    /// Amplitude at or above which a sample counts as clipped
    /// (default: `0.999`).
    pub clipping_threshold: f32,
    /// Clipped-sample percentage that triggers a warning (default: `1.0`).
    pub clipping_max_pct: f32,
}

impl Default for ReferenceCheck {
    fn default() -> Self {
        Self {
            min_secs: 0.1,
            silence_threshold: 0.001,
            clipping_threshold: 0.999,
            clipping_max_pct: 1.0,
        }
    }
}

impl ReferenceCheck {
    pub fn new(min_secs: f64) -> Self {
        Self {
            min_secs,
            ..Default::default()
        }
    }

    /// Run all checks on `reference`.
    ///
    /// Returns `Err` with the fatal issue, or `Ok` with any warnings (empty
    /// when the reference looks fine).
    pub fn check(&self, reference: &Waveform) -> Result<Vec<QualityIssue>, QualityIssue> {
        let got_secs = reference.duration_secs();
        if reference.is_empty() || got_secs < self.min_secs {
            return Err(QualityIssue::TooShort {
                min_secs: self.min_secs,
                got_secs,
            });
        }

        let mut warnings = Vec::new();

        let peak = reference.peak();
        if peak < self.silence_threshold {
            warnings.push(QualityIssue::TooQuiet {
                amplitude: peak,
                threshold: self.silence_threshold,
            });
        }

        let clipped = reference
            .samples()
            .iter()
            .filter(|s| s.abs() >= self.clipping_threshold)
            .count();
        let clipped_pct = clipped as f32 / reference.len() as f32 * 100.0;
        if clipped_pct > self.clipping_max_pct {
            warnings.push(QualityIssue::Clipping {
                clipped_pct,
                max_pct: self.clipping_max_pct,
            });
        }

        Ok(warnings)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(secs: f64, amplitude: f32) -> Waveform {
        let n = (secs * 16_000.0) as usize;
        Waveform::new(vec![amplitude; n], 16_000)
    }

    #[test]
    fn healthy_reference_has_no_issues() {
        let issues = ReferenceCheck::default().check(&constant(1.0, 0.3)).unwrap();
        assert!(issues.is_empty());
    }

    #[test]
    fn empty_reference_is_fatal() {
        let err = ReferenceCheck::new(0.0).check(&Waveform::empty(16_000)).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, QualityIssue::TooShort { .. }));
    }

    #[test]
    fn short_reference_is_fatal() {
        let err = ReferenceCheck::new(0.5).check(&constant(0.1, 0.3)).unwrap_err();
        assert!(matches!(err, QualityIssue::TooShort { .. }), "{err}");
    }

    #[test]
    fn silence_only_warns() {
        let issues = ReferenceCheck::default().check(&constant(1.0, 0.0)).unwrap();
        assert_eq!(issues.len(), 1);
        assert!(matches!(issues[0], QualityIssue::TooQuiet { .. }));
        assert!(!issues[0].is_fatal());
    }

    #[test]
    fn clipping_only_warns() {
        let issues = ReferenceCheck::default().check(&constant(1.0, 1.0)).unwrap();
        assert!(matches!(issues.as_slice(), [QualityIssue::Clipping { .. }]));
    }

    #[test]
    fn minor_clipping_within_limit_passes() {
        let mut samples = vec![0.3_f32; 15_990];
        samples.extend([1.0_f32; 10]);
        let w = Waveform::new(samples, 16_000);
        assert!(ReferenceCheck::default().check(&w).unwrap().is_empty());
    }

    #[test]
    fn messages_carry_values() {
        let msg = QualityIssue::TooShort {
            min_secs: 0.5,
            got_secs: 0.1,
        }
        .to_string();
        assert!(msg.contains("0.10") && msg.contains("0.50"), "{msg}");
    }
}
