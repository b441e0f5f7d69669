//! Pipeline progress and run results.
//!
//! [`PipelineState`] tracks which phase a [`super::DegradationPipeline`] is
//! in.  [`DegradationResult`] is one row of the results table and
//! [`RunReport`] is everything a report sink needs.

use std::path::PathBuf;

use serde::Serialize;

use crate::codec::BitDepth;
use crate::config::ScoringMode;
use crate::metrics::SNR_SENTINEL;

// ---------------------------------------------------------------------------
// PipelineState
// ---------------------------------------------------------------------------

/// Phases of a run.
///
/// ```text
/// Idle ──▶ Capturing ──▶ Degrading ──▶ Reporting ──▶ Done
///            │              │              │
///            └──────────────┴──────────────┴──▶ Failed | Interrupted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    /// Recording and checking the reference.
    Capturing,
    /// Working through the rate × depth grid.
    Degrading,
    /// Handing results to the report sinks.
    Reporting,
    Done,
    Failed,
    Interrupted,
}

impl PipelineState {
    /// `true` once the run has ended, successfully or not.
    ///
    /// ```
    /// use snr_lab::pipeline::PipelineState;
    ///
    /// assert!(!PipelineState::Degrading.is_finished());
    /// assert!(PipelineState::Interrupted.is_finished());
    /// ```
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            PipelineState::Done | PipelineState::Failed | PipelineState::Interrupted
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Idle => "Idle",
            PipelineState::Capturing => "Capturing",
            PipelineState::Degrading => "Degrading",
            PipelineState::Reporting => "Reporting",
            PipelineState::Done => "Done",
            PipelineState::Failed => "Failed",
            PipelineState::Interrupted => "Interrupted",
        }
    }
}

// ---------------------------------------------------------------------------
// DegradationResult
// ---------------------------------------------------------------------------

/// One (rate, depth) combination and how it scored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DegradationResult {
    pub sample_rate: u32,
    pub bit_depth: BitDepth,
    /// Measured SNR in dB; [`SNR_SENTINEL`] when the combination failed.
    pub snr_db: f64,
    /// `6.02 · bits + 1.76`, `None` for the 32-bit pass-through.
    pub theoretical_snr_db: Option<f64>,
    /// Written WAV, `None` if persisting failed.
    pub artifact: Option<PathBuf>,
    /// Why the combination failed.
    pub error: Option<String>,
}

impl DegradationResult {
    pub fn scored(sample_rate: u32, bit_depth: BitDepth, snr_db: f64, artifact: PathBuf) -> Self {
        Self {
            sample_rate,
            bit_depth,
            snr_db,
            theoretical_snr_db: bit_depth.theoretical_snr_db(),
            artifact: Some(artifact),
            error: None,
        }
    }

    pub fn failed(sample_rate: u32, bit_depth: BitDepth, error: impl ToString) -> Self {
        Self {
            sample_rate,
            bit_depth,
            snr_db: SNR_SENTINEL,
            theoretical_snr_db: bit_depth.theoretical_snr_db(),
            artifact: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

// ---------------------------------------------------------------------------
// RunReport
// ---------------------------------------------------------------------------

/// Reference description plus every combination's result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub reference_sample_rate: u32,
    pub reference_bit_depth: BitDepth,
    pub reference_samples: usize,
    pub reference_secs: f64,
    pub scoring: ScoringMode,
    /// Reference warnings (quiet, clipping) that make the numbers suspect.
    pub warnings: Vec<String>,
    pub results: Vec<DegradationResult>,
}

impl RunReport {
    /// Order results by descending SNR.  Stable, so equal scores keep grid
    /// order; failures (`-∞`) sink to the bottom.
    pub fn sort_by_snr(&mut self) {
        self.results.sort_by(|a, b| b.snr_db.total_cmp(&a.snr_db));
    }

    pub fn failures(&self) -> impl Iterator<Item = &DegradationResult> {
        self.results.iter().filter(|r| r.is_failure())
    }

    /// Highest-scoring successful combination.
    pub fn best(&self) -> Option<&DegradationResult> {
        self.results
            .iter()
            .filter(|r| !r.is_failure())
            .max_by(|a, b| a.snr_db.total_cmp(&b.snr_db))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
