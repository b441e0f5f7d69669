//! Degradation pipeline: capture → (resample → encode → persist → score)* → report.
//!
//! [`DegradationPipeline`] owns one run.  It records the reference through an
//! [`AudioBackend`], then walks the rate × depth grid (rates outer, depths
//! inner) and scores every combination against the rate-matched reference.
//!
//! # Pipeline flow
//!
//! ```text
//! create output dir ─┐
//! capture reference ─┴─▶ ReferenceCheck ──fatal──▶ PipelineError::Reference
//!   │                         └─warnings─▶ RunReport.warnings
//!   ├─▶ [keep_reference] ref.wav
//!   └─▶ for rate:  resample ──err──▶ every depth of this rate fails
//!         for depth: encode ─▶ audio_{rate}Hz_{bits}bit.wav
//!                    preview | read back ─▶ compute_snr vs rate-matched reference
//!                    [playback] play artifact
//! sort by SNR desc ─▶ ReportSink::write for each sink
//! ```
//!
//! A failure inside a combination becomes a row with the `-∞` sentinel and
//! the run continues.  Reference capture failures and interrupts end the
//! run.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::audio::{
    resample, AudioBackend, CaptureError, CaptureRequest, QualityIssue, ReferenceCheck,
    ResampleError, Waveform,
};
use crate::codec::{decode, encode, quantize, read_wav, write_wav, BitDepth, PersistError};
use crate::config::{AppConfig, ScoringMode};
use crate::metrics::compute_snr;
use crate::report::{ReportError, ReportSink};

use super::state::{DegradationResult, PipelineState, RunReport};

/// File name of the persisted reference inside the output directory.
pub const REFERENCE_FILE: &str = "ref.wav";

/// `audio_{rate}Hz_{bits}bit.wav`
pub fn artifact_name(sample_rate: u32, depth: BitDepth) -> String {
    format!("audio_{sample_rate}Hz_{}bit.wav", depth.bits())
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Conditions that end a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("reference capture failed: {0}")]
    Capture(#[source] CaptureError),

    #[error("unusable reference: {0}")]
    Reference(QualityIssue),

    #[error("cannot create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("run interrupted")]
    Interrupted,

    #[error(transparent)]
    Report(#[from] ReportError),
}

impl From<CaptureError> for PipelineError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::Interrupted => PipelineError::Interrupted,
            other => PipelineError::Capture(other),
        }
    }
}

/// Why a single (rate, depth) combination has no score.
#[derive(Debug, Error)]
pub enum CombinationError {
    #[error(transparent)]
    Resample(#[from] ResampleError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

// ---------------------------------------------------------------------------
// PipelineOptions
// ---------------------------------------------------------------------------

/// Everything a run needs, resolved from [`AppConfig`] plus CLI overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub capture: CaptureRequest,
    pub reference_depth: BitDepth,
    pub min_reference_secs: f64,
    pub sample_rates: Vec<u32>,
    pub bit_depths: Vec<BitDepth>,
    pub scoring: ScoringMode,
    pub output_dir: PathBuf,
    pub keep_reference: bool,
    pub playback: bool,
}

impl PipelineOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            capture: CaptureRequest {
                device: config.capture.device_index,
                sample_rate: config.capture_sample_rate(),
                duration: config.capture.duration(),
            },
            reference_depth: config.capture_bit_depth(),
            min_reference_secs: config.capture.min_reference_secs,
            sample_rates: config.degradation.sample_rates.clone(),
            bit_depths: config.degradation.bit_depths.clone(),
            scoring: config.degradation.scoring,
            output_dir: config.output.dir.clone(),
            keep_reference: config.output.keep_reference,
            playback: config.playback.enabled,
        }
    }

    pub fn combination_count(&self) -> usize {
        self.sample_rates.len() * self.bit_depths.len()
    }
}

// ---------------------------------------------------------------------------
// DegradationPipeline
// ---------------------------------------------------------------------------

/// Runs one capture-and-degrade session.
///
/// ```rust,no_run
/// use std::sync::atomic::AtomicBool;
/// use std::sync::Arc;
/// use snr_lab::audio::ToneBackend;
/// use snr_lab::config::AppConfig;
/// use snr_lab::pipeline::{DegradationPipeline, PipelineOptions};
/// use snr_lab::report::{ReportSink, TextReport};
///
/// let config = AppConfig::default();
/// let backend = ToneBackend::new(997.0);
/// let sinks: Vec<Box<dyn ReportSink>> = vec![Box::new(TextReport::new("results/report.txt"))];
///
/// let mut pipeline = DegradationPipeline::new(
///     &backend,
///     PipelineOptions::from_config(&config),
///     Arc::new(AtomicBool::new(false)),
/// );
/// let report = pipeline.run(&sinks).unwrap();
/// println!("{} rows", report.results.len());
/// ```
pub struct DegradationPipeline<'a> {
    backend: &'a dyn AudioBackend,
    options: PipelineOptions,
    interrupt: Arc<AtomicBool>,
    state: PipelineState,
}

impl<'a> DegradationPipeline<'a> {
    pub fn new(backend: &'a dyn AudioBackend, options: PipelineOptions, interrupt: Arc<AtomicBool>) -> Self {
        Self {
            backend,
            options,
            interrupt,
            state: PipelineState::Idle,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Execute the whole run and hand the sorted report to every sink.
    pub fn run(&mut self, sinks: &[Box<dyn ReportSink>]) -> Result<RunReport, PipelineError> {
        let result = self.execute(sinks);
        self.enter(match &result {
            Ok(_) => PipelineState::Done,
            Err(PipelineError::Interrupted) => PipelineState::Interrupted,
            Err(_) => PipelineState::Failed,
        });
        if let Err(e) = &result {
            log::error!("pipeline: {e}");
        }
        result
    }

    fn enter(&mut self, state: PipelineState) {
        self.state = state;
        if state.is_finished() {
            log::info!("pipeline: {}", state.label());
        } else {
            log::debug!("pipeline: {}", state.label());
        }
    }

    fn execute(&mut self, sinks: &[Box<dyn ReportSink>]) -> Result<RunReport, PipelineError> {
        let dir = self.options.output_dir.clone();
        std::fs::create_dir_all(&dir).map_err(|source| PipelineError::OutputDir {
            path: dir.clone(),
            source,
        })?;

        self.enter(PipelineState::Capturing);
        let (reference, warnings) = self.capture_reference()?;

        self.enter(PipelineState::Degrading);
        let results = self.degrade(&reference)?;

        let mut report = RunReport {
            reference_sample_rate: reference.sample_rate(),
            reference_bit_depth: self.options.reference_depth,
            reference_samples: reference.len(),
            reference_secs: reference.duration_secs(),
            scoring: self.options.scoring,
            warnings: warnings.iter().map(ToString::to_string).collect(),
            results,
        };
        report.sort_by_snr();

        self.enter(PipelineState::Reporting);
        self.publish(&report, sinks)?;
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Reference
    // -----------------------------------------------------------------------

    /// Record, check and (optionally) persist the reference.
    ///
    /// The returned waveform is already held at the reference depth.
    pub fn capture_reference(&mut self) -> Result<(Waveform, Vec<QualityIssue>), PipelineError> {
        let captured = self.backend.capture(&self.options.capture, &self.interrupt)?;

        let warnings = ReferenceCheck::new(self.options.min_reference_secs)
            .check(&captured)
            .map_err(PipelineError::Reference)?;
        for w in &warnings {
            log::warn!("pipeline: {w}");
        }

        let depth = self.options.reference_depth;
        let reference = quantize(&captured, depth);
        log::info!(
            "pipeline: reference {} samples @ {} Hz, {depth} (rms {:.4}, peak {:.4})",
            reference.len(),
            reference.sample_rate(),
            reference.rms(),
            reference.peak()
        );

        if self.options.keep_reference {
            let path = self.options.output_dir.join(REFERENCE_FILE);
            match write_wav(&path, &encode(&captured, depth)) {
                Ok(()) => log::info!("pipeline: saved reference {}", path.display()),
                Err(e) => log::warn!("pipeline: could not save reference: {e}"),
            }
        }

        if self.options.playback {
            self.play("reference", &reference);
        }

        Ok((reference, warnings))
    }

    // -----------------------------------------------------------------------
    // Grid
    // -----------------------------------------------------------------------

    /// Score every (rate, depth) combination against `reference`.
    ///
    /// Always yields `rates × depths` rows in grid order; only an interrupt
    /// cuts it short.
    pub fn degrade(&self, reference: &Waveform) -> Result<Vec<DegradationResult>, PipelineError> {
        let total = self.options.combination_count();
        let mut results = Vec::with_capacity(total);

        for &rate in &self.options.sample_rates {
            self.check_interrupt()?;

            let rate_matched = match resample(reference, rate) {
                Ok(w) => Some(w),
                Err(e) => {
                    log::warn!("pipeline: skipping {rate} Hz: {e}");
                    for &depth in &self.options.bit_depths {
                        results.push(DegradationResult::failed(rate, depth, CombinationError::from(e.clone())));
                    }
                    None
                }
            };
            let Some(rate_matched) = rate_matched else {
                continue;
            };

            for &depth in &self.options.bit_depths {
                self.check_interrupt()?;
                let n = results.len() + 1;

                let row = match self.run_combination(&rate_matched, depth) {
                    Ok(row) => {
                        log::info!(
                            "pipeline: [{n}/{total}] {rate} Hz {depth}: {:.2} dB{}",
                            row.snr_db,
                            row.theoretical_snr_db
                                .map(|t| format!(" (theoretical {t:.2} dB)"))
                                .unwrap_or_default()
                        );
                        row
                    }
                    Err(e) => {
                        log::warn!("pipeline: [{n}/{total}] {rate} Hz {depth} skipped: {e}");
                        DegradationResult::failed(rate, depth, e)
                    }
                };
                results.push(row);
            }
        }

        Ok(results)
    }

    fn run_combination(&self, rate_matched: &Waveform, depth: BitDepth) -> Result<DegradationResult, CombinationError> {
        let rate = rate_matched.sample_rate();
        let path = artifact_path(&self.options.output_dir, rate, depth);

        let encoded = encode(rate_matched, depth);
        write_wav(&path, &encoded)?;

        let degraded = match self.options.scoring {
            ScoringMode::Preview => quantize(rate_matched, depth),
            ScoringMode::Artifact => decode(&read_wav(&path, depth)?),
        };
        let snr_db = compute_snr(rate_matched.samples(), degraded.samples());

        if self.options.playback {
            self.play(&artifact_name(rate, depth), &decode(&encoded));
        }

        Ok(DegradationResult::scored(rate, depth, snr_db, path))
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn check_interrupt(&self) -> Result<(), PipelineError> {
        if self.interrupt.load(Ordering::SeqCst) {
            return Err(PipelineError::Interrupted);
        }
        Ok(())
    }

    fn play(&self, what: &str, waveform: &Waveform) {
        if self.interrupt.load(Ordering::SeqCst) {
            return;
        }
        log::info!("pipeline: playing {what}");
        if let Err(e) = self.backend.play(waveform) {
            log::warn!("pipeline: playback of {what} failed: {e}");
        }
    }

    /// Write `report` to every sink.  All sinks are attempted; the first
    /// failure is returned.
    fn publish(&self, report: &RunReport, sinks: &[Box<dyn ReportSink>]) -> Result<(), PipelineError> {
        let mut first_error = None;
        for sink in sinks {
            match sink.write(report) {
                Ok(()) => log::info!("pipeline: wrote {} report", sink.name()),
                Err(e) => {
                    log::error!("pipeline: {} report failed: {e}", sink.name());
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

/// Path the artifact for `(rate, depth)` is written to inside `dir`.
pub fn artifact_path(dir: &Path, sample_rate: u32, depth: BitDepth) -> PathBuf {
    dir.join(artifact_name(sample_rate, depth))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
