//! Machine-readable results (`results.json`).
//!
//! JSON has no infinities, so every row carries `snr_db` as a number (or
//! `null` when it is infinite) next to `snr`, the same value as text
//! (`"inf"`, `"-inf"`, `"42.17"`).

use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::atomic::write_atomically;
use crate::codec::BitDepth;
use crate::config::ScoringMode;
use crate::pipeline::RunReport;

use super::text::format_snr;
use super::{ReportError, ReportSink};

#[derive(Debug, Serialize)]
struct JsonRow<'a> {
    sample_rate: u32,
    bit_depth: BitDepth,
    snr_db: Option<f64>,
    snr: String,
    theoretical_snr_db: Option<f64>,
    artifact: Option<&'a Path>,
    error: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct JsonDocument<'a> {
    reference_sample_rate: u32,
    reference_bit_depth: BitDepth,
    reference_samples: usize,
    reference_secs: f64,
    scoring: ScoringMode,
    warnings: &'a [String],
    results: Vec<JsonRow<'a>>,
}

fn document(report: &RunReport) -> JsonDocument<'_> {
    JsonDocument {
        reference_sample_rate: report.reference_sample_rate,
        reference_bit_depth: report.reference_bit_depth,
        reference_samples: report.reference_samples,
        reference_secs: report.reference_secs,
        scoring: report.scoring,
        warnings: &report.warnings,
        results: report
            .results
            .iter()
            .map(|r| JsonRow {
                sample_rate: r.sample_rate,
                bit_depth: r.bit_depth,
                snr_db: Some(r.snr_db).filter(|s| s.is_finite()),
                snr: format_snr(r.snr_db),
                theoretical_snr_db: r.theoretical_snr_db,
                artifact: r.artifact.as_deref(),
                error: r.error.as_deref(),
            })
            .collect(),
    }
}

/// Writes the run as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct JsonReport {
    path: PathBuf,
}

impl JsonReport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportSink for JsonReport {
    fn name(&self) -> &str {
        "json"
    }

    fn write(&self, report: &RunReport) -> Result<(), ReportError> {
        let body = serde_json::to_vec_pretty(&document(report)).map_err(|source| ReportError::Encode {
            path: self.path.clone(),
            source,
        })?;
        write_atomically(&self.path, |f| f.write_all(&body)).map_err(|source| ReportError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::DegradationResult;
    use tempfile::tempdir;

    #[test]
    fn writes_rows_with_infinities_as_text() {
        let dir = tempdir().expect("temp dir");
        let sink = JsonReport::new(dir.path().join("results.json"));
        let report = RunReport {
            reference_sample_rate: 48_000,
            reference_bit_depth: BitDepth::ThirtyTwo,
            reference_samples: 4_800,
            reference_secs: 0.1,
            scoring: ScoringMode::Artifact,
            warnings: Vec::new(),
            results: vec![
                DegradationResult::scored(16_000, BitDepth::ThirtyTwo, f64::INFINITY, "a.wav".into()),
                DegradationResult::scored(16_000, BitDepth::Sixteen, 91.5, "b.wav".into()),
                DegradationResult::failed(8_000, BitDepth::Eight, "disk full"),
            ],
        };
        sink.write(&report).expect("write");

        let text = std::fs::read_to_string(sink.path()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(v["scoring"], "artifact");
        assert_eq!(v["reference_bit_depth"], 32);
        let rows = v["results"].as_array().unwrap();
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0]["snr"], "inf");
        assert!(rows[0]["snr_db"].is_null());
        assert!(rows[0]["theoretical_snr_db"].is_null());

        assert_eq!(rows[1]["snr_db"], 91.5);
        assert_eq!(rows[1]["bit_depth"], 16);
        assert_eq!(rows[1]["artifact"], "b.wav");

        assert_eq!(rows[2]["snr"], "-inf");
        assert_eq!(rows[2]["error"], "disk full");
        assert!(rows[2]["artifact"].is_null());
    }
}
