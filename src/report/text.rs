//! Human-readable results table.
//!
//! ```text
//! SNR results
//! Reference: 48000 Hz, 32-bit, 5.00 s (240000 samples), scoring: preview
//!
//! Sample rate (Hz) | Bit depth | SNR (dB) | Theoretical (dB) | File
//! -----------------+-----------+----------+------------------+------------------------
//!            44100 |    16-bit |    97.95 |            98.08 | audio_44100Hz_16bit.wav
//!             8000 |     8-bit |     -inf |            49.92 | -
//! ```

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::atomic::write_atomically;
use crate::pipeline::RunReport;

use super::{ReportError, ReportSink};

const HEADER: [&str; 5] = ["Sample rate (Hz)", "Bit depth", "SNR (dB)", "Theoretical (dB)", "File"];

/// `inf` / `-inf` for the infinities, two decimals otherwise.
pub fn format_snr(snr_db: f64) -> String {
    if snr_db == f64::INFINITY {
        "inf".to_string()
    } else if snr_db == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{snr_db:.2}")
    }
}

fn file_label(path: Option<&Path>) -> String {
    path.and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "-".to_string())
}

/// Render `report` as plain text, rows in the order given.
pub fn render_table(report: &RunReport) -> String {
    let rows: Vec<[String; 5]> = report
        .results
        .iter()
        .map(|r| {
            [
                r.sample_rate.to_string(),
                r.bit_depth.to_string(),
                format_snr(r.snr_db),
                r.theoretical_snr_db
                    .map(|t| format!("{t:.2}"))
                    .unwrap_or_else(|| "-".to_string()),
                file_label(r.artifact.as_deref()),
            ]
        })
        .collect();

    let mut widths = HEADER.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }

    let mut out = String::new();
    let _ = writeln!(out, "SNR results");
    let _ = writeln!(
        out,
        "Reference: {} Hz, {}, {:.2} s ({} samples), scoring: {}",
        report.reference_sample_rate,
        report.reference_bit_depth,
        report.reference_secs,
        report.reference_samples,
        report.scoring
    );
    out.push('\n');

    // numeric columns right-aligned, file name left-aligned
    let line = |cells: [&str; 5]| {
        format!(
            "{:>w0$} | {:>w1$} | {:>w2$} | {:>w3$} | {}",
            cells[0],
            cells[1],
            cells[2],
            cells[3],
            cells[4],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
            w3 = widths[3],
        )
    };
    let _ = writeln!(out, "{}", line(HEADER).trim_end());
    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));
    for row in &rows {
        let cells = [&row[0], &row[1], &row[2], &row[3], &row[4]].map(String::as_str);
        let _ = writeln!(out, "{}", line(cells));
    }

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        let _ = writeln!(out, "\nFailed combinations:");
        for f in failures {
            let _ = writeln!(
                out,
                "  {} Hz {}: {}",
                f.sample_rate,
                f.bit_depth,
                f.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    if !report.warnings.is_empty() {
        let _ = writeln!(out, "\nWarnings:");
        for w in &report.warnings {
            let _ = writeln!(out, "  {w}");
        }
    }

    let _ = writeln!(
        out,
        "\nSNR is a plain signal-to-noise power ratio, not a perceptual quality measure."
    );
    out
}

// ---------------------------------------------------------------------------
// TextReport
// ---------------------------------------------------------------------------

/// Writes [`render_table`] output to a file.
#[derive(Debug, Clone)]
pub struct TextReport {
    path: PathBuf,
}

impl TextReport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportSink for TextReport {
    fn name(&self) -> &str {
        "text"
    }

    fn write(&self, report: &RunReport) -> Result<(), ReportError> {
        let text = render_table(report);
        write_atomically(&self.path, |f| f.write_all(text.as_bytes())).map_err(|source| {
            ReportError::Io {
                path: self.path.clone(),
                source,
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
