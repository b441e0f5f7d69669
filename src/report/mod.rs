//! Report sinks.
//!
//! A [`ReportSink`] receives the finished, sorted [`RunReport`] and persists
//! it somewhere.  Two sinks ship with the tool:
//!
//! | Sink           | File           | Audience  |
//! |----------------|----------------|-----------|
//! | [`TextReport`] | `report.txt`   | people    |
//! | [`JsonReport`] | `results.json` | scripts   |
//!
//! Both write through [`crate::atomic::write_atomically`].

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::OutputConfig;
use crate::pipeline::RunReport;

pub mod json;
pub mod text;

pub use json::JsonReport;
pub use text::{format_snr, render_table, TextReport};

// ---------------------------------------------------------------------------
// ReportError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode report {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// ReportSink
// ---------------------------------------------------------------------------

/// Destination for a finished run.
pub trait ReportSink {
    /// Short name for log lines.
    fn name(&self) -> &str;

    fn write(&self, report: &RunReport) -> Result<(), ReportError>;
}

/// The sinks an [`OutputConfig`] asks for: always the text table, plus JSON
/// when enabled.
pub fn sinks_for(output: &OutputConfig) -> Vec<Box<dyn ReportSink>> {
    let mut sinks: Vec<Box<dyn ReportSink>> = vec![Box::new(TextReport::new(output.report_path()))];
    if output.json_report {
        sinks.push(Box::new(JsonReport::new(output.json_path())));
    }
    sinks
}
