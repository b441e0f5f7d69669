//! The degradation pipeline and its results.
//!
//! # Architecture
//!
//! ```text
//! AppConfig ──▶ PipelineOptions
//!                    │
//!                    ▼
//! DegradationPipeline::run(sinks)
//!        │
//!        ├─ Capturing   AudioBackend::capture → ReferenceCheck → ref.wav
//!        ├─ Degrading   rates × depths → DegradationResult rows
//!        └─ Reporting   RunReport (sorted) → ReportSink::write
//!
//! interrupt: Arc<AtomicBool> ── polled between steps, set by the SIGINT handler
//! ```

pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{
    artifact_name, artifact_path, CombinationError, DegradationPipeline, PipelineError,
    PipelineOptions, REFERENCE_FILE,
};
pub use state::{DegradationResult, PipelineState, RunReport};
