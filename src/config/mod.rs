//! Configuration for snr-lab.
//!
//! Provides `AppConfig` (top-level settings) with one section per concern,
//! `AppPaths` for the platform config directory, and TOML persistence via
//! `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, CaptureConfig, DegradationConfig, OutputConfig, PlaybackConfig, ScoringMode,
};
