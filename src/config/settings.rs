//! Run settings, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`.
//! Every section is `#[serde(default)]`, so a `settings.toml` that only
//! names the values it changes is complete.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::codec::BitDepth;

use super::AppPaths;

// ---------------------------------------------------------------------------
// ScoringMode
// ---------------------------------------------------------------------------

/// Where the degraded signal that gets scored comes from.
///
/// | Variant  | Degraded signal                                  |
/// |----------|--------------------------------------------------|
/// | Preview  | in-memory quantize → dequantize of the resampled audio |
/// | Artifact | the written WAV, read back and decoded           |
///
/// Both give the same numbers when persistence is lossless; `Artifact`
/// additionally proves the file on disk holds what was scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    #[default]
    Preview,
    Artifact,
}

impl std::fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ScoringMode::Preview => "preview",
            ScoringMode::Artifact => "artifact",
        })
    }
}

impl std::str::FromStr for ScoringMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "preview" => Ok(ScoringMode::Preview),
            "artifact" => Ok(ScoringMode::Artifact),
            other => Err(format!("unknown scoring mode '{other}' (expected preview or artifact)")),
        }
    }
}

// ---------------------------------------------------------------------------
// CaptureConfig
// ---------------------------------------------------------------------------

/// How the reference recording is made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Index into the input-device list; `None` means the host default.
    pub device_index: Option<usize>,
    /// Recording length in seconds.
    pub duration_secs: f64,
    /// Rate the reference is recorded at; raised to the highest grid rate.
    pub reference_sample_rate: u32,
    /// Depth the reference is held at; 32 keeps the captured floats as-is.
    /// Raised to the deepest grid depth.
    pub reference_bit_depth: BitDepth,
    /// A shorter reference aborts the run.
    pub min_reference_secs: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_index: None,
            duration_secs: 5.0,
            reference_sample_rate: 48_000,
            reference_bit_depth: BitDepth::ThirtyTwo,
            min_reference_secs: 0.1,
        }
    }
}

impl CaptureConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_secs.max(0.0))
    }
}

// ---------------------------------------------------------------------------
// DegradationConfig
// ---------------------------------------------------------------------------

/// The rate × depth grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DegradationConfig {
    /// Outer loop, in order.
    pub sample_rates: Vec<u32>,
    /// Inner loop, in order.  Unsupported depths fail at load time.
    pub bit_depths: Vec<BitDepth>,
    pub scoring: ScoringMode,
}

impl Default for DegradationConfig {
    fn default() -> Self {
        Self {
            sample_rates: vec![8_000, 16_000, 44_100],
            bit_depths: vec![BitDepth::Eight, BitDepth::Sixteen],
            scoring: ScoringMode::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// OutputConfig
// ---------------------------------------------------------------------------

/// Where artifacts and reports go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for WAV artifacts and reports, created on demand.
    pub dir: PathBuf,
    /// Text report file name inside `dir`.
    pub report_file: String,
    /// Also write `results.json`.
    pub json_report: bool,
    /// Also write the reference as `ref.wav`.
    pub keep_reference: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("results"),
            report_file: "report.txt".into(),
            json_report: true,
            keep_reference: true,
        }
    }
}

impl OutputConfig {
    pub fn report_path(&self) -> PathBuf {
        self.dir.join(&self.report_file)
    }

    pub fn json_path(&self) -> PathBuf {
        self.dir.join("results.json")
    }
}

// ---------------------------------------------------------------------------
// PlaybackConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Play the reference and every artifact after it is scored.
    pub enabled: bool,
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use snr_lab::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub capture: CaptureConfig,
    pub degradation: DegradationConfig,
    pub output: OutputConfig,
    pub playback: PlaybackConfig,
}

impl AppConfig {
    /// Load from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Save to the platform-appropriate `settings.toml`, creating parent
    /// directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Reject settings no run can succeed with.
    pub fn validate(&self) -> Result<()> {
        let capture = &self.capture;
        if !(capture.duration_secs.is_finite() && capture.duration_secs > 0.0) {
            bail!("capture duration must be positive, got {}", capture.duration_secs);
        }
        if capture.reference_sample_rate == 0 {
            bail!("reference sample rate must be positive");
        }
        if !(capture.min_reference_secs >= 0.0) {
            bail!("minimum reference length must not be negative");
        }

        let grid = &self.degradation;
        if grid.sample_rates.is_empty() {
            bail!("no sample rates to test");
        }
        if grid.sample_rates.contains(&0) {
            bail!("sample rates must be positive");
        }
        if grid.bit_depths.is_empty() {
            bail!("no bit depths to test");
        }

        if self.output.report_file.trim().is_empty() {
            bail!("report file name must not be empty");
        }
        Ok(())
    }

    /// Rate the reference is captured at: the configured reference rate,
    /// raised to the highest rate in the grid.
    pub fn capture_sample_rate(&self) -> u32 {
        self.degradation
            .sample_rates
            .iter()
            .copied()
            .fold(self.capture.reference_sample_rate, u32::max)
    }

    /// Depth the reference is held at, raised to the deepest depth in the grid.
    pub fn capture_bit_depth(&self) -> BitDepth {
        self.degradation
            .bit_depths
            .iter()
            .copied()
            .fold(self.capture.reference_bit_depth, |deepest, d| {
                if d.bits() > deepest.bits() {
                    d
                } else {
                    deepest
                }
            })
    }

    /// Number of rows a run produces.
    pub fn combination_count(&self) -> usize {
        self.degradation.sample_rates.len() * self.degradation.bit_depths.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let mut original = AppConfig::default();
        original.capture.device_index = Some(2);
        original.degradation.bit_depths = vec![BitDepth::Twelve, BitDepth::TwentyFour];
        original.degradation.scoring = ScoringMode::Artifact;
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");
        assert_eq!(loaded, original);
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let config = AppConfig::load_from(&dir.path().join("nonexistent.toml")).expect("load");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn defaults_match_documented_grid() {
        let config = AppConfig::default();
        assert_eq!(config.degradation.sample_rates, vec![8_000, 16_000, 44_100]);
        assert_eq!(config.degradation.bit_depths, vec![BitDepth::Eight, BitDepth::Sixteen]);
        assert_eq!(config.capture.reference_sample_rate, 48_000);
        assert_eq!(config.capture.reference_bit_depth, BitDepth::ThirtyTwo);
        assert_eq!(config.output.dir, PathBuf::from("results"));
        assert!(!config.playback.enabled);
        assert_eq!(config.combination_count(), 6);
        config.validate().expect("defaults are valid");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[degradation]\nbit_depths = [24]\n").unwrap();

        let config = AppConfig::load_from(&path).expect("load");
        assert_eq!(config.degradation.bit_depths, vec![BitDepth::TwentyFour]);
        assert_eq!(config.degradation.sample_rates, vec![8_000, 16_000, 44_100]);
        assert_eq!(config.capture, CaptureConfig::default());
    }

    #[test]
    fn unsupported_bit_depth_rejected_at_load() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[degradation]\nbit_depths = [8, 10]\n").unwrap();

        let err = AppConfig::load_from(&path).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("unsupported bit depth: 10"), "{msg}");
    }

    #[test]
    fn validate_rejects_degenerate_settings() {
        let mut c = AppConfig::default();
        c.capture.duration_secs = 0.0;
        assert!(c.validate().is_err());

        let mut c = AppConfig::default();
        c.degradation.sample_rates.clear();
        assert!(c.validate().is_err());

        let mut c = AppConfig::default();
        c.degradation.sample_rates.push(0);
        assert!(c.validate().is_err());

        let mut c = AppConfig::default();
        c.degradation.bit_depths.clear();
        assert!(c.validate().is_err());
    }

    #[test]
    fn reference_is_never_below_the_grid() {
        let config = AppConfig::default();
        assert_eq!(config.capture_sample_rate(), 48_000);
        assert_eq!(config.capture_bit_depth(), BitDepth::ThirtyTwo);

        let mut config = AppConfig::default();
        config.degradation.sample_rates = vec![8_000, 96_000];
        config.capture.reference_bit_depth = BitDepth::Sixteen;
        config.degradation.bit_depths = vec![BitDepth::Eight, BitDepth::TwentyFour];
        config.validate().expect("valid");
        assert_eq!(config.capture_sample_rate(), 96_000);
        assert_eq!(config.capture_bit_depth(), BitDepth::TwentyFour);
    }

    #[test]
    fn scoring_mode_parses() {
        assert_eq!("Artifact".parse::<ScoringMode>(), Ok(ScoringMode::Artifact));
        assert_eq!("preview".parse::<ScoringMode>(), Ok(ScoringMode::Preview));
        assert!("lossless".parse::<ScoringMode>().is_err());
    }

    #[test]
    fn output_paths_live_in_dir() {
        let out = OutputConfig::default();
        assert_eq!(out.report_path(), PathBuf::from("results").join("report.txt"));
        assert_eq!(out.json_path(), PathBuf::from("results").join("results.json"));
    }
}
