//! Application entry point for snr-lab.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] (default on first run) and apply CLI overrides.
//! 3. Pick the audio backend: a synthetic tone with `--tone`, cpal otherwise.
//! 4. Prompt for device, grid and duration when stdin is a terminal.
//! 5. Install the Ctrl-C flag, run the [`DegradationPipeline`] and print the
//!    results table.
//!
//! Exit status: 0 on success, 130 when interrupted, 1 on any other failure.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use snr_lab::{
    audio::{AudioBackend, CpalBackend, ToneBackend},
    codec::BitDepth,
    config::{AppConfig, AppPaths, ScoringMode},
    interactive::{parse_bit_depth, Prompter},
    pipeline::{DegradationPipeline, PipelineError, PipelineOptions},
    report::{self, format_snr, render_table},
};

const EXIT_INTERRUPTED: u8 = 130;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

/// Record a reference, degrade it across sample rates and bit depths, and
/// rank the results by SNR.
#[derive(Parser, Debug)]
#[command(name = "snr-lab", author, version, about)]
struct Cli {
    /// Settings file (default: platform config dir)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Input device index (see --list-devices)
    #[arg(long, short = 'd')]
    device: Option<usize>,

    /// Sample rates to test, comma separated
    #[arg(long, value_delimiter = ',')]
    rates: Option<Vec<u32>>,

    /// Bit depths to test, comma separated (8, 12, 16, 24, 32)
    #[arg(long, value_delimiter = ',', value_parser = parse_bit_depth)]
    depths: Option<Vec<BitDepth>>,

    /// Recording length in seconds
    #[arg(long, short = 't')]
    duration: Option<f64>,

    /// Rate the reference is recorded at
    #[arg(long)]
    reference_rate: Option<u32>,

    /// Depth the reference is held at
    #[arg(long, value_parser = parse_bit_depth)]
    reference_depth: Option<BitDepth>,

    /// Score the in-memory preview or the WAV read back from disk
    #[arg(long)]
    scoring: Option<ScoringMode>,

    /// Output directory for WAV files and reports
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Use a synthetic sine of this frequency instead of a microphone
    #[arg(long, value_name = "HZ")]
    tone: Option<f64>,

    /// Play the reference and every artifact
    #[arg(long)]
    play: bool,

    /// Print input devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Never prompt, even on a terminal
    #[arg(long)]
    non_interactive: bool,

    /// Write the effective settings back to the settings file
    #[arg(long)]
    save_config: bool,
}

impl Cli {
    fn settings_file(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| AppPaths::new().settings_file)
    }

    fn load_config(&self) -> Result<AppConfig> {
        match &self.config {
            Some(path) => AppConfig::load_from(path),
            None => AppConfig::load(),
        }
    }

    fn store_config(&self, config: &AppConfig) -> Result<()> {
        match &self.config {
            Some(path) => config.save_to(path),
            None => config.save(),
        }
    }

    fn apply(&self, config: &mut AppConfig) {
        if let Some(device) = self.device {
            config.capture.device_index = Some(device);
        }
        if let Some(rates) = &self.rates {
            config.degradation.sample_rates = rates.clone();
        }
        if let Some(depths) = &self.depths {
            config.degradation.bit_depths = depths.clone();
        }
        if let Some(secs) = self.duration {
            config.capture.duration_secs = secs;
        }
        if let Some(rate) = self.reference_rate {
            config.capture.reference_sample_rate = rate;
        }
        if let Some(depth) = self.reference_depth {
            config.capture.reference_bit_depth = depth;
        }
        if let Some(scoring) = self.scoring {
            config.degradation.scoring = scoring;
        }
        if let Some(dir) = &self.output {
            config.output.dir = dir.clone();
        }
        if self.play {
            config.playback.enabled = true;
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if is_interrupt(&e) => {
            eprintln!("interrupted");
            ExitCode::from(EXIT_INTERRUPTED)
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn is_interrupt(e: &anyhow::Error) -> bool {
    matches!(e.downcast_ref::<PipelineError>(), Some(PipelineError::Interrupted))
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = cli.load_config()?;
    cli.apply(&mut config);

    let backend: Box<dyn AudioBackend> = match cli.tone {
        Some(hz) => {
            log::info!("using synthetic {hz} Hz tone instead of a microphone");
            Box::new(ToneBackend::new(hz))
        }
        None => Box::new(CpalBackend::new()),
    };

    if cli.list_devices {
        for device in backend.input_devices()? {
            println!("{device}");
        }
        return Ok(());
    }

    if !cli.non_interactive && io::stdin().is_terminal() {
        let devices = backend.input_devices().unwrap_or_else(|e| {
            log::warn!("could not list input devices: {e}");
            Vec::new()
        });
        Prompter::new(io::stdin().lock(), io::stdout().lock())
            .configure(&mut config, &devices)
            .context("reading answers")?;
    }

    config.validate().context("invalid settings")?;
    if cli.save_config {
        cli.store_config(&config)?;
        log::info!("settings saved to {}", cli.settings_file().display());
    }

    let interrupt = Arc::new(AtomicBool::new(false));
    install_interrupt_handler(&interrupt);

    log::info!(
        "recording {:.2} s at {} Hz, testing {} combination(s)",
        config.capture.duration_secs,
        config.capture_sample_rate(),
        config.combination_count()
    );

    let sinks = report::sinks_for(&config.output);
    let mut pipeline =
        DegradationPipeline::new(backend.as_ref(), PipelineOptions::from_config(&config), interrupt);
    let report = pipeline.run(&sinks)?;

    print!("{}", render_table(&report));
    match report.best() {
        Some(best) => println!(
            "Best: {} Hz {} at {} dB",
            best.sample_rate,
            best.bit_depth,
            format_snr(best.snr_db)
        ),
        None => println!("No combination could be scored."),
    }
    log::info!("report written to {}", config.output.report_path().display());
    Ok(())
}

/// First Ctrl-C sets the flag; capture and the grid loop poll it.
#[cfg(unix)]
fn install_interrupt_handler(flag: &Arc<AtomicBool>) {
    if let Err(e) = signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(flag)) {
        log::warn!("could not install Ctrl-C handler: {e}");
    }
}

#[cfg(not(unix))]
fn install_interrupt_handler(_flag: &Arc<AtomicBool>) {
    log::debug!("no Ctrl-C handler on this platform; interrupt ends the process");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn overrides_apply_on_top_of_file() {
        let cli = Cli::parse_from([
            "snr-lab",
            "--rates",
            "11025,22050",
            "--depths",
            "12,24",
            "--duration",
            "1.5",
            "--scoring",
            "artifact",
            "--play",
        ]);
        let mut config = AppConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.degradation.sample_rates, vec![11_025, 22_050]);
        assert_eq!(config.degradation.bit_depths, vec![BitDepth::Twelve, BitDepth::TwentyFour]);
        assert_eq!(config.capture.duration_secs, 1.5);
        assert_eq!(config.degradation.scoring, ScoringMode::Artifact);
        assert!(config.playback.enabled);
        assert_eq!(config.output, AppConfig::default().output);
    }

    #[test]
    fn explicit_config_path_round_trips() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        let cli = Cli::parse_from(["snr-lab", "--config", path.to_str().unwrap(), "--rates", "22050"]);

        let mut config = cli.load_config().expect("load");
        assert_eq!(config, AppConfig::default());
        cli.apply(&mut config);
        cli.store_config(&config).expect("save");

        assert_eq!(cli.settings_file(), path);
        assert_eq!(cli.load_config().expect("reload").degradation.sample_rates, vec![22_050]);
    }

    #[test]
    fn unsupported_depth_is_rejected() {
        assert!(Cli::try_parse_from(["snr-lab", "--depths", "8,10"]).is_err());
    }
}
