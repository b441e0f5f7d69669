//! Terminal prompts for device, grid and duration.
//!
//! Every prompt shows the current value in brackets; an empty line keeps
//! it, invalid input is explained and asked again, end of input keeps the
//! current value.  [`Prompter`] is generic over its reader and writer so the
//! whole dialogue can be driven from a byte slice in tests.

use std::io::{self, BufRead, Write};

use thiserror::Error;

use crate::audio::InputDeviceInfo;
use crate::codec::{BitDepth, FormatError};
use crate::config::AppConfig;

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputError {
    #[error("nothing entered")]
    Empty,

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("{0} must be greater than zero")]
    NotPositive(String),

    #[error("choose a number from 0 to {}", count.saturating_sub(1))]
    OutOfRange { index: usize, count: usize },

    #[error(transparent)]
    Format(#[from] FormatError),
}

fn items(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
}

/// `"8000, 16000 44100"` → `[8000, 16000, 44100]`.
pub fn parse_rate_list(line: &str) -> Result<Vec<u32>, InputError> {
    let rates = items(line)
        .map(|s| {
            let rate: u32 = s.parse().map_err(|_| InputError::NotANumber(s.to_string()))?;
            if rate == 0 {
                return Err(InputError::NotPositive("sample rate".into()));
            }
            Ok(rate)
        })
        .collect::<Result<Vec<_>, _>>()?;
    if rates.is_empty() {
        return Err(InputError::Empty);
    }
    Ok(rates)
}

/// One bit depth; shaped for clap's `value_parser`.
pub fn parse_bit_depth(s: &str) -> Result<BitDepth, String> {
    let bits: u16 = s
        .trim()
        .parse()
        .map_err(|_| InputError::NotANumber(s.to_string()).to_string())?;
    BitDepth::try_from(bits).map_err(|e| e.to_string())
}

/// `"8,16"` → `[Eight, Sixteen]`; unsupported depths are rejected.
pub fn parse_depth_list(line: &str) -> Result<Vec<BitDepth>, InputError> {
    let depths = items(line)
        .map(|s| {
            let bits: u16 = s.parse().map_err(|_| InputError::NotANumber(s.to_string()))?;
            Ok(BitDepth::try_from(bits)?)
        })
        .collect::<Result<Vec<_>, InputError>>()?;
    if depths.is_empty() {
        return Err(InputError::Empty);
    }
    Ok(depths)
}

pub fn parse_duration(line: &str) -> Result<f64, InputError> {
    let s = line.trim();
    if s.is_empty() {
        return Err(InputError::Empty);
    }
    let secs: f64 = s.parse().map_err(|_| InputError::NotANumber(s.to_string()))?;
    if !(secs.is_finite() && secs > 0.0) {
        return Err(InputError::NotPositive("duration".into()));
    }
    Ok(secs)
}

/// Index into a list of `count` devices.
pub fn parse_device(line: &str, count: usize) -> Result<usize, InputError> {
    let s = line.trim();
    if s.is_empty() {
        return Err(InputError::Empty);
    }
    let index: usize = s.parse().map_err(|_| InputError::NotANumber(s.to_string()))?;
    if index >= count {
        return Err(InputError::OutOfRange { index, count });
    }
    Ok(index)
}

fn join<T: ToString>(values: &[T]) -> String {
    values.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

// ---------------------------------------------------------------------------
// Prompter
// ---------------------------------------------------------------------------

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Ask until `parse` accepts the answer.  `Ok(None)` means keep the
    /// current value (empty line or end of input).
    fn ask<T>(
        &mut self,
        question: &str,
        current: &str,
        parse: impl Fn(&str) -> Result<T, InputError>,
    ) -> io::Result<Option<T>> {
        loop {
            write!(self.output, "{question} [{current}]: ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                return Ok(None);
            }
            if line.trim().is_empty() {
                return Ok(None);
            }
            match parse(&line) {
                Ok(value) => return Ok(Some(value)),
                Err(e) => writeln!(self.output, "  {e}, try again")?,
            }
        }
    }

    /// List `devices` and let the user pick one by index.
    pub fn choose_device(
        &mut self,
        devices: &[InputDeviceInfo],
        current: Option<usize>,
    ) -> io::Result<Option<usize>> {
        if devices.is_empty() {
            return Ok(current);
        }
        writeln!(self.output, "Input devices:")?;
        for device in devices {
            writeln!(self.output, "  {device}")?;
        }
        let shown = current.map_or_else(|| "default".to_string(), |i| i.to_string());
        let count = devices.len();
        Ok(self
            .ask("Microphone", &shown, |s| parse_device(s, count))?
            .or(current))
    }

    pub fn ask_rates(&mut self, current: &[u32]) -> io::Result<Vec<u32>> {
        Ok(self
            .ask("Sample rates (Hz)", &join(current), parse_rate_list)?
            .unwrap_or_else(|| current.to_vec()))
    }

    pub fn ask_depths(&mut self, current: &[BitDepth]) -> io::Result<Vec<BitDepth>> {
        let shown: Vec<u16> = current.iter().map(|d| d.bits()).collect();
        Ok(self
            .ask("Bit depths (8/12/16/24/32)", &join(&shown), parse_depth_list)?
            .unwrap_or_else(|| current.to_vec()))
    }

    pub fn ask_duration(&mut self, current: f64) -> io::Result<f64> {
        Ok(self
            .ask("Recording length (s)", &current.to_string(), parse_duration)?
            .unwrap_or(current))
    }

    /// Run the whole dialogue, updating `config` in place.
    pub fn configure(&mut self, config: &mut AppConfig, devices: &[InputDeviceInfo]) -> io::Result<()> {
        config.capture.device_index = self.choose_device(devices, config.capture.device_index)?;
        config.degradation.sample_rates = self.ask_rates(&config.degradation.sample_rates)?;
        config.degradation.bit_depths = self.ask_depths(&config.degradation.bit_depths)?;
        config.capture.duration_secs = self.ask_duration(config.capture.duration_secs)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn devices() -> Vec<InputDeviceInfo> {
        (0..2)
            .map(|index| InputDeviceInfo {
                index,
                name: format!("mic {index}"),
                max_input_channels: 1,
                default_sample_rate: 48_000,
            })
            .collect()
    }

    #[test]
    fn rate_lists() {
        assert_eq!(parse_rate_list("8000, 16000 44100"), Ok(vec![8_000, 16_000, 44_100]));
        assert_eq!(parse_rate_list("  "), Err(InputError::Empty));
        assert_eq!(parse_rate_list("8k"), Err(InputError::NotANumber("8k".into())));
        assert!(matches!(parse_rate_list("0"), Err(InputError::NotPositive(_))));
    }

    #[test]
    fn depth_lists() {
        assert_eq!(parse_depth_list("8,16"), Ok(vec![BitDepth::Eight, BitDepth::Sixteen]));
        assert_eq!(
            parse_depth_list("8,10"),
            Err(InputError::Format(FormatError::UnsupportedBitDepth(10)))
        );
        assert_eq!(parse_bit_depth("24"), Ok(BitDepth::TwentyFour));
        assert!(parse_bit_depth("20").unwrap_err().contains("unsupported"));
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("2.5\n"), Ok(2.5));
        assert!(matches!(parse_duration("-1"), Err(InputError::NotPositive(_))));
        assert!(matches!(parse_duration("abc"), Err(InputError::NotANumber(_))));
    }

    #[test]
    fn device_index_bounds() {
        assert_eq!(parse_device("1", 2), Ok(1));
        assert_eq!(parse_device("2", 2), Err(InputError::OutOfRange { index: 2, count: 2 }));
    }

    #[test]
    fn dialogue_updates_config() {
        let input = b"1\n16000,48000\n24\n0.5\n";
        let mut output = Vec::new();
        let mut config = AppConfig::default();

        Prompter::new(&input[..], &mut output)
            .configure(&mut config, &devices())
            .unwrap();

        assert_eq!(config.capture.device_index, Some(1));
        assert_eq!(config.degradation.sample_rates, vec![16_000, 48_000]);
        assert_eq!(config.degradation.bit_depths, vec![BitDepth::TwentyFour]);
        assert_eq!(config.capture.duration_secs, 0.5);

        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("[1] mic 1 (1 ch, 48000 Hz)"));
        assert!(shown.contains("Sample rates (Hz) [8000,16000,44100]"));
    }

    #[test]
    fn empty_lines_keep_current_values() {
        let input = b"\n\n\n\n";
        let mut config = AppConfig::default();
        Prompter::new(&input[..], Vec::new())
            .configure(&mut config, &devices())
            .unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn invalid_answer_is_asked_again() {
        let input = b"10\n8\n";
        let mut output = Vec::new();
        let depths = Prompter::new(&input[..], &mut output)
            .ask_depths(&[BitDepth::Sixteen])
            .unwrap();
        assert_eq!(depths, vec![BitDepth::Eight]);
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("unsupported bit depth: 10"), "{shown}");
        assert_eq!(shown.matches("Bit depths").count(), 2);
    }

    #[test]
    fn end_of_input_keeps_current() {
        let rates = Prompter::new(&b""[..], Vec::new()).ask_rates(&[8_000]).unwrap();
        assert_eq!(rates, vec![8_000]);
    }
}
