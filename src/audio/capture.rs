//! Microphone capture via `cpal`.
//!
//! [`CpalBackend`] implements [`AudioBackend`] on the default cpal host.
//! A capture opens the requested input device at exactly the requested rate,
//! downmixes each callback buffer to mono into a shared `Vec`, and returns
//! once enough samples have arrived.
//!
//! ```text
//! cpal callback (audio thread)          caller thread
//! ─────────────────────────────         ──────────────────────────────
//! &[T] ─▶ f32 ─▶ stereo_to_mono ─▶ Arc<Mutex<Vec<f32>>> ◀─ poll every 20 ms
//!                                                          until full, deadline
//!                                                          or interrupt
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, SupportedStreamConfigRange};

use super::backend::{AudioBackend, CaptureError, CaptureRequest, InputDeviceInfo, PlaybackError};
use super::playback::play_blocking;
use super::resample::stereo_to_mono;
use super::Waveform;

/// How often the caller thread checks the shared buffer.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Extra time allowed after the nominal duration for the device to deliver
/// its last buffers.
const GRACE_PERIOD: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// CpalBackend
// ---------------------------------------------------------------------------

/// [`AudioBackend`] on the system's default cpal host.
pub struct CpalBackend {
    host: cpal::Host,
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CpalBackend {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    fn devices(&self) -> Result<Vec<cpal::Device>, CaptureError> {
        self.host
            .input_devices()
            .map(|devices| devices.collect())
            .map_err(|e| CaptureError::Devices(e.to_string()))
    }

    fn select_device(&self, index: Option<usize>) -> Result<cpal::Device, CaptureError> {
        match index {
            None => self.host.default_input_device().ok_or(CaptureError::NoDevice),
            Some(index) => {
                let mut devices = self.devices()?;
                if devices.is_empty() {
                    return Err(CaptureError::NoDevice);
                }
                let count = devices.len();
                if index >= count {
                    return Err(CaptureError::DeviceIndexOutOfRange { index, count });
                }
                Ok(devices.swap_remove(index))
            }
        }
    }
}

fn device_name(device: &cpal::Device) -> String {
    device.name().unwrap_or_else(|_| "unknown".to_string())
}

/// Preference among sample formats; `None` for formats we do not convert.
fn format_rank(format: SampleFormat) -> Option<u8> {
    match format {
        SampleFormat::F32 => Some(0),
        SampleFormat::I16 => Some(1),
        SampleFormat::I32 => Some(2),
        SampleFormat::U16 => Some(3),
        SampleFormat::U8 => Some(4),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NoConfig {
    Rate,
    Format,
}

/// Pick the config range that can run at `sample_rate`, preferring float
/// samples and then the fewest channels.
fn pick_config(
    ranges: impl Iterator<Item = SupportedStreamConfigRange>,
    sample_rate: u32,
) -> Result<SupportedStreamConfigRange, NoConfig> {
    let at_rate: Vec<_> = ranges
        .filter(|r| r.min_sample_rate().0 <= sample_rate && sample_rate <= r.max_sample_rate().0)
        .collect();
    if at_rate.is_empty() {
        return Err(NoConfig::Rate);
    }
    at_rate
        .into_iter()
        .filter_map(|r| format_rank(r.sample_format()).map(|rank| (rank, r.channels(), r)))
        .min_by_key(|(rank, channels, _)| (*rank, *channels))
        .map(|(_, _, r)| r)
        .ok_or(NoConfig::Format)
}

/// Build an input stream that appends mono `f32` samples to `sink`.
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sink: Arc<Mutex<Vec<f32>>>,
) -> Result<cpal::Stream, CaptureError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels;
    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let floats: Vec<f32> = data.iter().map(|&s| f32::from_sample(s)).collect();
            let mono = stereo_to_mono(&floats, channels);
            if let Ok(mut buf) = sink.lock() {
                buf.extend_from_slice(&mono);
            }
        },
        |err: cpal::StreamError| {
            log::error!("capture: stream error: {err}");
        },
        None,
    )?;
    Ok(stream)
}

impl AudioBackend for CpalBackend {
    fn input_devices(&self) -> Result<Vec<InputDeviceInfo>, CaptureError> {
        let devices = self.devices()?;
        Ok(devices
            .iter()
            .enumerate()
            .map(|(index, device)| {
                let max_input_channels = device
                    .supported_input_configs()
                    .map(|ranges| ranges.map(|r| r.channels()).max().unwrap_or(0))
                    .unwrap_or(0);
                let default_sample_rate = device
                    .default_input_config()
                    .map(|c| c.sample_rate().0)
                    .unwrap_or(0);
                InputDeviceInfo {
                    index,
                    name: device_name(device),
                    max_input_channels,
                    default_sample_rate,
                }
            })
            .collect())
    }

    fn capture(&self, request: &CaptureRequest, interrupt: &AtomicBool) -> Result<Waveform, CaptureError> {
        let device = self.select_device(request.device)?;
        let name = device_name(&device);

        let ranges = device
            .supported_input_configs()
            .map_err(|e| CaptureError::Devices(e.to_string()))?;
        let range = pick_config(ranges, request.sample_rate).map_err(|missing| match missing {
            NoConfig::Format => CaptureError::UnsupportedSampleFormat { device: name.clone() },
            NoConfig::Rate => CaptureError::UnsupportedSampleRate {
                device: name.clone(),
                sample_rate: request.sample_rate,
            },
        })?;

        let format = range.sample_format();
        let config: cpal::StreamConfig = range
            .with_sample_rate(cpal::SampleRate(request.sample_rate))
            .config();
        log::info!(
            "capture: '{name}' {} Hz, {} ch, {format:?}, {:.1}s",
            request.sample_rate,
            config.channels,
            request.duration.as_secs_f64()
        );

        let expected = request.expected_samples();
        let buffer = Arc::new(Mutex::new(Vec::with_capacity(expected)));

        let stream = match format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, Arc::clone(&buffer))?,
            SampleFormat::I16 => build_stream::<i16>(&device, &config, Arc::clone(&buffer))?,
            SampleFormat::I32 => build_stream::<i32>(&device, &config, Arc::clone(&buffer))?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, Arc::clone(&buffer))?,
            SampleFormat::U8 => build_stream::<u8>(&device, &config, Arc::clone(&buffer))?,
            _ => return Err(CaptureError::UnsupportedSampleFormat { device: name }),
        };
        stream.play()?;

        let deadline = Instant::now() + request.duration + GRACE_PERIOD;
        loop {
            if interrupt.load(Ordering::SeqCst) {
                return Err(CaptureError::Interrupted);
            }
            let have = buffer.lock().map(|b| b.len()).unwrap_or(0);
            if have >= expected {
                break;
            }
            if Instant::now() >= deadline {
                log::warn!("capture: device delivered {have} of {expected} samples before the deadline");
                break;
            }
            thread::sleep(POLL_INTERVAL);
        }
        drop(stream);

        let mut samples = match buffer.lock() {
            Ok(mut b) => std::mem::take(&mut *b),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        samples.truncate(expected);
        if samples.is_empty() {
            return Err(CaptureError::Empty);
        }

        log::info!("capture: recorded {} samples", samples.len());
        Ok(Waveform::new(samples, request.sample_rate))
    }

    fn play(&self, waveform: &Waveform) -> Result<(), PlaybackError> {
        play_blocking(&self.host, waveform)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
