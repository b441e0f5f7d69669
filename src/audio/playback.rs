//! Blocking playback via `cpal`.
//!
//! Plays a mono [`Waveform`] on the default output device, duplicating each
//! sample to every device channel.  When the device cannot run at the
//! waveform's rate the waveform is resampled to the device's default rate
//! first, so low-rate artifacts (8 kHz) still play at the right pitch.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;

use super::backend::PlaybackError;
use super::resample::resample;
use super::Waveform;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Time allowed past the waveform's duration for the device to drain.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Find an F32 output config at `rate`, if the device has one.
fn f32_config_at(device: &cpal::Device, rate: u32) -> Option<cpal::StreamConfig> {
    device
        .supported_output_configs()
        .ok()?
        .filter(|r| r.sample_format() == SampleFormat::F32)
        .find(|r| r.min_sample_rate().0 <= rate && rate <= r.max_sample_rate().0)
        .map(|r| r.with_sample_rate(cpal::SampleRate(rate)).config())
}

/// Play `waveform` on `host`'s default output device, blocking until done.
pub fn play_blocking(host: &cpal::Host, waveform: &Waveform) -> Result<(), PlaybackError> {
    if waveform.is_empty() {
        return Ok(());
    }

    let device = host.default_output_device().ok_or(PlaybackError::NoDevice)?;

    let (config, audio) = match f32_config_at(&device, waveform.sample_rate()) {
        Some(config) => (config, waveform.clone()),
        None => {
            let default_rate = device
                .default_output_config()
                .map_err(|e| PlaybackError::Config(e.to_string()))?
                .sample_rate()
                .0;
            let config = f32_config_at(&device, default_rate).ok_or_else(|| {
                PlaybackError::Config(format!("no f32 output at {default_rate} Hz"))
            })?;
            log::debug!(
                "playback: resampling {} Hz -> {default_rate} Hz for output",
                waveform.sample_rate()
            );
            let audio = resample(waveform, default_rate)
                .map_err(|e| PlaybackError::Config(e.to_string()))?;
            (config, audio)
        }
    };

    let channels = usize::from(config.channels.max(1));
    let position = Arc::new(AtomicUsize::new(0));
    let cursor = Arc::clone(&position);
    let samples = audio.clone();

    let stream = device.build_output_stream(
        &config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            let src = samples.samples();
            let mut pos = cursor.load(Ordering::Relaxed);
            for frame in data.chunks_mut(channels) {
                let value = src.get(pos).copied().unwrap_or(0.0);
                frame.fill(value);
                pos += 1;
            }
            cursor.store(pos, Ordering::Relaxed);
        },
        |err: cpal::StreamError| {
            log::error!("playback: stream error: {err}");
        },
        None,
    )?;
    stream.play()?;

    let deadline = Instant::now() + Duration::from_secs_f64(audio.duration_secs()) + DRAIN_GRACE;
    while position.load(Ordering::Relaxed) < audio.len() && Instant::now() < deadline {
        thread::sleep(POLL_INTERVAL);
    }
    drop(stream);
    Ok(())
}
