//! Synthetic reference source.
//!
//! [`ToneBackend`] "records" a pure sine instead of opening a microphone.
//! It makes runs reproducible and lets the whole pipeline execute on
//! machines without audio input (CI, containers).  Playback still goes to
//! the real default output device.

use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};

use super::backend::{AudioBackend, CaptureError, CaptureRequest, InputDeviceInfo, PlaybackError};
use super::playback::play_blocking;
use super::Waveform;

/// A sine generator posing as a single input device.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneBackend {
    pub frequency_hz: f64,
    /// Peak amplitude, `1.0` is full scale.
    pub amplitude: f32,
}

impl Default for ToneBackend {
    fn default() -> Self {
        Self::new(997.0)
    }
}

impl ToneBackend {
    pub fn new(frequency_hz: f64) -> Self {
        Self {
            frequency_hz,
            amplitude: 0.9,
        }
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// `len` samples of the tone at `sample_rate` Hz.
    pub fn generate(&self, sample_rate: u32, len: usize) -> Waveform {
        let step = 2.0 * PI * self.frequency_hz / f64::from(sample_rate);
        let samples: Vec<f32> = (0..len)
            .map(|i| self.amplitude * (step * i as f64).sin() as f32)
            .collect();
        Waveform::new(samples, sample_rate)
    }
}

impl AudioBackend for ToneBackend {
    fn input_devices(&self) -> Result<Vec<InputDeviceInfo>, CaptureError> {
        Ok(vec![InputDeviceInfo {
            index: 0,
            name: format!("synthetic {} Hz tone", self.frequency_hz),
            max_input_channels: 1,
            default_sample_rate: 48_000,
        }])
    }

    fn capture(&self, request: &CaptureRequest, interrupt: &AtomicBool) -> Result<Waveform, CaptureError> {
        if let Some(index) = request.device.filter(|&i| i != 0) {
            return Err(CaptureError::DeviceIndexOutOfRange { index, count: 1 });
        }
        if interrupt.load(Ordering::SeqCst) {
            return Err(CaptureError::Interrupted);
        }
        let len = request.expected_samples();
        if len == 0 {
            return Err(CaptureError::Empty);
        }
        log::info!(
            "capture: generating {:.1}s of {} Hz tone at {} Hz",
            request.duration.as_secs_f64(),
            self.frequency_hz,
            request.sample_rate
        );
        Ok(self.generate(request.sample_rate, len))
    }

    fn play(&self, waveform: &Waveform) -> Result<(), PlaybackError> {
        play_blocking(&cpal::default_host(), waveform)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn request(device: Option<usize>, secs: f64) -> CaptureRequest {
        CaptureRequest {
            device,
            sample_rate: 16_000,
            duration: Duration::from_secs_f64(secs),
        }
    }

    #[test]
    fn capture_produces_requested_length_and_level() {
        let backend = ToneBackend::new(440.0).with_amplitude(0.5);
        let w = backend
            .capture(&request(None, 0.5), &AtomicBool::new(false))
            .unwrap();
        assert_eq!(w.sample_rate(), 16_000);
        assert_eq!(w.len(), 8_000);
        assert!((w.peak() - 0.5).abs() < 1e-3);
        assert!((w.rms() - 0.5 / 2f64.sqrt()).abs() < 1e-3);
    }

    #[test]
    fn only_device_zero_exists() {
        let backend = ToneBackend::default();
        assert_eq!(backend.input_devices().unwrap().len(), 1);
        assert!(backend.capture(&request(Some(0), 0.1), &AtomicBool::new(false)).is_ok());
        let err = backend
            .capture(&request(Some(3), 0.1), &AtomicBool::new(false))
            .unwrap_err();
        assert!(matches!(err, CaptureError::DeviceIndexOutOfRange { index: 3, count: 1 }));
    }

    #[test]
    fn interrupt_is_honoured() {
        let err = ToneBackend::default()
            .capture(&request(None, 1.0), &AtomicBool::new(true))
            .unwrap_err();
        assert!(matches!(err, CaptureError::Interrupted));
    }

    #[test]
    fn zero_duration_is_empty() {
        let err = ToneBackend::default()
            .capture(&request(None, 0.0), &AtomicBool::new(false))
            .unwrap_err();
        assert!(matches!(err, CaptureError::Empty));
    }
}
