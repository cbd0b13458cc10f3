//! Audio Playback Module
//!
//! Renders the decoded loop through the default cpal output device, forever.
//! Pan and volume are shared with the stream callback through atomic f32
//! cells so the dispatch loop never blocks the audio thread.

pub mod loader;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use loader::DecodedLoop;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio device error: {0}")]
    Device(String),
    #[error("audio decode error: {0}")]
    Decode(String),
    #[error("unsupported output sample format: {0}")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Lock-free f32 cell with a fixed valid range.
///
/// Values are clamped before they are stored, so readers on the audio
/// thread always observe something inside the range. Non-finite writes are
/// dropped.
#[derive(Clone)]
pub struct SharedLevel {
    bits: Arc<AtomicU32>,
    min: f32,
    max: f32,
}

impl SharedLevel {
    fn new(initial: f32, min: f32, max: f32) -> Self {
        Self {
            bits: Arc::new(AtomicU32::new(initial.clamp(min, max).to_bits())),
            min,
            max,
        }
    }

    pub fn set(&self, value: f32) {
        if !value.is_finite() {
            return;
        }
        self.bits
            .store(value.clamp(self.min, self.max).to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

/// Equal-power stereo gains (left, right) for a pan in [-1, 1].
pub fn pan_gains(pan: f32) -> (f32, f32) {
    let theta = (pan.clamp(-1.0, 1.0) + 1.0) * std::f32::consts::FRAC_PI_4;
    (theta.cos(), theta.sin())
}

/// Endless reader over the decoded mono loop.
///
/// Steps through the source at the ratio of source rate to device rate with
/// linear interpolation, wrapping at the end of the buffer.
struct LoopSource {
    samples: Arc<Vec<f32>>,
    position: f64,
    step: f64,
}

impl LoopSource {
    fn new(samples: Arc<Vec<f32>>, source_rate: u32, output_rate: u32) -> Self {
        Self {
            samples,
            position: 0.0,
            step: source_rate as f64 / output_rate as f64,
        }
    }

    fn next_frame(&mut self) -> f32 {
        let len = self.samples.len();
        let index = self.position as usize;
        let frac = (self.position - index as f64) as f32;
        let a = self.samples[index % len];
        let b = self.samples[(index + 1) % len];

        self.position += self.step;
        if self.position >= len as f64 {
            self.position -= len as f64;
        }

        a + (b - a) * frac
    }
}

/// Looping playback of one decoded buffer with live pan and volume.
pub struct AudioPlayer {
    stream: cpal::Stream,
    pan: SharedLevel,
    volume: SharedLevel,
    playing: bool,
}

impl AudioPlayer {
    /// Build a paused output stream over `loop_data`. Call [`start`] to make
    /// it audible.
    ///
    /// [`start`]: AudioPlayer::start
    pub fn new(loop_data: DecodedLoop, initial_volume: f32) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::Device("no default output device".to_string()))?;
        let default_config = device
            .default_output_config()
            .map_err(|e| AudioError::Device(e.to_string()))?;
        let config = default_config.config();

        info!(
            "Audio output: {} ch at {} Hz ({:?}), loop is {:.1}s at {} Hz",
            config.channels,
            config.sample_rate.0,
            default_config.sample_format(),
            loop_data.duration_secs(),
            loop_data.sample_rate,
        );

        // The loop starts anchored fully right; orientation events move it.
        let pan = SharedLevel::new(1.0, -1.0, 1.0);
        let volume = SharedLevel::new(initial_volume, 0.0, 1.0);
        let source = LoopSource::new(
            Arc::new(loop_data.samples),
            loop_data.sample_rate,
            config.sample_rate.0,
        );

        let stream = match default_config.sample_format() {
            cpal::SampleFormat::F32 => {
                build_stream::<f32>(&device, &config, source, pan.clone(), volume.clone())?
            }
            cpal::SampleFormat::I16 => {
                build_stream::<i16>(&device, &config, source, pan.clone(), volume.clone())?
            }
            cpal::SampleFormat::U16 => {
                build_stream::<u16>(&device, &config, source, pan.clone(), volume.clone())?
            }
            other => return Err(AudioError::UnsupportedFormat(format!("{other:?}"))),
        };

        Ok(Self {
            stream,
            pan,
            volume,
            playing: false,
        })
    }

    /// Start playback. Idempotent.
    pub fn start(&mut self) -> Result<(), AudioError> {
        if self.playing {
            return Ok(());
        }
        self.stream
            .play()
            .map_err(|e| AudioError::Device(e.to_string()))?;
        self.playing = true;
        info!("Audio loop started");
        Ok(())
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_pan(&self, pan: f32) {
        self.pan.set(pan);
    }

    pub fn pan(&self) -> f32 {
        self.pan.get()
    }

    pub fn set_volume(&self, volume: f32) {
        self.volume.set(volume);
    }

    pub fn volume(&self) -> f32 {
        self.volume.get()
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut source: LoopSource,
    pan: SharedLevel,
    volume: SharedLevel,
) -> Result<cpal::Stream, AudioError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let (left, right) = pan_gains(pan.get());
                let vol = volume.get();

                for frame in data.chunks_mut(channels) {
                    let sample = source.next_frame() * vol;
                    if frame.len() == 1 {
                        frame[0] = T::from_sample(sample);
                        continue;
                    }
                    frame[0] = T::from_sample(sample * left);
                    frame[1] = T::from_sample(sample * right);
                    for extra in &mut frame[2..] {
                        *extra = T::from_sample(0.0f32);
                    }
                }
            },
            move |err| {
                error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| AudioError::Device(e.to_string()))?;

    // Streams start live on some hosts; keep it silent until start().
    stream
        .pause()
        .map_err(|e| AudioError::Device(e.to_string()))?;

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn pan_gains_at_extremes() {
        let (l, r) = pan_gains(-1.0);
        assert!((l - 1.0).abs() < EPSILON);
        assert!(r.abs() < EPSILON);

        let (l, r) = pan_gains(1.0);
        assert!(l.abs() < EPSILON);
        assert!((r - 1.0).abs() < EPSILON);
    }

    #[test]
    fn pan_gains_equal_power() {
        let mut pan = -1.0f32;
        while pan <= 1.0 {
            let (l, r) = pan_gains(pan);
            assert!((l * l + r * r - 1.0).abs() < 1e-4, "pan {}", pan);
            pan += 0.05;
        }
        let (l, r) = pan_gains(0.0);
        assert!((l - r).abs() < EPSILON);
    }

    #[test]
    fn pan_gains_clamp_out_of_domain_input() {
        assert_eq!(pan_gains(5.0), pan_gains(1.0));
        assert_eq!(pan_gains(-5.0), pan_gains(-1.0));
    }

    #[test]
    fn shared_level_clamps_and_rejects_non_finite() {
        let level = SharedLevel::new(0.0, -1.0, 1.0);
        level.set(2.0);
        assert_eq!(level.get(), 1.0);
        level.set(-3.5);
        assert_eq!(level.get(), -1.0);
        level.set(f32::NAN);
        assert_eq!(level.get(), -1.0);
        level.set(0.25);
        assert_eq!(level.get(), 0.25);
    }

    #[test]
    fn loop_source_wraps_around() {
        let samples = Arc::new(vec![0.0f32, 1.0, 0.0, -1.0]);
        let mut source = LoopSource::new(samples, 48_000, 48_000);

        let first_cycle: Vec<f32> = (0..4).map(|_| source.next_frame()).collect();
        let second_cycle: Vec<f32> = (0..4).map(|_| source.next_frame()).collect();
        assert_eq!(first_cycle, vec![0.0, 1.0, 0.0, -1.0]);
        assert_eq!(first_cycle, second_cycle);
    }

    #[test]
    fn loop_source_interpolates_between_samples() {
        let samples = Arc::new(vec![0.0f32, 1.0]);
        // Half-rate source: every other output frame sits between samples.
        let mut source = LoopSource::new(samples, 24_000, 48_000);

        assert!((source.next_frame() - 0.0).abs() < EPSILON);
        assert!((source.next_frame() - 0.5).abs() < EPSILON);
        assert!((source.next_frame() - 1.0).abs() < EPSILON);
        // Interpolation wraps toward the first sample.
        assert!((source.next_frame() - 0.5).abs() < EPSILON);
    }
}
