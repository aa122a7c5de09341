// Streaming audio capture via cpal
//
// A CaptureStream owns one cpal input stream. The callback takes the first
// channel of each delivered chunk, records the chunk RMS in an atomic level
// meter, and appends a copy to the shared ring buffer. Dropping the stream
// stops capture (Capturing -> Idle). Runtime stream errors raise a failure
// flag that the recognition loop observes and stops on; device-open failures
// surface immediately and are not retried.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::analysis::features::{dbfs, rms};
use crate::audio::ring_buffer::RingBuffer;
use crate::error::AudioError;

pub struct CaptureStream {
    // Held only to keep the stream alive; dropping it closes the device.
    _stream: cpal::Stream,
    level_bits: Arc<AtomicU64>,
    failed: Arc<AtomicBool>,
}

impl CaptureStream {
    /// Open an input stream at `fs` delivering ~`chunk_frames` frames per
    /// callback into `ring`.
    pub fn open(
        fs: u32,
        device_name: Option<&str>,
        chunk_frames: usize,
        ring: Arc<RingBuffer>,
    ) -> Result<Self, AudioError> {
        let device = select_input_device(device_name)?;
        let (config, channels) = input_config(&device, fs, chunk_frames)?;

        let level_bits = Arc::new(AtomicU64::new(0f64.to_bits()));
        let failed = Arc::new(AtomicBool::new(false));

        let cb_level = Arc::clone(&level_bits);
        let err_failed = Arc::clone(&failed);
        let err_fn = move |err: cpal::StreamError| {
            tracing::error!("input stream error: {}", err);
            err_failed.store(true, Ordering::SeqCst);
        };

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let chunk = first_channel(data, channels);
                    cb_level.store(rms(&chunk).to_bits(), Ordering::Relaxed);
                    ring.push(chunk);
                },
                err_fn,
                None,
            )
            .map_err(|e| AudioError::StreamOpenFailed {
                reason: format!("{}", e),
            })?;

        stream.play().map_err(|e| AudioError::StreamOpenFailed {
            reason: format!("failed to start stream: {}", e),
        })?;

        Ok(Self {
            _stream: stream,
            level_bits,
            failed,
        })
    }

    /// RMS of the most recent chunk, for a caller's level meter.
    pub fn level_rms(&self) -> f64 {
        f64::from_bits(self.level_bits.load(Ordering::Relaxed))
    }

    pub fn level_dbfs(&self) -> f64 {
        dbfs(self.level_rms())
    }

    /// Shared flag raised by the error callback; observed by the
    /// recognition loop.
    pub fn failure_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.failed)
    }

    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }
}

/// Record exactly `seconds` of mono audio and return the samples.
/// Synchronous; does not touch any streaming ring buffer.
pub fn record_fixed_duration(
    fs: u32,
    seconds: f64,
    device_name: Option<&str>,
) -> Result<Vec<f32>, AudioError> {
    let target = (seconds * fs as f64).round() as usize;
    if target == 0 {
        return Ok(Vec::new());
    }

    let device = select_input_device(device_name)?;
    let chunk_frames = ((fs as f64 * 0.1) as usize).max(32);
    let (config, channels) = input_config(&device, fs, chunk_frames)?;

    let collected: Arc<Mutex<Vec<f32>>> = Arc::new(Mutex::new(Vec::with_capacity(target)));
    let failed = Arc::new(AtomicBool::new(false));

    let cb_collected = Arc::clone(&collected);
    let err_failed = Arc::clone(&failed);
    let err_fn = move |err: cpal::StreamError| {
        tracing::error!("recording stream error: {}", err);
        err_failed.store(true, Ordering::SeqCst);
    };

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let chunk = first_channel(data, channels);
                let mut samples = cb_collected
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                if samples.len() < target {
                    samples.extend_from_slice(&chunk);
                }
            },
            err_fn,
            None,
        )
        .map_err(|e| AudioError::StreamOpenFailed {
            reason: format!("{}", e),
        })?;

    stream.play().map_err(|e| AudioError::StreamOpenFailed {
        reason: format!("failed to start stream: {}", e),
    })?;

    let deadline = Instant::now() + Duration::from_secs_f64(seconds * 2.0 + 2.0);
    loop {
        std::thread::sleep(Duration::from_millis(10));
        if failed.load(Ordering::SeqCst) {
            return Err(AudioError::StreamFailure {
                reason: "input stream reported an error during recording".into(),
            });
        }
        let len = collected
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len();
        if len >= target {
            break;
        }
        if Instant::now() >= deadline {
            drop(stream);
            return Err(AudioError::ShortCapture {
                expected: target,
                captured: len,
            });
        }
    }
    drop(stream);

    let mut samples = collected
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone();
    samples.truncate(target);
    Ok(samples)
}

fn select_input_device(name: Option<&str>) -> Result<cpal::Device, AudioError> {
    let host = cpal::default_host();
    match name {
        Some(wanted) => host
            .input_devices()
            .map_err(|e| AudioError::StreamOpenFailed {
                reason: format!("cannot enumerate input devices: {}", e),
            })?
            .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
            .ok_or_else(|| AudioError::NoInputDevice {
                name: Some(wanted.to_string()),
            }),
        None => host
            .default_input_device()
            .ok_or(AudioError::NoInputDevice { name: None }),
    }
}

fn input_config(
    device: &cpal::Device,
    fs: u32,
    chunk_frames: usize,
) -> Result<(cpal::StreamConfig, usize), AudioError> {
    let supported = device
        .default_input_config()
        .map_err(|e| AudioError::StreamOpenFailed {
            reason: format!("cannot query input config: {}", e),
        })?;
    if supported.sample_format() != cpal::SampleFormat::F32 {
        return Err(AudioError::StreamOpenFailed {
            reason: format!(
                "only F32 input is supported, device offers {:?}",
                supported.sample_format()
            ),
        });
    }

    let mut config: cpal::StreamConfig = supported.into();
    config.sample_rate = cpal::SampleRate(fs);
    config.buffer_size = cpal::BufferSize::Fixed(chunk_frames as u32);
    let channels = config.channels as usize;
    Ok((config, channels))
}

/// De-interleave: keep the first channel only.
fn first_channel(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks(channels).map(|frame| frame[0]).collect()
}
