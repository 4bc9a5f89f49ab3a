// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Audio output via cpal.
//!
//! Besides playing the rendered buffer, the output counts the frames it
//! has handed to the device. That count, divided by the sample rate, is
//! the audio clock: it only advances while the stream is actually
//! playing.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use serde::{Deserialize, Serialize};
use tracing::error;

use super::AudioError;

/// Audio output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Buffer size in frames
    pub buffer_size: u32,
    /// Number of output channels
    pub channels: u16,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            buffer_size: 512,
            channels: 2,
        }
    }
}

impl AudioConfig {
    /// Calculate latency in milliseconds
    pub fn latency_ms(&self) -> f64 {
        (self.buffer_size as f64 / self.sample_rate as f64) * 1000.0
    }
}

/// Audio output stream
pub struct AudioOutput {
    /// cpal stream
    stream: Stream,
    /// Output device
    _device: Device,
    /// Current configuration
    config: AudioConfig,
    /// Frames handed to the device so far
    frames: Arc<AtomicU64>,
    /// Set by the error callback until the stream is played again
    suspended: Arc<AtomicBool>,
}

impl AudioOutput {
    /// Create a new audio output with callback
    pub fn new<F>(config: AudioConfig, mut callback: F) -> Result<Self, AudioError>
    where
        F: FnMut(&mut [f32], usize) + Send + 'static,
    {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or(AudioError::NoDevice)?;

        let stream_config = StreamConfig {
            channels: config.channels,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(config.buffer_size),
        };

        let channels = config.channels.max(1) as usize;
        let frames = Arc::new(AtomicU64::new(0));
        let suspended = Arc::new(AtomicBool::new(false));

        let counter = Arc::clone(&frames);
        let failed = Arc::clone(&suspended);

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    data.fill(0.0);
                    callback(data, channels);
                    counter.fetch_add((data.len() / channels) as u64, Ordering::Release);
                },
                move |err| {
                    error!(error = %err, "audio stream error");
                    failed.store(true, Ordering::Release);
                },
                None, // No timeout
            )
            .map_err(|e| AudioError::StreamFailed(format!("Failed to build stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| AudioError::StreamFailed(format!("Failed to start stream: {}", e)))?;

        Ok(Self {
            stream,
            _device: device,
            config,
            frames,
            suspended,
        })
    }

    /// Get current configuration
    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    /// Frames played since the stream was opened
    pub fn frames_played(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    /// Audio-clock time in seconds
    pub fn position_secs(&self) -> f64 {
        self.frames_played() as f64 / self.config.sample_rate as f64
    }

    /// Whether the stream reported an error and has not been resumed
    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Acquire)
    }

    /// Restart a suspended stream
    pub fn resume(&self) -> Result<(), AudioError> {
        self.stream
            .play()
            .map_err(|e| AudioError::ResumeFailed(e.to_string()))?;
        self.suspended.store(false, Ordering::Release);
        Ok(())
    }
}

/// List available audio output devices
pub fn list_devices() -> Vec<String> {
    let host = cpal::default_host();
    host.output_devices()
        .map(|devices| devices.filter_map(|d| d.name().ok()).collect())
        .unwrap_or_default()
}

/// Get default device name
pub fn default_device_name() -> Option<String> {
    let host = cpal::default_host();
    host.default_output_device().and_then(|d| d.name().ok())
}
