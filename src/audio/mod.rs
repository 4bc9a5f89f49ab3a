// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Audio engine for the metronome.
//!
//! This module provides:
//! - Click synthesis rendered in the output callback
//! - Audio output via cpal
//! - The sample-counting audio clock the scheduler runs on

pub mod click;
pub mod output;

pub use click::{ClickSettings, ClickSynth};
pub use output::{default_device_name, list_devices, AudioConfig, AudioOutput};

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{info, warn};

use crate::timing::{AudioClock, ClockState};
use crate::transport::{ClickKind, ToneSink};

/// Audio engine combining click synth and output stream
pub struct AudioEngine {
    /// Click synth shared with the audio callback
    synth: Arc<Mutex<ClickSynth>>,
    /// Audio output
    output: AudioOutput,
}

impl AudioEngine {
    /// Open the default device and start rendering clicks
    pub fn start(config: AudioConfig, click: ClickSettings) -> Result<Self, AudioError> {
        let synth = Arc::new(Mutex::new(ClickSynth::new(config.sample_rate, click)));

        let render = Arc::clone(&synth);
        let output = AudioOutput::new(config, move |buffer, channels| {
            if let Ok(mut synth) = render.lock() {
                synth.render(buffer, channels);
            }
        })?;

        info!(
            device = default_device_name().as_deref().unwrap_or("unknown"),
            sample_rate = output.config().sample_rate,
            latency_ms = output.config().latency_ms(),
            "audio output started"
        );
        Ok(Self { synth, output })
    }

    /// Sink that triggers clicks on this engine
    pub fn tone_sink(&self) -> SynthSink {
        SynthSink {
            synth: Arc::clone(&self.synth),
        }
    }
}

impl AudioClock for AudioEngine {
    fn now(&self) -> f64 {
        self.output.position_secs()
    }

    fn state(&self) -> ClockState {
        if self.output.is_suspended() {
            ClockState::Suspended
        } else {
            ClockState::Running
        }
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        self.output.resume()
    }
}

/// Fire-and-forget click trigger for the audio thread's synth
#[derive(Clone)]
pub struct SynthSink {
    synth: Arc<Mutex<ClickSynth>>,
}

impl ToneSink for SynthSink {
    fn click(&mut self, kind: ClickKind) {
        match self.synth.lock() {
            Ok(mut synth) => synth.trigger(kind),
            Err(_) => warn!(?kind, "click dropped, synth lock poisoned"),
        }
    }
}

/// Audio error types
#[derive(Debug, Clone, Error)]
pub enum AudioError {
    /// Failed to start audio stream
    #[error("Audio stream failed: {0}")]
    StreamFailed(String),
    /// Stream could not be restarted
    #[error("Audio stream could not resume: {0}")]
    ResumeFailed(String),
    /// Clock backend has shut down
    #[error("Audio clock closed")]
    Closed,
    /// Clock reported running but stopped advancing
    #[error("Audio clock stopped advancing")]
    Stalled,
    /// No audio device available
    #[error("No audio device available")]
    NoDevice,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synth_sink_triggers_voice() {
        let synth = Arc::new(Mutex::new(ClickSynth::new(44100, ClickSettings::default())));
        let mut sink = SynthSink {
            synth: Arc::clone(&synth),
        };

        sink.click(ClickKind::Normal);
        sink.click(ClickKind::Accent);
        assert_eq!(synth.lock().unwrap().active_voices(), 2);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(AudioError::NoDevice.to_string(), "No audio device available");
        assert_eq!(AudioError::Stalled.to_string(), "Audio clock stopped advancing");
        assert_eq!(
            AudioError::ResumeFailed("busy".to_string()).to_string(),
            "Audio stream could not resume: busy"
        );
    }
}
