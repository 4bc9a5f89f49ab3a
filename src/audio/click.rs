// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Click synthesis.
//!
//! Each click is a short sine burst whose gain falls exponentially from
//! `gain` to `floor` over `decay_secs`, after which the voice ends.

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::transport::ClickKind;

/// Upper bound on overlapping clicks
const MAX_VOICES: usize = 8;

/// Sound of the metronome click
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickSettings {
    /// Pitch of a regular beat in Hz
    pub normal_hz: f32,
    /// Pitch of a count-in beat in Hz
    pub accent_hz: f32,
    /// Starting gain (0.0 - 1.0)
    pub gain: f32,
    /// Gain reached at the end of the decay
    pub floor: f32,
    /// Length of the click in seconds
    pub decay_secs: f32,
}

impl Default for ClickSettings {
    fn default() -> Self {
        Self {
            normal_hz: 440.0,
            accent_hz: 880.0,
            gain: 0.6,
            floor: 0.01,
            decay_secs: 0.08,
        }
    }
}

impl ClickSettings {
    /// Pitch for a click kind
    pub fn frequency(&self, kind: ClickKind) -> f32 {
        match kind {
            ClickKind::Accent => self.accent_hz,
            ClickKind::Normal => self.normal_hz,
        }
    }

    /// Gain `t` seconds into a click
    pub fn envelope(&self, t: f32) -> f32 {
        if self.gain <= 0.0 || self.decay_secs <= 0.0 {
            return 0.0;
        }
        let floor = self.floor.max(f32::MIN_POSITIVE).min(self.gain);
        self.gain * (floor / self.gain).powf(t / self.decay_secs)
    }
}

#[derive(Debug, Clone)]
struct Voice {
    frequency: f32,
    position: usize,
    length: usize,
}

impl Voice {
    fn finished(&self) -> bool {
        self.position >= self.length
    }
}

/// Polyphonic click generator, rendered from the audio callback
#[derive(Debug)]
pub struct ClickSynth {
    sample_rate: u32,
    settings: ClickSettings,
    voices: Vec<Voice>,
}

impl ClickSynth {
    /// Create a synth for the given output rate
    pub fn new(sample_rate: u32, settings: ClickSettings) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            settings,
            voices: Vec::with_capacity(MAX_VOICES),
        }
    }

    /// Start a click
    pub fn trigger(&mut self, kind: ClickKind) {
        if self.voices.len() >= MAX_VOICES {
            self.voices.remove(0);
        }
        let length = (self.settings.decay_secs.max(0.0) * self.sample_rate as f32) as usize;
        self.voices.push(Voice {
            frequency: self.settings.frequency(kind),
            position: 0,
            length,
        });
    }

    /// Number of clicks still sounding
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Mix active clicks into an interleaved buffer
    pub fn render(&mut self, buffer: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let rate = self.sample_rate as f32;
        let settings = self.settings;

        for frame in buffer.chunks_mut(channels) {
            let mut sample = 0.0;
            for voice in self.voices.iter_mut().filter(|v| !v.finished()) {
                let t = voice.position as f32 / rate;
                sample += (TAU * voice.frequency * t).sin() * settings.envelope(t);
                voice.position += 1;
            }
            for out in frame.iter_mut() {
                *out += sample;
            }
        }

        self.voices.retain(|v| !v.finished());
    }
}
