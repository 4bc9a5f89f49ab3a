// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Transport position and playback state.

use super::SequencePlan;

/// Measure index shown while a count-in is playing
pub const COUNT_IN_MEASURE: u32 = 0;

/// Position and playback flags of the transport
#[derive(Debug, Clone, PartialEq)]
pub struct TransportState {
    /// Current section (equals the plan length once finished)
    pub section_index: usize,
    /// Current measure, 1-based (`COUNT_IN_MEASURE` while preparing)
    pub measure_index: u32,
    /// Current beat within the measure, 1-based
    pub beat_index: u32,
    /// Scheduler loop active
    pub running: bool,
    /// Count-in in progress
    pub preparing: bool,
    /// Audio-clock time of the first tick of the current run
    pub clock_anchor: Option<f64>,
    /// Audio-clock time at which the next tick fires
    pub next_tick_time: Option<f64>,
}

impl Default for TransportState {
    fn default() -> Self {
        Self {
            section_index: 0,
            measure_index: 1,
            beat_index: 1,
            running: false,
            preparing: false,
            clock_anchor: None,
            next_tick_time: None,
        }
    }
}

impl TransportState {
    /// Idle state at the top of the plan
    pub fn idle() -> Self {
        Self::default()
    }

    /// True once every section has been played
    pub fn is_finished(&self, plan: &SequencePlan) -> bool {
        self.section_index >= plan.len()
    }

    /// Move to the first beat of `section_index`, clearing any count-in
    pub fn rewind_to(&mut self, section_index: usize) {
        self.section_index = section_index;
        self.measure_index = 1;
        self.beat_index = 1;
        self.preparing = false;
    }

    /// Enter the count-in posture for the current section
    pub fn prepare(&mut self) {
        self.preparing = true;
        self.measure_index = COUNT_IN_MEASURE;
        self.beat_index = 1;
    }

    /// Mark the run active with its first tick at `now`
    pub fn anchor(&mut self, now: f64) {
        self.running = true;
        self.clock_anchor = Some(now);
        self.next_tick_time = Some(now);
    }

    /// Leave the running posture, keeping the position
    pub fn halt(&mut self) {
        self.running = false;
        self.clock_anchor = None;
        self.next_tick_time = None;
    }

    /// Copy of the fields a renderer needs
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            section_index: self.section_index,
            measure_index: self.measure_index,
            beat_index: self.beat_index,
            preparing: self.preparing,
            running: self.running,
        }
    }
}

/// Render-facing view of the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub section_index: usize,
    pub measure_index: u32,
    pub beat_index: u32,
    pub preparing: bool,
    pub running: bool,
}
