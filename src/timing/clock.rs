// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Clock sources for tick scheduling.
//!
//! The scheduler reads time in seconds from an [`AudioClock`]. The audio
//! engine provides one driven by rendered sample frames; this module holds
//! the monotonic fallback used when audio is unavailable and a manually
//! stepped clock for tests and benchmarks.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::audio::AudioError;

/// Clock backend state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    /// Time is advancing
    Running,
    /// Paused by the platform; may be resumed
    Suspended,
    /// Gone for good
    Closed,
}

/// Source of audio-clock time in seconds
pub trait AudioClock {
    /// Current time in seconds
    fn now(&self) -> f64;

    /// Whether time is currently advancing
    fn state(&self) -> ClockState {
        ClockState::Running
    }

    /// Ask a suspended clock to run again
    fn resume(&mut self) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Wall-clock based monotonic time
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
    offset: f64,
}

impl MonotonicClock {
    /// Clock reading zero now
    pub fn new() -> Self {
        Self::starting_at(0.0)
    }

    /// Clock reading `seconds` now, used to continue another clock's timeline
    pub fn starting_at(seconds: f64) -> Self {
        Self {
            origin: Instant::now(),
            offset: seconds,
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioClock for MonotonicClock {
    fn now(&self) -> f64 {
        self.offset + self.origin.elapsed().as_secs_f64()
    }
}

#[derive(Debug)]
struct ManualInner {
    now: Cell<f64>,
    state: Cell<ClockState>,
    resume_fails: Cell<bool>,
    resume_requests: Cell<u32>,
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Rc<ManualInner>,
}

impl ManualClock {
    /// Running clock at time zero
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ManualInner {
                now: Cell::new(0.0),
                state: Cell::new(ClockState::Running),
                resume_fails: Cell::new(false),
                resume_requests: Cell::new(0),
            }),
        }
    }

    /// Jump to an absolute time
    pub fn set(&self, seconds: f64) {
        self.inner.now.set(seconds);
    }

    /// Move time forward
    pub fn advance(&self, seconds: f64) {
        self.inner.now.set(self.inner.now.get() + seconds);
    }

    /// Move time forward by a duration
    pub fn advance_by(&self, duration: Duration) {
        self.advance(duration.as_secs_f64());
    }

    /// Put the clock in the suspended state
    pub fn suspend(&self) {
        self.inner.state.set(ClockState::Suspended);
    }

    /// Close the clock permanently
    pub fn close(&self) {
        self.inner.state.set(ClockState::Closed);
    }

    /// Make subsequent resume requests fail
    pub fn fail_resume(&self, fails: bool) {
        self.inner.resume_fails.set(fails);
    }

    /// Number of resume requests received
    pub fn resume_requests(&self) -> u32 {
        self.inner.resume_requests.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioClock for ManualClock {
    fn now(&self) -> f64 {
        self.inner.now.get()
    }

    fn state(&self) -> ClockState {
        self.inner.state.get()
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        self.inner
            .resume_requests
            .set(self.inner.resume_requests.get() + 1);
        if self.inner.resume_fails.get() {
            return Err(AudioError::ResumeFailed("manual clock refused".to_string()));
        }
        if self.inner.state.get() == ClockState::Suspended {
            self.inner.state.set(ClockState::Running);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_monotonic_clock_advances() {
        let clock = MonotonicClock::new();
        let first = clock.now();
        thread::sleep(Duration::from_millis(5));
        assert!(clock.now() > first);
        assert_eq!(clock.state(), ClockState::Running);
    }

    #[test]
    fn test_monotonic_clock_offset() {
        let clock = MonotonicClock::starting_at(12.5);
        assert!(clock.now() >= 12.5);
        assert!(clock.now() < 13.5);
    }

    #[test]
    fn test_manual_clock_shared_time() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        handle.advance(0.25);
        handle.advance_by(Duration::from_millis(250));
        assert_eq!(clock.now(), 0.5);
        handle.set(2.0);
        assert_eq!(clock.now(), 2.0);
    }

    #[test]
    fn test_manual_clock_suspend_resume() {
        let mut clock = ManualClock::new();
        clock.suspend();
        assert_eq!(clock.state(), ClockState::Suspended);

        clock.resume().unwrap();
        assert_eq!(clock.state(), ClockState::Running);
        assert_eq!(clock.resume_requests(), 1);

        clock.suspend();
        clock.fail_resume(true);
        assert!(clock.resume().is_err());
        assert_eq!(clock.state(), ClockState::Suspended);
    }
}
