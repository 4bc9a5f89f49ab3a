// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Drift-free tick scheduler.
//!
//! The scheduler owns the transport state and is polled cooperatively,
//! typically once per rendered frame. Tick times are accumulated against
//! the audio clock rather than re-derived from the host timer, so polling
//! jitter can delay a tick but never shifts the ones after it.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::advance::{advance, Advance};
use super::progress;
use super::tone::{ClickKind, Emission, ToneEmitter};
use super::{SequencePlan, Snapshot, TransportState};
use crate::audio::AudioError;
use crate::timing::{AudioClock, ClockState, MonotonicClock};

/// Everything a renderer needs after a state change
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    /// Transport position and flags
    pub snapshot: Snapshot,
    /// Completion of each section in percent
    pub progress: Vec<f64>,
    /// Downbeat flash from the last tick
    pub flash: bool,
    /// Ticks fired so far; changes only when a tick fires
    pub tick: u64,
}

/// Receiver of render frames
pub trait FrameSink {
    fn publish(&mut self, frame: &RenderFrame);
}

impl<F> FrameSink for F
where
    F: FnMut(&RenderFrame),
{
    fn publish(&mut self, frame: &RenderFrame) {
        self(frame)
    }
}

/// A fired tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Position the tick sounded for
    pub position: Snapshot,
    /// Audio-clock time the tick was due
    pub due: f64,
    /// Click sent, `None` when muted or silent
    pub click: Option<ClickKind>,
    /// Downbeat flash
    pub flash: bool,
    /// Transition applied after the tick
    pub transition: Advance,
}

/// Host time the audio clock may stand still while running before it is
/// treated as lost
pub const DEFAULT_STALL_TIMEOUT: Duration = Duration::from_millis(500);

/// Tick scheduler driving a sequence plan
pub struct Scheduler {
    plan: SequencePlan,
    state: TransportState,
    clock: Box<dyn AudioClock>,
    emitter: ToneEmitter,
    frames: Option<Box<dyn FrameSink>>,
    /// Position of the last tick sounded in the current run
    sounded: Option<TransportState>,
    flash: bool,
    ticks: u64,
    degraded: bool,
    stall_timeout: Duration,
    /// Last audio-clock reading and the host time it was first seen
    watch: Option<(f64, Instant)>,
}

impl Scheduler {
    /// Create an idle scheduler at the top of `plan`
    pub fn new(plan: SequencePlan, clock: impl AudioClock + 'static, emitter: ToneEmitter) -> Self {
        Self {
            plan,
            state: TransportState::idle(),
            clock: Box::new(clock),
            emitter,
            frames: None,
            sounded: None,
            flash: false,
            ticks: 0,
            degraded: false,
            stall_timeout: DEFAULT_STALL_TIMEOUT,
            watch: None,
        }
    }

    /// Give up on the audio clock when it stands still this long while running
    pub fn with_stall_timeout(mut self, timeout: Duration) -> Self {
        self.stall_timeout = timeout;
        self
    }

    /// Publish a frame to `sink` after every tick and control operation
    pub fn with_frame_sink(mut self, sink: impl FrameSink + 'static) -> Self {
        self.frames = Some(Box::new(sink));
        self
    }

    /// The plan being played
    pub fn plan(&self) -> &SequencePlan {
        &self.plan
    }

    /// Current transport state
    pub fn state(&self) -> &TransportState {
        &self.state
    }

    /// Current render snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    /// Completion of each section in percent for the current state
    pub fn progress(&self) -> Vec<f64> {
        progress::project(&self.plan, &self.state)
    }

    /// What the display should show.
    ///
    /// While running this is the beat that last sounded, so the display
    /// matches the click; otherwise it is the transport state itself.
    pub fn frame(&self) -> RenderFrame {
        let shown = match &self.sounded {
            Some(sounded) if self.state.running => sounded,
            _ => &self.state,
        };
        RenderFrame {
            snapshot: shown.snapshot(),
            progress: progress::project(&self.plan, shown),
            flash: self.flash,
            tick: self.ticks,
        }
    }

    /// Check if playing
    pub fn is_running(&self) -> bool {
        self.state.running
    }

    /// Check if every section has been played
    pub fn is_finished(&self) -> bool {
        self.state.is_finished(&self.plan)
    }

    /// True once audio has been given up and ticks are silent
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Current audio-clock time
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Start normal playback from the current position
    pub fn start(&mut self) {
        self.begin(false);
    }

    /// Play one measure of count-in, then start normal playback
    pub fn start_with_count_in(&mut self) {
        self.begin(true);
    }

    fn begin(&mut self, count_in: bool) {
        if self.state.running {
            debug!("start ignored, already running");
            return;
        }

        if self.is_finished() {
            self.state.rewind_to(0);
        }
        if count_in {
            self.state.prepare();
        }

        let now = self.clock.now();
        self.state.anchor(now);
        self.sounded = None;
        self.watch = None;
        info!(
            section = self.state.section_index + 1,
            measure = self.state.measure_index,
            beat = self.state.beat_index,
            count_in,
            "transport started"
        );
        self.render();
    }

    /// Halt scheduling, keeping the position
    pub fn stop(&mut self) {
        if self.state.running {
            info!(section = self.state.section_index + 1, "transport stopped");
        }
        self.halt();
        self.render();
    }

    /// Stop and return to the first beat of the first section
    pub fn reset(&mut self) {
        self.halt();
        self.state.rewind_to(0);
        info!("transport reset");
        self.render();
    }

    /// Seek to the start of section `index`; playback stays stopped.
    /// Out-of-range indices are ignored.
    pub fn jump_to(&mut self, index: usize) {
        if index >= self.plan.len() {
            debug!(index, sections = self.plan.len(), "jump ignored, out of range");
            return;
        }
        self.halt();
        self.state.rewind_to(index);
        info!(section = index + 1, "jumped to section");
        self.render();
    }

    /// Swap in a new plan and rewind to its start
    pub fn replace_plan(&mut self, plan: SequencePlan) {
        self.halt();
        self.plan = plan;
        self.state.rewind_to(0);
        info!(sections = self.plan.len(), "plan replaced");
        self.render();
    }

    fn halt(&mut self) {
        if self.state.preparing {
            // An interrupted count-in leaves the section at its first beat
            self.state.rewind_to(self.state.section_index);
        }
        self.state.halt();
        self.sounded = None;
        self.flash = false;
        self.watch = None;
    }

    /// Time left until the next tick is due
    pub fn time_until_next_tick(&self) -> Option<Duration> {
        let due = self.state.next_tick_time?;
        let remaining = due - self.clock.now();
        Some(Duration::from_secs_f64(remaining.max(0.0)))
    }

    /// One iteration of the polling loop.
    ///
    /// Fires at most one tick, and only when the clock has reached the
    /// scheduled time. A late tick fires immediately on the next poll, so
    /// ticks are never skipped. A suspended clock is asked to resume and
    /// no tick fires on that poll. A clock that reports running but stands
    /// still for longer than the stall timeout is given up on.
    pub fn poll(&mut self) -> Option<Tick> {
        if !self.state.running {
            return None;
        }

        match self.clock.state() {
            ClockState::Running => {}
            ClockState::Suspended => {
                debug!("audio clock suspended, requesting resume");
                self.watch = None;
                if let Err(err) = self.clock.resume() {
                    self.degrade(err);
                }
                return None;
            }
            ClockState::Closed => {
                self.degrade(AudioError::Closed);
                return None;
            }
        }

        let now = self.clock.now();
        if self.clock_stalled(now) {
            self.degrade(AudioError::Stalled);
            return None;
        }

        let due = self.state.next_tick_time?;
        if now < due {
            return None;
        }
        Some(self.tick(due))
    }

    fn clock_stalled(&mut self, now: f64) -> bool {
        let seen = Instant::now();
        match self.watch {
            Some((last, since)) if now <= last => seen.duration_since(since) >= self.stall_timeout,
            _ => {
                self.watch = Some((now, seen));
                false
            }
        }
    }

    fn tick(&mut self, due: f64) -> Tick {
        let sounded = self.state.clone();
        let position = sounded.snapshot();
        let emission = match self.plan.get(self.state.section_index) {
            Some(section) => self.emitter.emit(section, &self.state),
            None => Emission::default(),
        };

        let (next, transition) = advance(&self.plan, &self.state);
        self.state = next;
        self.sounded = Some(sounded);
        self.flash = emission.flash;
        self.ticks += 1;

        debug!(
            section = position.section_index + 1,
            measure = position.measure_index,
            beat = position.beat_index,
            preparing = position.preparing,
            due,
            "tick"
        );
        match transition {
            Advance::CountInComplete => info!("count-in complete"),
            Advance::Section => info!(section = self.state.section_index + 1, "next section"),
            Advance::Finished => info!("sequence finished"),
            Advance::Beat | Advance::Measure => {}
        }

        self.render();
        Tick {
            position,
            due,
            click: emission.click,
            flash: emission.flash,
            transition,
        }
    }

    fn degrade(&mut self, err: AudioError) {
        warn!(error = %err, "audio clock unavailable, continuing without sound");
        // Continue the same timeline so pending tick times stay valid
        let now = self.clock.now();
        self.clock = Box::new(MonotonicClock::starting_at(now));
        self.emitter.silence();
        self.degraded = true;
        self.watch = None;
    }

    fn render(&mut self) {
        if self.frames.is_none() {
            return;
        }
        let frame = self.frame();
        if let Some(sink) = self.frames.as_mut() {
            sink.publish(&frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::ManualClock;
    use crate::transport::{Section, COUNT_IN_MEASURE};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn scheduler(sections: Vec<Section>) -> (Scheduler, ManualClock) {
        let clock = ManualClock::new();
        let plan = SequencePlan::new(sections).unwrap();
        (
            Scheduler::new(plan, clock.clone(), ToneEmitter::silent()),
            clock,
        )
    }

    #[test]
    fn test_scheduler_creation() {
        let (scheduler, _) = scheduler(vec![Section::new(120.0, 4, 1)]);
        assert!(!scheduler.is_running());
        assert!(!scheduler.is_finished());
        assert_eq!(scheduler.progress(), vec![0.0]);
        assert!(scheduler.time_until_next_tick().is_none());
    }

    #[test]
    fn test_first_tick_fires_at_start() {
        let (mut scheduler, clock) = scheduler(vec![Section::new(120.0, 4, 1)]);
        clock.set(10.0);
        scheduler.start();

        assert_eq!(scheduler.state().clock_anchor, Some(10.0));
        let tick = scheduler.poll().unwrap();
        assert_eq!(tick.due, 10.0);
        assert_eq!(tick.position.beat_index, 1);
        assert_eq!(scheduler.state().next_tick_time, Some(10.5));

        // Not due yet
        clock.set(10.4);
        assert!(scheduler.poll().is_none());
        assert_eq!(
            scheduler.time_until_next_tick(),
            Some(Duration::from_secs_f64(10.5 - 10.4))
        );
    }

    #[test]
    fn test_start_is_idempotent() {
        let (mut scheduler, clock) = scheduler(vec![Section::new(120.0, 4, 1)]);
        scheduler.start();
        clock.set(0.3);
        scheduler.start();
        assert_eq!(scheduler.state().clock_anchor, Some(0.0));
        scheduler.start_with_count_in();
        assert!(!scheduler.state().preparing);
    }

    #[test]
    fn test_late_poll_does_not_skip() {
        let (mut scheduler, clock) = scheduler(vec![Section::new(120.0, 4, 1)]);
        scheduler.start();
        scheduler.poll().unwrap();

        // Two ticks overdue: they fire on consecutive polls at their own due times
        clock.set(1.2);
        let second = scheduler.poll().unwrap();
        let third = scheduler.poll().unwrap();
        assert_eq!(second.due, 0.5);
        assert_eq!(third.due, 1.0);
        assert!(scheduler.poll().is_none());
        assert_eq!(scheduler.state().next_tick_time, Some(1.5));
    }

    #[test]
    fn test_stop_prevents_due_tick() {
        let (mut scheduler, clock) = scheduler(vec![Section::new(120.0, 4, 1)]);
        scheduler.start();
        scheduler.poll().unwrap();
        clock.set(5.0);
        scheduler.stop();
        assert!(scheduler.poll().is_none());
        assert_eq!(scheduler.snapshot().beat_index, 2);

        // Stop is idempotent
        scheduler.stop();
        assert!(!scheduler.is_running());
    }

    #[test]
    fn test_stop_during_count_in_rewinds_section() {
        let (mut scheduler, _) = scheduler(vec![Section::new(120.0, 4, 2)]);
        scheduler.start_with_count_in();
        scheduler.poll().unwrap();
        assert_eq!(scheduler.snapshot().measure_index, COUNT_IN_MEASURE);

        scheduler.stop();
        let snapshot = scheduler.snapshot();
        assert!(!snapshot.preparing);
        assert_eq!(snapshot.measure_index, 1);
        assert_eq!(snapshot.beat_index, 1);
    }

    #[test]
    fn test_suspended_clock_does_not_burst() {
        let (mut scheduler, clock) = scheduler(vec![Section::new(120.0, 4, 2)]);
        scheduler.start();
        scheduler.poll().unwrap();

        clock.suspend();
        clock.set(0.6);
        assert!(scheduler.poll().is_none());
        assert_eq!(clock.resume_requests(), 1);

        let tick = scheduler.poll().unwrap();
        assert_eq!(tick.due, 0.5);
        assert!(scheduler.poll().is_none());
        assert!(!scheduler.is_degraded());
    }

    #[test]
    fn test_failed_resume_degrades_to_silence() {
        let clock = ManualClock::new();
        let clicks = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&clicks);
        let plan = SequencePlan::new(vec![Section::new(120.0, 4, 1)]).unwrap();
        let mut scheduler = Scheduler::new(
            plan,
            clock.clone(),
            ToneEmitter::new(move |kind| sink.borrow_mut().push(kind)),
        );

        scheduler.start();
        scheduler.poll().unwrap();
        assert_eq!(clicks.borrow().len(), 1);

        clock.suspend();
        clock.fail_resume(true);
        clock.set(0.5);
        assert!(scheduler.poll().is_none());
        assert!(scheduler.is_degraded());

        // Fallback clock continues from 0.5, so the next tick is already due
        let tick = scheduler.poll().unwrap();
        assert_eq!(tick.click, None);
        assert_eq!(tick.position.beat_index, 2);
        assert_eq!(clicks.borrow().len(), 1);
    }

    #[test]
    fn test_closed_clock_degrades() {
        let (mut scheduler, clock) = scheduler(vec![Section::new(120.0, 4, 1)]);
        scheduler.start();
        clock.close();
        assert!(scheduler.poll().is_none());
        assert!(scheduler.is_degraded());
        assert!(scheduler.poll().is_some());
    }

    #[test]
    fn test_frozen_clock_degrades() {
        let (scheduler, clock) = scheduler(vec![Section::new(600.0, 4, 1)]);
        let mut scheduler = scheduler.with_stall_timeout(Duration::from_millis(20));
        scheduler.start();
        scheduler.poll().unwrap();

        // Reports running but never moves past 0.05
        clock.set(0.05);
        assert!(scheduler.poll().is_none());
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(clock.state(), ClockState::Running);
        assert!(scheduler.poll().is_none());
        assert!(scheduler.is_degraded());
        assert!(scheduler.now() >= 0.05);

        // Ticking continues on the fallback clock at the same due time
        std::thread::sleep(Duration::from_millis(80));
        let tick = scheduler.poll().unwrap();
        assert!((tick.due - 0.1).abs() < 1e-9);
        assert_eq!(tick.position.beat_index, 2);
        assert_eq!(tick.click, None);
    }

    #[test]
    fn test_advancing_clock_is_not_stalled() {
        let (scheduler, clock) = scheduler(vec![Section::new(60.0, 4, 1)]);
        let mut scheduler = scheduler.with_stall_timeout(Duration::from_millis(20));
        scheduler.start();
        scheduler.poll().unwrap();

        for step in 1..4 {
            clock.set(step as f64 * 0.1);
            std::thread::sleep(Duration::from_millis(30));
            scheduler.poll();
        }
        assert!(!scheduler.is_degraded());

        // Time spent suspended does not count as a stall
        clock.suspend();
        std::thread::sleep(Duration::from_millis(30));
        assert!(scheduler.poll().is_none());
        assert!(scheduler.poll().is_none());
        assert!(!scheduler.is_degraded());

        // Nor does time spent stopped
        scheduler.stop();
        std::thread::sleep(Duration::from_millis(30));
        scheduler.start();
        assert!(scheduler.poll().is_some());
        assert!(!scheduler.is_degraded());
    }

    #[test]
    fn test_jump_and_reset() {
        let (mut scheduler, _) = scheduler(vec![
            Section::new(120.0, 4, 1),
            Section::new(100.0, 3, 2),
            Section::new(90.0, 2, 1),
        ]);
        scheduler.start();
        scheduler.poll().unwrap();

        scheduler.jump_to(7);
        assert!(scheduler.is_running());

        scheduler.jump_to(1);
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.snapshot().section_index, 1);
        assert_eq!(scheduler.progress(), vec![100.0, 0.0, 0.0]);

        scheduler.reset();
        assert_eq!(scheduler.snapshot(), TransportState::idle().snapshot());
    }

    #[test]
    fn test_start_after_finish_rewinds() {
        let (mut scheduler, clock) = scheduler(vec![Section::new(60.0, 1, 1)]);
        scheduler.start();
        let tick = scheduler.poll().unwrap();
        assert_eq!(tick.transition, Advance::Finished);
        assert!(scheduler.is_finished());

        clock.set(4.0);
        scheduler.start();
        assert_eq!(scheduler.snapshot().section_index, 0);
        assert!(scheduler.poll().is_some());
    }

    #[test]
    fn test_frames_published() {
        let frames = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&frames);
        let clock = ManualClock::new();
        let plan = SequencePlan::new(vec![Section::new(120.0, 2, 1)]).unwrap();
        let mut scheduler = Scheduler::new(plan, clock, ToneEmitter::silent())
            .with_frame_sink(move |frame: &RenderFrame| sink.borrow_mut().push(frame.clone()));

        scheduler.start();
        scheduler.poll().unwrap();
        scheduler.stop();
        // Out of range, publishes nothing
        scheduler.jump_to(3);

        let frames = frames.borrow();
        assert_eq!(frames.len(), 3);
        assert!(frames[0].snapshot.running);
        assert!(frames[1].flash);
        assert_eq!(frames[0].tick, 0);
        assert_eq!(frames[1].tick, 1);
        assert_eq!(frames[1].snapshot, frames[0].snapshot);
        assert_eq!(frames[1].snapshot.beat_index, 1);
        assert_eq!(frames[1].progress, vec![50.0]);
        assert!(!frames[2].snapshot.running);
        assert_eq!(frames[2].snapshot.beat_index, 2);
        assert_eq!(frames[2].progress, vec![0.0]);
        assert!(!frames[2].flash);
    }

    #[test]
    fn test_replace_plan() {
        let (mut scheduler, _) = scheduler(vec![Section::new(120.0, 4, 1)]);
        scheduler.start();
        scheduler.poll().unwrap();

        let plan = SequencePlan::new(vec![Section::new(90.0, 3, 1), Section::new(90.0, 3, 1)]).unwrap();
        scheduler.replace_plan(plan);
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.plan().len(), 2);
        assert_eq!(scheduler.snapshot(), TransportState::idle().snapshot());
    }
}
