// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Control system for keyboard input.
//!
//! Maps key presses to [`ControlAction`]s and applies transport actions
//! to the scheduler's control surface.

pub mod keyboard;

pub use keyboard::{format_shortcut, KeyBinding, KeyboardController, Shortcut};

use crate::transport::Scheduler;

/// Action that can be triggered by controls
#[derive(Debug, Clone, PartialEq)]
pub enum ControlAction {
    // Transport
    /// Start if stopped, stop if running
    TogglePlay,
    /// Start playback
    Play,
    /// Start playback with a count-in
    CountIn,
    /// Stop playback, keeping the position
    Stop,
    /// Stop and return to the first section
    Reset,

    // Sections
    /// Jump to a section (0-based)
    JumpTo(usize),
    /// Jump to the section before the current one
    PreviousSection,
    /// Jump to the section after the current one
    NextSection,

    // UI
    /// Toggle help display
    ToggleHelp,
    /// Quit application
    Quit,
}

impl ControlAction {
    /// Check if this is a transport action
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ControlAction::TogglePlay
                | ControlAction::Play
                | ControlAction::CountIn
                | ControlAction::Stop
                | ControlAction::Reset
        )
    }

    /// Check if this is a section navigation action
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            ControlAction::JumpTo(_) | ControlAction::PreviousSection | ControlAction::NextSection
        )
    }

    /// Apply a transport or navigation action.
    ///
    /// `count_in` selects whether `TogglePlay` and `Play` start with a
    /// count-in. Returns false for actions the scheduler does not handle.
    pub fn apply(&self, scheduler: &mut Scheduler, count_in: bool) -> bool {
        let start = |scheduler: &mut Scheduler| {
            if count_in {
                scheduler.start_with_count_in();
            } else {
                scheduler.start();
            }
        };

        match self {
            ControlAction::TogglePlay => {
                if scheduler.is_running() {
                    scheduler.stop();
                } else {
                    start(scheduler);
                }
            }
            ControlAction::Play => start(scheduler),
            ControlAction::CountIn => scheduler.start_with_count_in(),
            ControlAction::Stop => scheduler.stop(),
            ControlAction::Reset => scheduler.reset(),
            ControlAction::JumpTo(index) => scheduler.jump_to(*index),
            ControlAction::PreviousSection => {
                let current = scheduler.snapshot().section_index;
                scheduler.jump_to(current.saturating_sub(1));
            }
            ControlAction::NextSection => {
                let current = scheduler.snapshot().section_index;
                scheduler.jump_to(current + 1);
            }
            ControlAction::ToggleHelp | ControlAction::Quit => return false,
        }
        true
    }
}
