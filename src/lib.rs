// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! metro - sectional practice metronome.
//!
//! A plan of sections, each with its own tempo, meter and length, is
//! played through a drift-free scheduler running on the audio clock.

pub mod audio;
pub mod config;
pub mod control;
pub mod timing;
pub mod transport;
pub mod ui;

pub use audio::{AudioEngine, AudioError};
pub use config::PlanFile;
pub use timing::{AudioClock, ClockState, ManualClock, MonotonicClock};
pub use transport::{
    ClickKind, PlanError, RenderFrame, Scheduler, Section, SequencePlan, Snapshot, Tick,
    ToneEmitter, TransportState,
};
