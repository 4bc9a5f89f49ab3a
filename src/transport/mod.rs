// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Transport core for sectional playback.
//!
//! This module provides:
//! - The immutable sequence plan and its sections
//! - Transport state and the per-tick position advance
//! - Click emission and per-section progress projection
//! - The drift-free tick scheduler that ties them together

pub mod advance;
pub mod plan;
pub mod progress;
pub mod scheduler;
pub mod state;
pub mod tone;

pub use advance::{advance, Advance};
pub use plan::{PlanError, Section, SequencePlan};
pub use scheduler::{FrameSink, RenderFrame, Scheduler, Tick};
pub use state::{Snapshot, TransportState, COUNT_IN_MEASURE};
pub use tone::{ClickKind, Emission, NullSink, ToneEmitter, ToneSink};
