// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing and clock module.
//!
//! This module provides the clock abstraction the tick scheduler
//! measures time against.

pub mod clock;

pub use clock::{AudioClock, ClockState, ManualClock, MonotonicClock};
