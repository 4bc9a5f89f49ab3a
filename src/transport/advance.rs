// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Beat/measure/section transition applied once per tick.

use super::{SequencePlan, TransportState};

/// What a single tick moved past
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Next beat of the same measure
    Beat,
    /// First beat of the next measure
    Measure,
    /// Count-in done, first real beat of the section is next
    CountInComplete,
    /// First beat of the next section
    Section,
    /// Every section played; transport halted
    Finished,
}

/// Compute the state after one tick.
///
/// The tick for the current position has already sounded; the returned
/// state points at the beat to be played next. While running, the next
/// tick time is pushed forward by one beat of the section that is current
/// *after* the transition, so a tempo change takes effect on the first
/// tick of the new section.
pub fn advance(plan: &SequencePlan, state: &TransportState) -> (TransportState, Advance) {
    let mut next = state.clone();

    let Some(section) = plan.get(state.section_index) else {
        next.preparing = false;
        next.halt();
        return (next, Advance::Finished);
    };

    let transition = if state.beat_index < section.beats_per_measure {
        next.beat_index += 1;
        Advance::Beat
    } else {
        next.beat_index = 1;
        if state.preparing {
            // Count-in is one measure of the section about to play
            next.preparing = false;
            next.measure_index = 1;
            Advance::CountInComplete
        } else if state.measure_index < section.measures {
            next.measure_index += 1;
            Advance::Measure
        } else {
            next.measure_index = 1;
            next.section_index += 1;
            if next.section_index >= plan.len() {
                next.halt();
                return (next, Advance::Finished);
            }
            Advance::Section
        }
    };

    if let (Some(due), Some(current)) = (next.next_tick_time, plan.get(next.section_index)) {
        next.next_tick_time = Some(due + current.beat_interval());
    }

    (next, transition)
}
