// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Per-section completion for progress display.

use super::{Section, SequencePlan, TransportState};

/// Beats of `section` already reached in the current position.
///
/// Only meaningful for the current section while playing normally;
/// returns 0 during a count-in.
pub fn completed_beats(section: &Section, state: &TransportState) -> u64 {
    if state.preparing || state.measure_index == 0 {
        return 0;
    }
    let whole_measures = (state.measure_index - 1) as u64 * section.beats_per_measure as u64;
    whole_measures + state.beat_index as u64
}

/// Completion of section `index` in percent (0.0 - 100.0)
pub fn section_progress(plan: &SequencePlan, state: &TransportState, index: usize) -> f64 {
    let current = state.section_index;
    if index < current {
        return 100.0;
    }
    if index > current || !state.running {
        return 0.0;
    }
    let Some(section) = plan.get(index) else {
        return 0.0;
    };

    if state.preparing {
        // Counts down from full to empty across the count-in
        let elapsed = (state.beat_index - 1) as f64 / section.beats_per_measure as f64;
        return 100.0 * (1.0 - elapsed);
    }

    completed_beats(section, state) as f64 / section.total_beats() as f64 * 100.0
}

/// Completion of every section, in plan order
pub fn project(plan: &SequencePlan, state: &TransportState) -> Vec<f64> {
    (0..plan.len())
        .map(|index| section_progress(plan, state, index))
        .collect()
}
