// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Sections and the immutable sequence plan.

use thiserror::Error;

/// A run of beats sharing one tempo, time signature and measure count
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Section {
    /// Tempo in BPM
    pub bpm: f64,
    /// Beats per measure
    pub beats_per_measure: u32,
    /// Number of measures in the section
    pub measures: u32,
    /// No click is produced for this section's beats
    pub muted: bool,
}

impl Section {
    /// Create an audible section
    pub fn new(bpm: f64, beats_per_measure: u32, measures: u32) -> Self {
        Self {
            bpm,
            beats_per_measure,
            measures,
            muted: false,
        }
    }

    /// Mark the section as muted
    pub fn muted(mut self) -> Self {
        self.muted = true;
        self
    }

    /// Seconds between two beats at this tempo
    pub fn beat_interval(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Beats in the whole section
    pub fn total_beats(&self) -> u64 {
        self.beats_per_measure as u64 * self.measures as u64
    }

    /// Playing time of the whole section in seconds
    pub fn duration_secs(&self) -> f64 {
        self.total_beats() as f64 * self.beat_interval()
    }

    fn validate(&self, index: usize) -> Result<(), PlanError> {
        if !self.bpm.is_finite() || self.bpm <= 0.0 {
            return Err(PlanError::InvalidBpm {
                index,
                bpm: self.bpm,
            });
        }
        if self.beats_per_measure == 0 {
            return Err(PlanError::ZeroBeatsPerMeasure { index });
        }
        if self.measures == 0 {
            return Err(PlanError::ZeroMeasures { index });
        }
        Ok(())
    }
}

/// Rejections raised while building a plan
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("sequence plan has no sections")]
    Empty,
    #[error("section index {index}: bpm must be a positive number, got {bpm}")]
    InvalidBpm { index: usize, bpm: f64 },
    #[error("section index {index}: beats per measure must be at least 1")]
    ZeroBeatsPerMeasure { index: usize },
    #[error("section index {index}: measure count must be at least 1")]
    ZeroMeasures { index: usize },
}

/// Ordered, validated list of sections. Never changes once built.
#[derive(Debug, Clone, PartialEq)]
pub struct SequencePlan {
    sections: Vec<Section>,
}

impl SequencePlan {
    /// Build a plan, rejecting empty or malformed input
    pub fn new(sections: Vec<Section>) -> Result<Self, PlanError> {
        if sections.is_empty() {
            return Err(PlanError::Empty);
        }
        for (index, section) in sections.iter().enumerate() {
            section.validate(index)?;
        }
        Ok(Self { sections })
    }

    /// Number of sections
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Always false for a constructed plan
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Section at `index`, if any
    pub fn get(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    /// All sections in order
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Iterate over the sections
    pub fn iter(&self) -> std::slice::Iter<'_, Section> {
        self.sections.iter()
    }

    /// Beats across every section
    pub fn total_beats(&self) -> u64 {
        self.sections.iter().map(Section::total_beats).sum()
    }

    /// Playing time of the whole plan in seconds, without count-in
    pub fn duration_secs(&self) -> f64 {
        self.sections.iter().map(Section::duration_secs).sum()
    }
}

impl<'a> IntoIterator for &'a SequencePlan {
    type Item = &'a Section;
    type IntoIter = std::slice::Iter<'a, Section>;

    fn into_iter(self) -> Self::IntoIter {
        self.sections.iter()
    }
}
