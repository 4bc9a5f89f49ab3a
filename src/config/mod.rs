// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration system for metro.
//!
//! This module provides data structures for loading plan files (YAML or
//! TOML), selecting a named section list, and turning it into a
//! validated [`SequencePlan`].

pub mod watcher;

pub use watcher::{validate_config, ConfigEvent, ConfigWatcher};

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::audio::{AudioConfig, ClickSettings};
use crate::transport::{Section, SequencePlan};

/// Root of a plan file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanFile {
    /// Piece title shown in the UI
    #[serde(default = "default_title")]
    pub title: String,
    /// Start with a count-in by default
    #[serde(default)]
    pub count_in: bool,
    /// Click sound
    #[serde(default)]
    pub click: ClickSettings,
    /// Audio output settings
    #[serde(default)]
    pub audio: AudioConfig,
    /// Default section list
    pub sections: Vec<SectionConfig>,
    /// Alternative named section lists (e.g. a short rehearsal run)
    #[serde(default)]
    pub variants: HashMap<String, Vec<SectionConfig>>,
}

fn default_title() -> String {
    "Untitled".to_string()
}

/// One section as written in a plan file
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SectionConfig {
    /// Tempo in BPM
    pub bpm: f64,
    /// Beats per measure
    pub beats_per_measure: u32,
    /// Number of measures
    pub measures: u32,
    /// Silence the click for this section
    #[serde(default, alias = "mute")]
    pub muted: bool,
}

impl From<&SectionConfig> for Section {
    fn from(config: &SectionConfig) -> Self {
        Section {
            bpm: config.bpm,
            beats_per_measure: config.beats_per_measure,
            measures: config.measures,
            muted: config.muted,
        }
    }
}

impl SectionConfig {
    fn new(bpm: f64, beats_per_measure: u32, measures: u32, muted: bool) -> Self {
        Self {
            bpm,
            beats_per_measure,
            measures,
            muted,
        }
    }
}

impl PlanFile {
    /// Load a plan file; `.toml` files are parsed as TOML, anything else as YAML
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan file: {:?}", path))?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let parsed = if is_toml {
            Self::from_toml(&contents)
        } else {
            Self::from_yaml(&contents)
        };
        parsed.with_context(|| format!("Invalid plan file: {:?}", path))
    }

    /// Parse a plan from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse YAML plan")
    }

    /// Parse a plan from TOML string
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse TOML plan")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize plan to YAML")
    }

    /// Names of the alternative section lists, sorted
    pub fn variant_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.variants.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Section list for `variant`, or the default list
    pub fn sections_for(&self, variant: Option<&str>) -> Result<&[SectionConfig]> {
        match variant {
            None => Ok(&self.sections),
            Some(name) => self
                .variants
                .get(name)
                .map(Vec::as_slice)
                .ok_or_else(|| {
                    anyhow!(
                        "Unknown variant {:?} (available: {})",
                        name,
                        self.variant_names().join(", ")
                    )
                }),
        }
    }

    /// Build the sequence plan for `variant`
    pub fn plan(&self, variant: Option<&str>) -> Result<SequencePlan> {
        let sections = self.sections_for(variant)?;
        SequencePlan::new(sections.iter().map(Section::from).collect())
            .with_context(|| match variant {
                Some(name) => format!("Invalid sections in variant {:?}", name),
                None => "Invalid sections".to_string(),
            })
    }

    /// Check the default list and every variant
    pub fn validate(&self) -> Result<()> {
        self.plan(None)?;
        for name in self.variant_names() {
            self.plan(Some(name))?;
        }
        Ok(())
    }

    /// Built-in practice piece used when no plan file is given
    pub fn demo() -> Self {
        let full = vec![
            SectionConfig::new(80.0, 8, 2, false),
            SectionConfig::new(80.0, 8, 32, false),
            SectionConfig::new(80.0, 8, 3, true),
            SectionConfig::new(120.0, 4, 17, false),
            SectionConfig::new(144.0, 4, 17, false),
            SectionConfig::new(160.0, 4, 13, false),
        ];
        let quick = full
            .iter()
            .map(|s| SectionConfig { measures: 1, ..*s })
            .collect();

        Self {
            title: "出水蓮".to_string(),
            count_in: false,
            click: ClickSettings::default(),
            audio: AudioConfig::default(),
            sections: full,
            variants: HashMap::from([("quick".to_string(), quick)]),
        }
    }
}
