// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration for a composing session.
//!
//! Settings load from YAML or TOML and turn into the suggester, schedule
//! timing, instrument and composer settings used by [`Composer`].

use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::generators::{make_rng, patterns, BasicMelodyBarSuggester};
use crate::instrument::{Instrument, SynthVoice, VoiceManager};
use crate::music::western::{
    duration_templates, extended_context, major_context, minor_context, western_chord_dictionary,
};
use crate::music::{ContextualChordTemplate, Note};
use crate::score::{ArpeggioSettings, Composer, ComposerSettings};
use crate::sequencer::{PerformanceOptions, Scheduler};
use crate::timing::Timing;

/// Chord contexts accepted by `context`
pub const CONTEXTS: [&str; 3] = ["extended", "major", "minor"];

/// Settings for one composing session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComposerConfig {
    /// Tempo in BPM
    #[serde(default = "default_tempo")]
    pub tempo: f64,
    /// Key root, e.g. "A4" or "Eb2"
    #[serde(default = "default_base_note")]
    pub base_note: String,
    /// Which chords to suggest: "extended", "major" or "minor"
    #[serde(default = "default_context")]
    pub context: String,
    /// Lowest scale index suggested for melody notes
    #[serde(default = "default_min_suggest")]
    pub min_suggest: i32,
    /// Upper bound (exclusive) of suggested scale indices; defaults to the
    /// scale size
    #[serde(default)]
    pub max_suggest: Option<i32>,
    #[serde(default = "default_beats_per_bar")]
    pub beats_per_bar: f64,
    /// Simultaneous voices in the synth
    #[serde(default = "default_polyphony")]
    pub polyphony: usize,
    #[serde(default = "default_volume")]
    pub volume: f64,
    /// Beats each note is released early
    #[serde(default = "default_off_delta")]
    pub off_delta: f64,
    /// Accompaniment; `null` turns it off
    #[serde(default = "default_arpeggio")]
    pub arpeggio: Option<ArpeggioConfig>,
    /// Serialized score to start from
    #[serde(default)]
    pub score: Option<String>,
    /// Seed for reproducible suggestions
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Arpeggio accompaniment settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArpeggioConfig {
    /// Built-in pattern name
    #[serde(default = "default_pattern")]
    pub pattern: String,
    #[serde(default = "default_beats_per_step")]
    pub beats_per_step: f64,
}

fn default_tempo() -> f64 {
    120.0
}
fn default_base_note() -> String {
    "A4".to_string()
}
fn default_context() -> String {
    "extended".to_string()
}
fn default_min_suggest() -> i32 {
    -1
}
fn default_beats_per_bar() -> f64 {
    4.0
}
fn default_polyphony() -> usize {
    6
}
fn default_volume() -> f64 {
    0.2
}
fn default_off_delta() -> f64 {
    0.1
}
fn default_pattern() -> String {
    "waterfall".to_string()
}
fn default_beats_per_step() -> f64 {
    0.5
}
fn default_arpeggio() -> Option<ArpeggioConfig> {
    Some(ArpeggioConfig::default())
}

impl Default for ArpeggioConfig {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            beats_per_step: default_beats_per_step(),
        }
    }
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            tempo: default_tempo(),
            base_note: default_base_note(),
            context: default_context(),
            min_suggest: default_min_suggest(),
            max_suggest: None,
            beats_per_bar: default_beats_per_bar(),
            polyphony: default_polyphony(),
            volume: default_volume(),
            off_delta: default_off_delta(),
            arpeggio: default_arpeggio(),
            score: None,
            seed: None,
        }
    }
}

impl ComposerConfig {
    /// Load from a file, choosing TOML for `.toml` and YAML otherwise
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
        if is_toml {
            Self::from_toml(&contents)
        } else {
            Self::from_yaml(&contents)
        }
    }

    /// Parse from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")
    }

    /// Parse from a TOML string
    pub fn from_toml(source: &str) -> Result<Self> {
        toml::from_str(source).context("Failed to parse TOML configuration")
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Check every setting, reporting the first problem found
    pub fn validate(&self) -> Result<()> {
        if !(self.tempo > 0.0) {
            bail!("tempo must be positive, got {}", self.tempo);
        }
        if !(self.beats_per_bar > 0.0) {
            bail!("beats_per_bar must be positive, got {}", self.beats_per_bar);
        }
        if self.polyphony == 0 {
            bail!("polyphony must be at least 1");
        }
        self.base_note()?;
        self.context_templates()?;
        if let (min, Some(max)) = (self.min_suggest, self.max_suggest) {
            if max <= min {
                bail!("max_suggest ({}) must be above min_suggest ({})", max, min);
            }
        }
        self.arpeggio_settings()?;
        Ok(())
    }

    pub fn base_note(&self) -> Result<Note> {
        Note::parse(&self.base_note)
            .with_context(|| format!("Invalid base note {:?}", self.base_note))
    }

    pub fn context_templates(&self) -> Result<Vec<ContextualChordTemplate>> {
        match self.context.to_ascii_lowercase().as_str() {
            "extended" => Ok(extended_context()),
            "major" => Ok(major_context()),
            "minor" => Ok(minor_context()),
            other => Err(anyhow!(
                "Unknown context {:?}, expected one of {:?}",
                other,
                CONTEXTS
            )),
        }
    }

    pub fn arpeggio_settings(&self) -> Result<Option<ArpeggioSettings>> {
        let Some(arpeggio) = &self.arpeggio else {
            return Ok(None);
        };
        let pattern = patterns::by_name(&arpeggio.pattern).ok_or_else(|| {
            anyhow!(
                "Unknown arpeggio pattern {:?}, expected one of {:?}",
                arpeggio.pattern,
                patterns::NAMES
            )
        })?;
        if !(arpeggio.beats_per_step > 0.0) {
            bail!("beats_per_step must be positive, got {}", arpeggio.beats_per_step);
        }
        Ok(Some(ArpeggioSettings {
            pattern,
            beats_per_step: arpeggio.beats_per_step,
        }))
    }

    pub fn timing(&self) -> Timing {
        Timing::new(self.tempo)
    }

    /// Melody suggester, seeded when `seed` is set
    pub fn suggester(&self) -> Result<BasicMelodyBarSuggester> {
        Ok(BasicMelodyBarSuggester::new(
            self.base_note()?,
            &self.context_templates()?,
            duration_templates(),
            self.min_suggest,
            self.max_suggest,
        )
        .with_rng(make_rng(self.seed)))
    }

    pub fn composer_settings(&self) -> Result<ComposerSettings> {
        Ok(ComposerSettings {
            chord_dictionary: western_chord_dictionary(),
            arpeggio: self.arpeggio_settings()?,
            beats_per_bar: self.beats_per_bar,
            performance: PerformanceOptions {
                off_delta: self.off_delta,
                volume: self.volume,
                ..PerformanceOptions::default()
            },
        })
    }

    /// Synth with `polyphony` voices
    pub fn voice_manager(&self) -> VoiceManager<SynthVoice> {
        VoiceManager::with_polyphony(self.polyphony, SynthVoice::bounce_synth)
    }

    /// Validate and build a composer playing through `instrument`.
    ///
    /// `scheduler` supplies the clock; its tempo is replaced by `tempo`.
    pub fn build_composer<I: Instrument>(
        &self,
        mut scheduler: Scheduler,
        instrument: I,
    ) -> Result<Composer<I>> {
        self.validate()?;
        scheduler.set_tempo(self.tempo);
        Composer::new(
            self.suggester()?,
            scheduler,
            instrument,
            self.composer_settings()?,
            self.score.as_deref(),
        )
        .context("Failed to create composer")
    }
}

/// Load and validate a configuration file
pub fn validate_config<P: AsRef<Path>>(path: P) -> Result<ComposerConfig> {
    let config = ComposerConfig::load(path)?;
    config.validate()?;
    Ok(config)
}
