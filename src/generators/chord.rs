// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord progression suggestions.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{History, Outcome, Suggester};
use crate::music::{ContextualChord, ContextualChordTemplate, Note};

/// Suggests chords from a fixed set, each equally likely
#[derive(Debug, Clone)]
pub struct BasicChordSuggester {
    base: Note,
    contextual_chords: Vec<ContextualChord>,
    history: History<ContextualChord>,
    rng: StdRng,
}

impl BasicChordSuggester {
    /// Realize every template in the key rooted at `base`.
    ///
    /// # Panics
    ///
    /// Panics if `templates` is empty.
    pub fn new(base: Note, templates: &[ContextualChordTemplate]) -> Self {
        assert!(!templates.is_empty(), "chord suggester needs at least one template");
        let contextual_chords = templates
            .iter()
            .map(|template| template.apply(&base.jump(template.interval())))
            .collect();
        Self {
            base,
            contextual_chords,
            history: History::new(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn base(&self) -> Note {
        self.base
    }

    /// Every chord that can be suggested
    pub fn contextual_chords(&self) -> &[ContextualChord] {
        &self.contextual_chords
    }
}

impl Suggester for BasicChordSuggester {
    type Value = ContextualChord;

    fn history(&self) -> &History<ContextualChord> {
        &self.history
    }

    fn history_mut(&mut self) -> &mut History<ContextualChord> {
        &mut self.history
    }

    fn suggest_internal(&mut self) -> Outcome<ContextualChord> {
        let probability = 1.0 / self.contextual_chords.len() as f64;
        let index = self.rng.gen_range(0..self.contextual_chords.len());
        Outcome::new(self.contextual_chords[index].clone(), probability)
    }
}
