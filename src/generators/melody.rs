// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Melody suggestions: single notes, rhythms and whole bars.
//!
//! A [`BasicMelodyBarSuggester`] drives a chord, a rhythm and a note
//! suggester together. Each bar picks a chord, picks a rhythm, then fills
//! every slot of the rhythm with a note from the chord's scale, so a bar
//! is always gapless and exactly one rhythm long.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::chord::BasicChordSuggester;
use super::{History, Outcome, Suggester};
use crate::music::{Chord, ChordTemplate, ContextualChord, ContextualChordTemplate, Note};
use crate::sequencer::{NoteGroup, TimedNote};

/// One bar of melody over a chord
#[derive(Debug, Clone, PartialEq)]
pub struct MelodicBar {
    pub chord: ContextualChord,
    pub notes: NoteGroup,
}

impl MelodicBar {
    pub fn new(chord: ContextualChord, notes: NoteGroup) -> Self {
        Self { chord, notes }
    }
}

/// Suggests notes uniformly from a range of scale degrees.
///
/// Indices outside the scale wrap into neighbouring octaves, so `-1` is the
/// top of the scale an octave down.
#[derive(Debug, Clone)]
pub struct BasicNoteSuggester {
    base: Note,
    scale: Chord,
    min_suggest: i32,
    max_suggest: i32,
    history: History<Note>,
    rng: StdRng,
}

impl BasicNoteSuggester {
    /// Suggest indices in `[min_suggest, max_suggest)`. The upper bound
    /// defaults to the size of the scale.
    pub fn new(
        base: Note,
        scale_template: &ChordTemplate,
        min_suggest: i32,
        max_suggest: Option<i32>,
    ) -> Self {
        Self {
            base,
            scale: scale_template.apply(&base),
            min_suggest,
            max_suggest: max_suggest.unwrap_or(scale_template.len() as i32),
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

    pub fn scale(&self) -> &Chord {
        &self.scale
    }

    /// Swap the scale notes are drawn from
    pub fn set_scale(&mut self, scale: Chord) {
        self.scale = scale;
    }

    /// The `[min, max)` index range
    pub fn range(&self) -> (i32, i32) {
        (self.min_suggest, self.max_suggest)
    }
}

impl Suggester for BasicNoteSuggester {
    type Value = Note;

    fn history(&self) -> &History<Note> {
        &self.history
    }

    fn history_mut(&mut self) -> &mut History<Note> {
        &mut self.history
    }

    fn suggest_internal(&mut self) -> Outcome<Note> {
        let index = if self.max_suggest > self.min_suggest {
            self.rng.gen_range(self.min_suggest..self.max_suggest)
        } else {
            self.min_suggest
        };
        Outcome::fixed(self.scale.get_n(index))
    }
}

/// Suggests one-bar rhythms, each equally likely
#[derive(Debug, Clone)]
pub struct BasicRhythmSuggester {
    templates: Vec<Vec<f64>>,
    history: History<Vec<f64>>,
    rng: StdRng,
}

impl BasicRhythmSuggester {
    /// Each template is a list of note durations in beats.
    ///
    /// # Panics
    ///
    /// Panics if `templates` is empty.
    pub fn new(templates: Vec<Vec<f64>>) -> Self {
        assert!(!templates.is_empty(), "rhythm suggester needs at least one template");
        Self {
            templates,
            history: History::new(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn templates(&self) -> &[Vec<f64>] {
        &self.templates
    }
}

impl Suggester for BasicRhythmSuggester {
    type Value = Vec<f64>;

    fn history(&self) -> &History<Vec<f64>> {
        &self.history
    }

    fn history_mut(&mut self) -> &mut History<Vec<f64>> {
        &mut self.history
    }

    fn suggest_internal(&mut self) -> Outcome<Vec<f64>> {
        let index = self.rng.gen_range(0..self.templates.len());
        Outcome::new(
            self.templates[index].clone(),
            1.0 / self.templates.len() as f64,
        )
    }
}

/// Suggests whole bars of melody over a chord progression
#[derive(Debug, Clone)]
pub struct BasicMelodyBarSuggester {
    chords: BasicChordSuggester,
    notes: BasicNoteSuggester,
    rhythms: BasicRhythmSuggester,
    history: History<MelodicBar>,
    current_beat: f64,
    current_end_beat: f64,
}

impl BasicMelodyBarSuggester {
    /// The note suggester starts on the scale of the first template.
    ///
    /// # Panics
    ///
    /// Panics if either template list is empty.
    pub fn new(
        base: Note,
        templates: &[ContextualChordTemplate],
        rhythm_templates: Vec<Vec<f64>>,
        min_suggest: i32,
        max_suggest: Option<i32>,
    ) -> Self {
        assert!(!templates.is_empty(), "melody suggester needs at least one chord template");
        Self {
            chords: BasicChordSuggester::new(base, templates),
            notes: BasicNoteSuggester::new(base, templates[0].scale(), min_suggest, max_suggest),
            rhythms: BasicRhythmSuggester::new(rhythm_templates),
            history: History::new(),
            current_beat: 0.0,
            current_end_beat: 0.0,
        }
    }

    /// Drive every sub-suggester from `rng`
    pub fn with_rng(mut self, mut rng: StdRng) -> Self {
        self.chords = self.chords.with_rng(StdRng::seed_from_u64(rng.gen()));
        self.notes = self.notes.with_rng(StdRng::seed_from_u64(rng.gen()));
        self.rhythms = self.rhythms.with_rng(StdRng::seed_from_u64(rng.gen()));
        self
    }

    pub fn chord_suggester(&self) -> &BasicChordSuggester {
        &self.chords
    }

    pub fn note_suggester(&self) -> &BasicNoteSuggester {
        &self.notes
    }

    pub fn rhythm_suggester(&self) -> &BasicRhythmSuggester {
        &self.rhythms
    }

    /// Beat the next bar starts on
    pub fn current_beat(&self) -> f64 {
        self.current_beat
    }

    pub fn set_current_beat(&mut self, beat: f64) {
        self.current_beat = beat;
        self.current_end_beat = beat;
    }

    /// Beat the pending bar ends on
    pub fn current_end_beat(&self) -> f64 {
        self.current_end_beat
    }

    /// Treat `[start, end)` as the pending bar, so accepting moves on to
    /// `end`. Used when a history is loaded rather than suggested.
    pub fn set_pending_span(&mut self, start: f64, end: f64) {
        self.current_beat = start;
        self.current_end_beat = end;
    }
}

impl Suggester for BasicMelodyBarSuggester {
    type Value = MelodicBar;

    fn history(&self) -> &History<MelodicBar> {
        &self.history
    }

    fn history_mut(&mut self) -> &mut History<MelodicBar> {
        &mut self.history
    }

    fn suggest_internal(&mut self) -> Outcome<MelodicBar> {
        let chord = self.chords.suggest(false).value.clone();
        let rhythm = self.rhythms.suggest(false).value.clone();

        // Notes are appended one per slot below, so clear them up front
        self.notes.clear_suggestion();
        self.notes.set_scale(chord.scale.clone());

        let mut notes = NoteGroup::new();
        let mut start = self.current_beat;
        for duration in rhythm {
            let note = self.notes.suggest(true).value;
            notes.add_event(TimedNote::new(note, start, start + duration));
            start += duration;
        }
        self.current_end_beat = start;

        Outcome::fixed(MelodicBar::new(chord, notes))
    }

    fn accept(&mut self) {
        self.history.accept();
        self.chords.accept();
        self.rhythms.accept();
        self.notes.accept();
        self.current_beat = self.current_end_beat;
    }
}
