// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chords, chord templates and chord name lookup.
//!
//! A chord is an ordered list of notes. Templates are lists of intervals
//! that turn a root note into a chord; named and contextual templates add
//! a display suffix and an associated scale on top of that.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use super::note::{Interval, Note};
use crate::error::{Error, Result};

/// Octave used when a chord name carries no octave of its own
pub const DEFAULT_CHORD_OCTAVE: i32 = 2;

/// An ordered list of intervals applied to a root note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordTemplate {
    intervals: Vec<Interval>,
}

impl ChordTemplate {
    /// Create a template from its intervals, in voicing order
    pub fn new(intervals: Vec<Interval>) -> Self {
        Self { intervals }
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Number of intervals in the template
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Build a chord by jumping the root by each interval
    pub fn apply(&self, root: &Note) -> Chord {
        Chord::new(self.intervals.iter().map(|i| root.jump(*i)).collect())
    }
}

/// An ordered collection of notes, root first
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Chord {
    notes: Vec<Note>,
}

impl Chord {
    pub fn new(notes: Vec<Note>) -> Self {
        Self { notes }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// The `n`-th chord tone, extended in both directions by octaves.
    ///
    /// `get_n(n + len)` is always exactly one octave above `get_n(n)`.
    ///
    /// # Panics
    ///
    /// Panics if the chord is empty.
    pub fn get_n(&self, n: i32) -> Note {
        assert!(!self.notes.is_empty(), "get_n called on an empty chord");
        let len = self.notes.len() as i32;
        let note = &self.notes[n.rem_euclid(len) as usize];
        note.octave_shift(n.div_euclid(len))
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.notes.iter().map(|n| n.to_string()).collect();
        write!(f, "[{}]", names.join(" "))
    }
}

/// A chord template with a display suffix such as `"maj7"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedChordTemplate {
    template: ChordTemplate,
    suffix: String,
}

impl NamedChordTemplate {
    pub fn new(template: ChordTemplate, suffix: impl Into<String>) -> Self {
        Self {
            template,
            suffix: suffix.into(),
        }
    }

    pub fn template(&self) -> &ChordTemplate {
        &self.template
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Build the chord over `root` along with its display name
    pub fn apply(&self, root: &Note) -> NamedChord {
        NamedChord {
            chord: self.template.apply(root),
            name: format!("{}{}", root.pitch_name(), self.suffix),
            root: *root,
            suffix: self.suffix.clone(),
        }
    }
}

/// A realized chord together with the root and suffix that named it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedChord {
    pub chord: Chord,
    pub name: String,
    pub root: Note,
    pub suffix: String,
}

/// A named chord positioned within a key.
///
/// `interval` is the scale degree of the chord root measured from the key
/// root, and `scale` is the template of the key's scale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextualChordTemplate {
    interval: Interval,
    named: NamedChordTemplate,
    scale: ChordTemplate,
}

impl ContextualChordTemplate {
    pub fn new(interval: Interval, named: NamedChordTemplate, scale: ChordTemplate) -> Self {
        Self {
            interval,
            named,
            scale,
        }
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn named(&self) -> &NamedChordTemplate {
        &self.named
    }

    pub fn scale(&self) -> &ChordTemplate {
        &self.scale
    }

    /// Build the chord over `base` and the scale of the key it belongs to.
    ///
    /// The key root is found by jumping back from `base` by the template's
    /// interval.
    pub fn apply(&self, base: &Note) -> ContextualChord {
        let key_root = base.jump_back(self.interval);
        ContextualChord {
            named_chord: self.named.apply(base),
            scale: self.scale.apply(&key_root),
        }
    }
}

/// A chord plus the scale considered safe to play over it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextualChord {
    pub named_chord: NamedChord,
    pub scale: Chord,
}

impl ContextualChord {
    pub fn new(named_chord: NamedChord, scale: Chord) -> Self {
        Self { named_chord, scale }
    }

    /// Wrap a chord that has no known scale
    pub fn without_scale(named_chord: NamedChord) -> Self {
        Self::new(named_chord, Chord::default())
    }

    pub fn chord(&self) -> &Chord {
        &self.named_chord.chord
    }

    pub fn name(&self) -> &str {
        &self.named_chord.name
    }
}

fn chord_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Ga-g][#b]*(?:-?\d+)?)-?(.*)$").expect("chord name regex is valid")
    })
}

/// Lookup table from chord suffix to named chord template
#[derive(Debug, Clone, Default)]
pub struct ChordDictionary {
    templates: HashMap<String, NamedChordTemplate>,
}

impl ChordDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dictionary from templates, keyed by their suffixes
    pub fn from_templates(templates: impl IntoIterator<Item = NamedChordTemplate>) -> Self {
        let mut dictionary = Self::new();
        for template in templates {
            dictionary.insert(template);
        }
        dictionary
    }

    /// Add a template, replacing any with the same suffix
    pub fn insert(&mut self, template: NamedChordTemplate) {
        self.templates.insert(template.suffix.clone(), template);
    }

    pub fn get(&self, suffix: &str) -> Option<&NamedChordTemplate> {
        self.templates.get(suffix)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Parse a chord name like `"Bb-3maj7"`, `"E4-m"` or `"Cmaj7"`.
    ///
    /// Returns `Ok(None)` when the suffix is not in the dictionary, and an
    /// error when the name cannot be split into a note and a suffix.
    pub fn get_chord_by_name(&self, name: &str) -> Result<Option<NamedChord>> {
        self.get_chord_by_name_with_octave(name, DEFAULT_CHORD_OCTAVE)
    }

    /// Same as [`get_chord_by_name`](Self::get_chord_by_name) with an
    /// explicit octave for names that omit one.
    pub fn get_chord_by_name_with_octave(
        &self,
        name: &str,
        default_octave: i32,
    ) -> Result<Option<NamedChord>> {
        let captures = chord_name_regex()
            .captures(name)
            .ok_or_else(|| Error::InvalidChordName(name.to_string()))?;
        let note_part = &captures[1];
        let suffix = &captures[2];

        let root = if note_part.ends_with(|c: char| c.is_ascii_digit()) {
            Note::parse(note_part)
        } else {
            Note::parse(&format!("{}{}", note_part, default_octave))
        }
        .map_err(|_| Error::InvalidChordName(name.to_string()))?;

        Ok(self.get(suffix).map(|template| template.apply(&root)))
    }
}
