// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Music theory utilities for tapcompose.
//!
//! Pitches live in two-three space (exponents of 2 and 3), which keeps
//! enharmonic spellings distinct. Chords and scales are built from interval
//! templates applied to a root note.

pub mod chord;
pub mod note;
pub mod western;

pub use chord::{
    Chord, ChordDictionary, ChordTemplate, ContextualChord, ContextualChordTemplate, NamedChord,
    NamedChordTemplate,
};
pub use note::{Interval, Letter, Note};
