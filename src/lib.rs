// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! TapCompose - compose short melodies over suggested chord progressions.
//!
//! Pitches live in two-three space (powers of the octave and the fifth),
//! so spelling is exact: G#4 and Ab4 are different notes. On top of that
//! sit chord dictionaries, randomized suggesters for chords, rhythms and
//! melodies, a beat-based scheduler that drives an [`instrument`], and a
//! [`score`] layer that lays bars out in voices, saves them to compact
//! strings and lets a user edit them note by note.

pub mod config;
pub mod error;
pub mod generators;
pub mod instrument;
pub mod music;
pub mod score;
pub mod sequencer;
pub mod timing;

pub use error::{Error, Result};
