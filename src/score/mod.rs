// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Scores: laying notes out in measures, saving them to strings and
//! editing them interactively.

pub mod composer;
pub mod serializer;
pub mod voices;

pub use composer::{ArpeggioSettings, Composer, ComposerSettings, InteractiveNote, MAX_ACCIDENTALS};
pub use serializer::{
    score_serializers, ScoreSerializerV0, SerializationDictionary, VersionedSerializer,
};
pub use voices::{BarVoice, ScoreObject, Voice, Voices};

use crate::generators::MelodicBar;
use crate::music::NamedChord;
use crate::sequencer::NoteGroup;

/// Every note of a piece plus one chord per measure
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Score {
    pub chords: Vec<NamedChord>,
    pub notes: NoteGroup,
}

impl Score {
    pub fn new(chords: Vec<NamedChord>, notes: NoteGroup) -> Self {
        Self { chords, notes }
    }

    /// Flatten melodic bars into one score
    pub fn from_bars<'a>(bars: impl IntoIterator<Item = &'a MelodicBar>) -> Self {
        let mut score = Self::default();
        for bar in bars {
            score.chords.push(bar.chord.named_chord.clone());
            score.notes.add_group(bar.notes.clone());
        }
        score
    }
}
