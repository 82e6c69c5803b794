// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Arpeggiator turning a chord into timed notes from a step pattern.
//!
//! Each [`PatternVoice`] plays one chord tone through its own sequence of
//! steps. A voice is a small state machine: `On` opens a note (closing the
//! previous one first if it is still sounding), `Off` closes it and `Hold`
//! leaves it alone. A final `Off` after the last step closes anything still
//! sounding.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::music::{Chord, Note};
use crate::sequencer::{NoteGroup, TimedNote};

/// Octave shift applied to every arpeggiated note
pub const DEFAULT_OCTAVE_SHIFT: i32 = -2;

/// One step of a pattern voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    On,
    Off,
    Hold,
}

impl Step {
    /// Events emitted when a voice in state `self` meets `step`
    fn transition(self, step: Step) -> &'static [Step] {
        match (self, step) {
            (Step::On, Step::On) => &[Step::Off, Step::On],
            (Step::On, Step::Off) => &[Step::Off],
            (Step::Off, Step::On) => &[Step::On],
            _ => &[],
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::On => "ON",
            Step::Off => "OFF",
            Step::Hold => "HOLD",
        })
    }
}

impl FromStr for Step {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ON" => Ok(Step::On),
            "OFF" => Ok(Step::Off),
            "HOLD" => Ok(Step::Hold),
            _ => Err(Error::Deserialization(format!("unknown arpeggio step {:?}", s))),
        }
    }
}

/// Steps for one chord tone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternVoice {
    /// Chord tone, wrapping into other octaves like [`Chord::get_n`]
    pub scale_index: i32,
    /// Extra octaves on top of the arpeggiator's default shift
    pub octave_shift: i32,
    pub steps: Vec<Step>,
}

impl PatternVoice {
    pub fn new(scale_index: i32, octave_shift: i32, steps: Vec<Step>) -> Self {
        Self {
            scale_index,
            octave_shift,
            steps,
        }
    }
}

/// A set of voices stepping together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpeggioPattern {
    pub name: String,
    pub voices: Vec<PatternVoice>,
}

impl ArpeggioPattern {
    pub fn new(name: impl Into<String>, voices: Vec<PatternVoice>) -> Self {
        Self {
            name: name.into(),
            voices,
        }
    }

    /// Steps in one cycle, taken from the first voice
    pub fn len(&self) -> usize {
        self.voices.first().map_or(0, |v| v.steps.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Renders an [`ArpeggioPattern`] over a chord
#[derive(Debug, Clone)]
pub struct Arpeggiator {
    pattern: ArpeggioPattern,
    chord: Chord,
    beats_per_step: f64,
    start_offset: f64,
    cut_off: Option<f64>,
    default_octave_shift: i32,
}

impl Arpeggiator {
    /// One step per beat over a single cycle of the pattern
    pub fn new(pattern: ArpeggioPattern, chord: Chord) -> Self {
        Self {
            pattern,
            chord,
            beats_per_step: 1.0,
            start_offset: 0.0,
            cut_off: None,
            default_octave_shift: DEFAULT_OCTAVE_SHIFT,
        }
    }

    pub fn with_beats_per_step(mut self, beats_per_step: f64) -> Self {
        self.beats_per_step = beats_per_step;
        self
    }

    /// Play the pattern from `start` to `cut_off` beats into its cycle.
    ///
    /// The emitted notes still begin at beat zero; `start` only chooses
    /// where in the cycle playing starts. Without `cut_off` playing stops
    /// at the end of one cycle.
    pub fn with_window(mut self, start: f64, cut_off: Option<f64>) -> Self {
        self.start_offset = start;
        self.cut_off = cut_off;
        self
    }

    pub fn with_default_octave_shift(mut self, octaves: i32) -> Self {
        self.default_octave_shift = octaves;
        self
    }

    /// Render the pattern into notes.
    ///
    /// # Panics
    ///
    /// Panics if the chord is empty, or if a note is somehow left open.
    pub fn to_note_group(&self) -> NoteGroup {
        let mut group = NoteGroup::new();
        let length = self.pattern.len();
        if length == 0 {
            return group;
        }

        let start = self.start_offset / self.beats_per_step;
        let cut_off = match self.cut_off {
            Some(beats) => beats / self.beats_per_step,
            None => length as f64,
        };

        let mut notes_on: HashMap<(i32, i32), (Note, f64)> = HashMap::new();
        for voice in &self.pattern.voices {
            let note = self
                .chord
                .get_n(voice.scale_index)
                .octave_shift(voice.octave_shift + self.default_octave_shift);
            let key = (voice.scale_index, voice.octave_shift);

            let mut handle = |event: Step, j: usize| {
                let beat = j as f64 * self.beats_per_step;
                match event {
                    Step::On => {
                        notes_on.insert(key, (note, beat));
                    }
                    Step::Off => {
                        if let Some((note, start)) = notes_on.remove(&key) {
                            group.add_event(TimedNote::new(note, start, beat));
                        }
                    }
                    Step::Hold => unreachable!("transitions never emit hold"),
                }
            };

            let mut state = Step::Off;
            let mut j = 0;
            let mut i = start;
            while i < cut_off {
                // Voices shorter than the first wrap on their own length
                let index = (i.floor() as usize) % voice.steps.len().max(1);
                let step = voice.steps.get(index).copied().unwrap_or(Step::Hold);
                let events = state.transition(step);
                if let Some(last) = events.last() {
                    state = *last;
                }
                for event in events {
                    handle(*event, j);
                }
                j += 1;
                i += 1.0;
            }
            for event in state.transition(Step::Off) {
                handle(*event, j);
            }
        }

        assert!(notes_on.is_empty(), "arpeggiator left notes open");
        group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::patterns;

    fn chord(names: &[&str]) -> Chord {
        Chord::new(names.iter().map(|n| Note::parse(n).unwrap()).collect())
    }

    fn sorted_strings(group: &NoteGroup) -> Vec<String> {
        let mut strings: Vec<String> = group.iter_strings().collect();
        strings.sort();
        strings
    }

    #[test]
    fn test_waterfall_over_c_major() {
        let arpeggiator = Arpeggiator::new(patterns::waterfall(), chord(&["C4", "E4", "G4"]));
        let expected = NoteGroup::from_events(
            [
                ("C2", 0.0, 8.0),
                ("E2", 1.0, 2.0),
                ("G2", 2.0, 3.0),
                ("E2", 3.0, 4.0),
                ("G2", 4.0, 5.0),
                ("C3", 5.0, 6.0),
                ("G2", 6.0, 7.0),
                ("E2", 7.0, 8.0),
            ]
            .iter()
            .map(|(n, s, e)| TimedNote::new(Note::parse(n).unwrap(), *s, *e)),
        );
        assert_eq!(sorted_strings(&arpeggiator.to_note_group()), sorted_strings(&expected));
    }

    #[test]
    fn test_beats_per_step_scales_time() {
        let arpeggiator = Arpeggiator::new(patterns::waterfall(), chord(&["C4", "E4", "G4"]))
            .with_beats_per_step(0.5);
        let group = arpeggiator.to_note_group();
        assert!(group.iter_strings().any(|s| s == "C2,0,4"));
        assert!(group.iter_strings().any(|s| s == "E2,0.5,1"));
    }

    #[test]
    fn test_on_after_on_retriggers() {
        let pattern = ArpeggioPattern::new(
            "repeat",
            vec![PatternVoice::new(0, 2, vec![Step::On, Step::On, Step::Hold])],
        );
        let group = Arpeggiator::new(pattern, chord(&["A4"])).to_note_group();
        assert_eq!(
            group.iter_strings().collect::<Vec<_>>(),
            vec!["A4,0,1", "A4,1,3"]
        );
    }

    #[test]
    fn test_window_keeps_phase_but_starts_at_zero() {
        let pattern = ArpeggioPattern::new(
            "alternate",
            vec![PatternVoice::new(0, 2, vec![Step::On, Step::Off, Step::Off, Step::On])],
        );
        // Beats 2..6 read steps 2, 3, 0, 1
        let group = Arpeggiator::new(pattern, chord(&["A4"]))
            .with_window(2.0, Some(6.0))
            .to_note_group();
        assert_eq!(
            group.iter_strings().collect::<Vec<_>>(),
            vec!["A4,1,2", "A4,2,3"]
        );
    }

    #[test]
    fn test_every_builtin_pattern_closes_its_notes() {
        let chord = chord(&["D4", "F4", "A5", "C5"]);
        for name in patterns::NAMES {
            let pattern = patterns::by_name(name).unwrap();
            for bar in 0..4 {
                let start = bar as f64 * 4.0;
                let group = Arpeggiator::new(pattern.clone(), chord.clone())
                    .with_beats_per_step(0.5)
                    .with_window(start, Some(start + 4.0))
                    .to_note_group();
                for note in group.iter() {
                    assert!(note.start < note.end, "{} in {}", note, name);
                    assert!(note.end <= 4.0, "{} in {}", note, name);
                }
            }
        }
    }

    #[test]
    fn test_empty_pattern() {
        let pattern = ArpeggioPattern::new("empty", vec![]);
        assert!(pattern.is_empty());
        assert!(Arpeggiator::new(pattern, chord(&["A4"])).to_note_group().is_empty());
    }

    #[test]
    fn test_step_parse() {
        assert_eq!("on".parse::<Step>().unwrap(), Step::On);
        assert_eq!("HOLD".parse::<Step>().unwrap(), Step::Hold);
        assert_eq!(Step::Off.to_string(), "OFF");
        assert!("maybe".parse::<Step>().is_err());
    }
}
