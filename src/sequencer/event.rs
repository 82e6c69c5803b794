// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timed events: instrument actions and notes.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::group::Group;
use crate::error::{Error, Result};
use crate::instrument::{Command, Instrument, DEFAULT_VOLUME};
use crate::music::Note;

/// Decimal places in a timed note's string form
const NOTE_PRECISION: usize = 5;
/// Decimal places in a timed note's time key
const TIME_KEY_PRECISION: usize = 6;

/// Format a number with at most `precision` decimals and no trailing zeros
pub fn format_number(num: f64, precision: usize) -> String {
    let fixed = format!("{:.*}", precision, num);
    let trimmed = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        fixed.as_str()
    };
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Anything that happens at a beat and can be moved in time
pub trait Event: Clone {
    /// Beat at which the event takes effect
    fn beats(&self) -> f64;

    /// Copy of the event moved by `beats`
    fn shift(&self, beats: f64) -> Self;
}

/// Callback run by a [`FunctionEvent`]
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// What a [`FunctionEvent`] does when its time comes
#[derive(Clone)]
pub enum Action {
    /// Send a command to the scheduler's instrument
    Perform(Command),
    /// Run an arbitrary callback
    Call(Callback),
}

impl Action {
    pub fn run(&self, instrument: &mut dyn Instrument) {
        match self {
            Action::Perform(command) => command.apply(instrument),
            Action::Call(callback) => callback(),
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Perform(command) => f.debug_tuple("Perform").field(command).finish(),
            Action::Call(_) => f.write_str("Call(..)"),
        }
    }
}

/// An action scheduled at a beat
#[derive(Debug, Clone)]
pub struct FunctionEvent {
    pub action: Action,
    pub beats: f64,
}

impl FunctionEvent {
    pub fn new(action: Action, beats: f64) -> Self {
        Self { action, beats }
    }

    /// Event that runs `callback`
    pub fn call(callback: impl Fn() + Send + Sync + 'static, beats: f64) -> Self {
        Self::new(Action::Call(Arc::new(callback)), beats)
    }

    pub fn note_on(handle: impl Into<String>, frequency: f64, volume: f64, beats: f64) -> Self {
        Self::new(
            Action::Perform(Command::NoteOn {
                handle: handle.into(),
                frequency,
                volume,
            }),
            beats,
        )
    }

    pub fn note_off(handle: impl Into<String>, beats: f64) -> Self {
        Self::new(
            Action::Perform(Command::NoteOff {
                handle: handle.into(),
            }),
            beats,
        )
    }
}

impl Event for FunctionEvent {
    fn beats(&self) -> f64 {
        self.beats
    }

    fn shift(&self, beats: f64) -> Self {
        Self {
            action: self.action.clone(),
            beats: self.beats + beats,
        }
    }
}

/// A note sounding over `[start, end)` beats
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedNote {
    pub note: Note,
    pub start: f64,
    pub end: f64,
}

impl TimedNote {
    pub fn new(note: Note, start: f64, end: f64) -> Self {
        Self { note, start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// `start,end` at micro-beat precision, identifying the note's slot
    pub fn time_key(&self) -> String {
        format!(
            "{:.*},{:.*}",
            TIME_KEY_PRECISION, self.start, TIME_KEY_PRECISION, self.end
        )
    }

    /// Note-on and note-off events for previewing this note alone.
    ///
    /// With `shift_start` the note-on lands at beat zero.
    pub fn to_group(&self, shift_start: bool, off_delta: f64) -> Group<FunctionEvent> {
        let origin = if shift_start { self.start } else { 0.0 };
        let handle = self.note.to_string();
        Group::from_events([
            FunctionEvent::note_on(
                handle.clone(),
                self.note.well_tempered_frequency(),
                DEFAULT_VOLUME,
                self.start - origin,
            ),
            FunctionEvent::note_off(handle, self.end - off_delta - origin),
        ])
    }
}

impl Event for TimedNote {
    fn beats(&self) -> f64 {
        self.start
    }

    fn shift(&self, beats: f64) -> Self {
        Self::new(self.note, self.start + beats, self.end + beats)
    }
}

impl fmt::Display for TimedNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{}",
            self.note,
            format_number(self.start, NOTE_PRECISION),
            format_number(self.end, NOTE_PRECISION)
        )
    }
}

impl FromStr for TimedNote {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').collect();
        let [note, start, end] = parts.as_slice() else {
            return Err(Error::Deserialization(format!(
                "expected note,start,end but got {:?}",
                s
            )));
        };
        Ok(Self::new(
            Note::parse(note)?,
            parse_beats(start)?,
            parse_beats(end)?,
        ))
    }
}

/// Parse a beat position, rejecting non-finite values
pub fn parse_beats(s: &str) -> Result<f64> {
    s.parse::<f64>()
        .ok()
        .filter(|b| b.is_finite())
        .ok_or_else(|| Error::Deserialization(format!("invalid beat value {:?}", s)))
}

/// A tree of timed notes
pub type NoteGroup = Group<TimedNote>;

/// Options for turning notes into instrument events
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceOptions {
    /// Move everything so the earliest note starts at beat zero
    pub shift_start: bool,
    /// Prefix for each note's instrument handle
    pub unique_handle: String,
    /// Beats to release each note before its end
    pub off_delta: f64,
    pub volume: f64,
}

impl Default for PerformanceOptions {
    fn default() -> Self {
        Self {
            shift_start: false,
            unique_handle: String::new(),
            off_delta: 0.1,
            volume: DEFAULT_VOLUME,
        }
    }
}

impl Group<TimedNote> {
    /// Every note as `note,start,end`, in iteration order
    pub fn iter_strings(&self) -> impl Iterator<Item = String> + '_ {
        self.iter().map(|n| n.to_string())
    }

    /// `|`-joined string form of every note
    pub fn serialize(&self) -> String {
        self.iter_strings().collect::<Vec<_>>().join("|")
    }

    /// Inverse of [`serialize`](Self::serialize)
    pub fn deserialize(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Self::new());
        }
        let notes = s
            .split('|')
            .map(str::parse::<TimedNote>)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_events(notes))
    }

    /// Earliest start among all notes
    pub fn min_start(&self) -> Option<f64> {
        self.iter().map(|n| n.start).reduce(f64::min)
    }

    /// Note-on and note-off events for every note.
    ///
    /// Each note-off lands `off_delta` beats before the note's end, leaving
    /// a gap before a repeated pitch. Handles are the prefix plus the note
    /// name, so repeated pitches share a handle and retrigger.
    pub fn to_performance_group(&self, options: &PerformanceOptions) -> Group<FunctionEvent> {
        let origin = if options.shift_start {
            self.min_start().unwrap_or(0.0)
        } else {
            0.0
        };
        let mut group = Group::new();
        for timed_note in self.iter() {
            let handle = format!("{}{}", options.unique_handle, timed_note.note);
            group.add_event(FunctionEvent::note_on(
                handle.clone(),
                timed_note.note.well_tempered_frequency(),
                options.volume,
                timed_note.start - origin,
            ));
            group.add_event(FunctionEvent::note_off(
                handle,
                timed_note.end - options.off_delta - origin,
            ));
        }
        group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::RecordingInstrument;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn timed(name: &str, start: f64, end: f64) -> TimedNote {
        TimedNote::new(Note::parse(name).unwrap(), start, end)
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0.0, 5), "0");
        assert_eq!(format_number(1.23, 5), "1.23");
        assert_eq!(format_number(4.6, 5), "4.6");
        assert_eq!(format_number(1.0 / 3.0, 5), "0.33333");
        assert_eq!(format_number(2.0 / 3.0, 6), "0.666667");
        assert_eq!(format_number(-0.000001, 5), "0");
        assert_eq!(format_number(12.0, 6), "12");
    }

    #[test]
    fn test_timed_note_display_and_key() {
        let note = timed("D#4", 1.23, 4.6);
        assert_eq!(note.to_string(), "D#4,1.23,4.6");
        assert_eq!(note.time_key(), "1.230000,4.600000");
        assert_eq!(note.shift(1.0).to_string(), "D#4,2.23,5.6");
    }

    #[test]
    fn test_note_group_serialize() {
        let group = NoteGroup::from_events([
            timed("C2", 0.0, 1.0),
            timed("D#4", 1.23, 4.6),
            timed("Ebb-12", 9.873, 10.0),
        ]);
        assert_eq!(group.serialize(), "C2,0,1|D#4,1.23,4.6|Ebb-12,9.873,10");
    }

    #[test]
    fn test_note_group_deserialize() {
        let group = NoteGroup::deserialize("C2,0,1|D#4,1.23,4.6|Ebb-12,9.873,10").unwrap();
        let notes: Vec<TimedNote> = group.iter().collect();
        assert_eq!(notes.len(), 3);
        assert_eq!(notes[0], timed("C2", 0.0, 1.0));
        assert_eq!(notes[1].note.accidentals(), 1);
        assert_eq!(notes[1].start, 1.23);
        assert_eq!(notes[2].note.accidentals(), -2);
        assert_eq!(notes[2].note.octave(), -12);
        assert_eq!(notes[2].end, 10.0);

        assert!(NoteGroup::deserialize("").unwrap().is_empty());
        assert!(NoteGroup::deserialize("C2,0").is_err());
        assert!(NoteGroup::deserialize("C2,zero,1").is_err());
        assert!(NoteGroup::deserialize("X2,0,1").is_err());
    }

    #[test]
    fn test_performance_group() {
        let group = NoteGroup::from_events([timed("A4", 0.0, 1.0), timed("A5", 1.0, 2.0)]);
        let options = PerformanceOptions {
            unique_handle: "melody:".into(),
            ..Default::default()
        };
        let performance = group.to_performance_group(&options);
        let beats: Vec<f64> = performance.iter().map(|e| e.beats).collect();
        assert_eq!(beats, vec![0.0, 0.9, 1.0, 1.9]);

        let mut instrument = RecordingInstrument::new();
        for event in performance.iter() {
            event.action.run(&mut instrument);
        }
        assert_eq!(
            instrument.commands()[0],
            Command::NoteOn {
                handle: "melody:A4".into(),
                frequency: 440.0,
                volume: 0.2
            }
        );
        assert_eq!(
            instrument.commands()[3],
            Command::NoteOff {
                handle: "melody:A5".into()
            }
        );
    }

    #[test]
    fn test_performance_group_shift_start() {
        let group = NoteGroup::from_events([timed("C4", 8.0, 9.0), timed("E4", 8.5, 10.0)]);
        let options = PerformanceOptions {
            shift_start: true,
            off_delta: 0.0,
            ..Default::default()
        };
        let beats: Vec<f64> = group.to_performance_group(&options).iter().map(|e| e.beats).collect();
        assert_eq!(beats, vec![0.0, 1.0, 0.5, 2.0]);
    }

    #[test]
    fn test_timed_note_to_group() {
        let note = timed("A4", 2.0, 3.0);
        let beats: Vec<f64> = note.to_group(false, 0.5).iter().map(|e| e.beats).collect();
        assert_eq!(beats, vec![2.0, 2.5]);
        let beats: Vec<f64> = note.to_group(true, 0.5).iter().map(|e| e.beats).collect();
        assert_eq!(beats, vec![0.0, 0.5]);
    }

    #[test]
    fn test_call_action() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&counter);
        let event = FunctionEvent::call(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        }, 3.0);
        let shifted = event.shift(1.0);
        assert_eq!(shifted.beats, 4.0);

        let mut instrument = RecordingInstrument::new();
        shifted.action.run(&mut instrument);
        event.action.run(&mut instrument);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert!(instrument.commands().is_empty());
    }
}
