// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Instruments that the scheduler performs notes on.
//!
//! An instrument is addressed by string handles: `note_on` claims a handle,
//! `note_off` releases it. Actual synthesis is left to whatever implements
//! [`Voice`]; this crate only models voice allocation and envelopes.

pub mod voice;

pub use voice::{Envelope, Oscillator, OscillatorBank, SilentVoice, SynthVoice, Voice, VoiceManager, Waveform};

use tracing::debug;

/// Default note-on volume
pub const DEFAULT_VOLUME: f64 = 0.2;

/// Something that can start and stop notes by handle
pub trait Instrument {
    /// Start a note at `frequency` hertz under `handle`
    fn note_on(&mut self, handle: &str, frequency: f64, volume: f64);

    /// Stop the note started under `handle`
    fn note_off(&mut self, handle: &str);

    /// Stop every sounding note
    fn all_off(&mut self);
}

/// A single instruction sent to an instrument
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    NoteOn {
        handle: String,
        frequency: f64,
        volume: f64,
    },
    NoteOff {
        handle: String,
    },
    AllOff,
}

impl Command {
    /// Send this command to an instrument
    pub fn apply(&self, instrument: &mut dyn Instrument) {
        match self {
            Command::NoteOn {
                handle,
                frequency,
                volume,
            } => instrument.note_on(handle, *frequency, *volume),
            Command::NoteOff { handle } => instrument.note_off(handle),
            Command::AllOff => instrument.all_off(),
        }
    }
}

/// Instrument that remembers every command it receives.
///
/// Useful for tests and for running without audio output.
#[derive(Debug, Clone, Default)]
pub struct RecordingInstrument {
    commands: Vec<Command>,
}

impl RecordingInstrument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands received so far, oldest first
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Handles of every note-on received, in order
    pub fn notes_played(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::NoteOn { handle, .. } => Some(handle.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Drain the recorded commands
    pub fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }
}

impl Instrument for RecordingInstrument {
    fn note_on(&mut self, handle: &str, frequency: f64, volume: f64) {
        debug!(handle, frequency, volume, "note on");
        self.commands.push(Command::NoteOn {
            handle: handle.to_string(),
            frequency,
            volume,
        });
    }

    fn note_off(&mut self, handle: &str) {
        debug!(handle, "note off");
        self.commands.push(Command::NoteOff {
            handle: handle.to_string(),
        });
    }

    fn all_off(&mut self) {
        debug!("all notes off");
        self.commands.push(Command::AllOff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_instrument() {
        let mut instrument = RecordingInstrument::new();
        instrument.note_on("A4", 440.0, 0.5);
        instrument.note_off("A4");
        instrument.all_off();

        assert_eq!(instrument.notes_played(), vec!["A4"]);
        assert_eq!(
            instrument.commands(),
            &[
                Command::NoteOn {
                    handle: "A4".into(),
                    frequency: 440.0,
                    volume: 0.5
                },
                Command::NoteOff {
                    handle: "A4".into()
                },
                Command::AllOff,
            ]
        );

        assert_eq!(instrument.take().len(), 3);
        assert!(instrument.commands().is_empty());
    }

    #[test]
    fn test_command_apply() {
        let mut instrument = RecordingInstrument::new();
        Command::NoteOn {
            handle: "x".into(),
            frequency: 220.0,
            volume: DEFAULT_VOLUME,
        }
        .apply(&mut instrument);
        Command::NoteOff { handle: "x".into() }.apply(&mut instrument);

        assert_eq!(instrument.commands().len(), 2);
        assert_eq!(instrument.notes_played(), vec!["x"]);
    }
}
