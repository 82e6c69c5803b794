// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Voices and polyphonic voice allocation.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::Instrument;

/// One monophonic sound source
pub trait Voice {
    fn note_on(&mut self, frequency: f64, volume: f64);
    fn note_off(&mut self);
    fn is_playing(&self) -> bool;
}

/// A voice that makes no sound
#[derive(Debug, Clone, Default)]
pub struct SilentVoice {
    playing: bool,
}

impl Voice for SilentVoice {
    fn note_on(&mut self, _frequency: f64, _volume: f64) {
        self.playing = true;
    }

    fn note_off(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

/// Oscillator waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Sawtooth,
    Square,
    Triangle,
}

/// An oscillator detuned by a fixed number of hertz
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oscillator {
    pub waveform: Waveform,
    pub detune: f64,
}

impl Oscillator {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            detune: 0.0,
        }
    }

    pub fn with_detune(mut self, detune: f64) -> Self {
        self.detune = detune;
        self
    }
}

/// A set of oscillators sounding together
#[derive(Debug, Clone, PartialEq)]
pub struct OscillatorBank {
    oscillators: Vec<Oscillator>,
}

impl OscillatorBank {
    pub fn new(oscillators: Vec<Oscillator>) -> Self {
        Self { oscillators }
    }

    pub fn sine() -> Self {
        Self::new(vec![Oscillator::new(Waveform::Sine)])
    }

    pub fn saw() -> Self {
        Self::new(vec![Oscillator::new(Waveform::Sawtooth)])
    }

    /// Three sawtooths spread half a hertz apart
    pub fn detuned_saws() -> Self {
        Self::new(
            (0..3)
                .map(|i| Oscillator::new(Waveform::Sawtooth).with_detune((i as f64 - 1.0) * 0.5))
                .collect(),
        )
    }

    pub fn oscillators(&self) -> &[Oscillator] {
        &self.oscillators
    }

    /// Frequency of each oscillator when playing `frequency`
    pub fn frequencies(&self, frequency: f64) -> Vec<f64> {
        self.oscillators.iter().map(|o| frequency + o.detune).collect()
    }
}

/// Attack/decay/sustain gain shape. Release is immediate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    /// Seconds to ramp from silence to full volume
    pub attack: f64,
    /// Seconds to ramp from full volume to the sustain level
    pub decay: f64,
    /// Sustain level as a fraction of the note volume
    pub sustain: f64,
}

impl Envelope {
    /// Full volume immediately, held until release
    pub fn gate() -> Self {
        Self {
            attack: 0.0,
            decay: 0.0,
            sustain: 1.0,
        }
    }

    /// Instant attack fading to silence over five seconds
    pub fn fade() -> Self {
        Self {
            attack: 0.0,
            decay: 5.0,
            sustain: 0.0,
        }
    }

    /// Short attack settling at 80% volume
    pub fn bounce() -> Self {
        Self {
            attack: 0.02,
            decay: 0.08,
            sustain: 0.8,
        }
    }

    /// Gain `seconds` after note-on for a note played at `volume`
    pub fn gain_at(&self, volume: f64, seconds: f64) -> f64 {
        if seconds < self.attack {
            return volume * seconds / self.attack;
        }
        let into_decay = seconds - self.attack;
        if into_decay < self.decay {
            let progress = into_decay / self.decay;
            return volume * (1.0 - progress * (1.0 - self.sustain));
        }
        volume * self.sustain
    }
}

/// A voice described by an envelope and an oscillator bank
#[derive(Debug, Clone)]
pub struct SynthVoice {
    envelope: Envelope,
    bank: OscillatorBank,
    volume: f64,
    frequencies: Vec<f64>,
    playing: bool,
}

impl SynthVoice {
    pub fn new(envelope: Envelope, bank: OscillatorBank) -> Self {
        Self {
            envelope,
            bank,
            volume: 0.0,
            frequencies: Vec::new(),
            playing: false,
        }
    }

    /// Three detuned saws with a bouncy envelope
    pub fn bounce_synth() -> Self {
        Self::new(Envelope::bounce(), OscillatorBank::detuned_saws())
    }

    /// A single sine fading out
    pub fn sine_fade() -> Self {
        Self::new(Envelope::fade(), OscillatorBank::sine())
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Current oscillator frequencies
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Gain `seconds` after the current note started, zero when released
    pub fn gain_at(&self, seconds: f64) -> f64 {
        if self.playing {
            self.envelope.gain_at(self.volume, seconds)
        } else {
            0.0
        }
    }
}

impl Voice for SynthVoice {
    fn note_on(&mut self, frequency: f64, volume: f64) {
        self.playing = true;
        self.volume = volume;
        self.frequencies = self.bank.frequencies(frequency);
    }

    fn note_off(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

/// Fixed-polyphony instrument that hands each handle its own voice.
///
/// When every voice is busy, new notes are dropped with a warning.
#[derive(Debug, Clone)]
pub struct VoiceManager<V: Voice> {
    voices: Vec<V>,
    busy: Vec<bool>,
    handles: HashMap<String, usize>,
}

impl<V: Voice> VoiceManager<V> {
    pub fn new(voices: Vec<V>) -> Self {
        let busy = vec![false; voices.len()];
        Self {
            voices,
            busy,
            handles: HashMap::new(),
        }
    }

    /// Create `polyphony` voices from a factory
    pub fn with_polyphony(polyphony: usize, factory: impl Fn() -> V) -> Self {
        Self::new((0..polyphony).map(|_| factory()).collect())
    }

    pub fn polyphony(&self) -> usize {
        self.voices.len()
    }

    /// Which voices are currently claimed
    pub fn busy(&self) -> &[bool] {
        &self.busy
    }

    pub fn has_handle(&self, handle: &str) -> bool {
        self.handles.contains_key(handle)
    }

    pub fn voices(&self) -> &[V] {
        &self.voices
    }
}

impl<V: Voice> Instrument for VoiceManager<V> {
    fn note_on(&mut self, handle: &str, frequency: f64, volume: f64) {
        match self.busy.iter().position(|busy| !busy) {
            Some(i) => {
                debug!(handle, voice = i, frequency, "Voice started");
                self.voices[i].note_on(frequency, volume);
                self.busy[i] = true;
                self.handles.insert(handle.to_string(), i);
            }
            None => warn!(handle, "No voices available to play note"),
        }
    }

    fn note_off(&mut self, handle: &str) {
        match self.handles.remove(handle) {
            Some(i) => {
                self.voices[i].note_off();
                self.busy[i] = false;
            }
            None => warn!(handle, "Note off on a handle that does not exist"),
        }
    }

    fn all_off(&mut self) {
        for (voice, busy) in self.voices.iter_mut().zip(self.busy.iter_mut()) {
            voice.note_off();
            *busy = false;
        }
        self.handles.clear();
    }
}
