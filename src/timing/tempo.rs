// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Conversion between beats and wall-clock time.

use std::time::Duration;

/// Beat/millisecond conversion at a fixed tempo
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    /// Tempo in beats per minute
    pub tempo: f64,
}

impl Timing {
    pub fn new(tempo: f64) -> Self {
        Self { tempo }
    }

    /// Length of `beats` in milliseconds. One beat is a quarter note.
    pub fn get_duration(&self, beats: f64) -> f64 {
        beats * 60_000.0 / self.tempo
    }

    /// Number of beats elapsed in `millis` milliseconds
    pub fn get_beats(&self, millis: f64) -> f64 {
        millis * self.tempo / 60_000.0
    }

    /// Length of `beats` as a [`Duration`], clamped at zero
    pub fn duration_of(&self, beats: f64) -> Duration {
        Duration::from_secs_f64(self.get_duration(beats).max(0.0) / 1000.0)
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::new(120.0)
    }
}
