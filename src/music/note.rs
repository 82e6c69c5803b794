// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Notes and intervals in two-three space.
//!
//! Every pitch is stored as a pair of integer exponents `(s2, s3)` such that
//! its frequency relative to A4 (440Hz, `s2 = 2, s3 = 1`) is
//! `2^(s2 - 2) * 3^(s3 - 1)`. Spelling is preserved: `C#` and `Db` are
//! different points in the lattice. Octave numbers increment going from
//! `G` to `A`.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Two-component of A4.
const A4_S2: i32 = 2;
/// Three-component of A4.
const A4_S3: i32 = 1;
/// Frequency of A4 in hertz.
const A4_FREQ: f64 = 440.0;

/// Returns the representative of `i mod m` in the symmetric range
/// `(-m/2, m/2]`.
pub fn symmod(i: i32, m: i32) -> i32 {
    let modulo = i.rem_euclid(m);
    if modulo * 2 > m {
        modulo - m
    } else {
        modulo
    }
}

/// Renders an accidental count as sharps (positive) or flats (negative).
pub fn accidental_string(accidentals: i32) -> String {
    if accidentals < 0 {
        "b".repeat(accidentals.unsigned_abs() as usize)
    } else {
        "#".repeat(accidentals as usize)
    }
}

/// Diatonic note letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Letter {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl Letter {
    /// All letters in alphabetical order
    pub const ALL: [Letter; 7] = [
        Letter::A,
        Letter::B,
        Letter::C,
        Letter::D,
        Letter::E,
        Letter::F,
        Letter::G,
    ];

    /// Position of the letter counted from `A` (0-6)
    pub fn index(self) -> i32 {
        match self {
            Letter::A => 0,
            Letter::B => 1,
            Letter::C => 2,
            Letter::D => 3,
            Letter::E => 4,
            Letter::F => 5,
            Letter::G => 6,
        }
    }

    /// Letter at the given position, wrapping every 7 steps
    pub fn from_index(index: i32) -> Self {
        Letter::ALL[index.rem_euclid(7) as usize]
    }

    /// Parse a letter, accepting either case
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(Letter::A),
            'B' => Some(Letter::B),
            'C' => Some(Letter::C),
            'D' => Some(Letter::D),
            'E' => Some(Letter::E),
            'F' => Some(Letter::F),
            'G' => Some(Letter::G),
            _ => None,
        }
    }

    /// Upper-case character for this letter
    pub fn as_char(self) -> char {
        (b'A' + self.index() as u8) as char
    }

    /// Offset from `D`, the origin of the lattice (-3..=3)
    fn lattice_offset(self) -> i32 {
        self.index() - 3
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// An immutable spelled pitch.
///
/// Transformations (`jump`, `octave_shift`, `base_shift`,
/// `accidental_shift`) always return a new note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note {
    letter: Letter,
    accidentals: i32,
    octave: i32,
    s2: i32,
    s3: i32,
}

impl Note {
    /// Create a note from its spelling
    pub fn new(letter: Letter, accidentals: i32, octave: i32) -> Self {
        let offset = letter.lattice_offset();
        let s2 = symmod(-3 * offset, 11) - 11 * accidentals + octave;
        let s3 = symmod(2 * offset, 7) + 7 * accidentals;
        Self {
            letter,
            accidentals,
            octave,
            s2,
            s3,
        }
    }

    /// Parse a note name such as `"C4"`, `"F##-2"` or `"bb3"`.
    pub fn parse(name: &str) -> Result<Self> {
        let mut chars = name.char_indices();
        let (_, first) = chars
            .next()
            .ok_or_else(|| Error::InvalidNote(format!("{:?} has no note letter", name)))?;
        let letter = Letter::from_char(first)
            .ok_or_else(|| Error::InvalidNote(format!("{:?} has an invalid letter", name)))?;

        let mut accidentals = 0;
        let mut octave_start = name.len();
        for (i, c) in chars {
            match c {
                '#' => accidentals += 1,
                'b' => accidentals -= 1,
                _ => {
                    octave_start = i;
                    break;
                }
            }
        }

        let octave = name[octave_start..]
            .parse::<i32>()
            .map_err(|_| Error::InvalidNote(format!("{:?} needs a numeric octave", name)))?;

        Ok(Self::new(letter, accidentals, octave))
    }

    /// Canonical note for a point in two-three space.
    ///
    /// The letter comes from `symmod(-3 * s3, 7)` and the accidentals from
    /// rounding `s3 / 7`; the octave absorbs whatever remains of `s2`.
    pub fn from_two_three(s2: i32, s3: i32) -> Self {
        let offset = symmod(-3 * s3, 7);
        let letter = Letter::from_index(offset + 3);
        // Same as rounding s3 / 7 since s3 is never a half-multiple of 7.
        let accidentals = (s3 + 3).div_euclid(7);
        let base_s2 = symmod(-3 * offset, 11) - 11 * accidentals;
        Self::new(letter, accidentals, s2 - base_s2)
    }

    pub fn letter(&self) -> Letter {
        self.letter
    }

    pub fn accidentals(&self) -> i32 {
        self.accidentals
    }

    pub fn octave(&self) -> i32 {
        self.octave
    }

    /// Exponent of 2
    pub fn s2(&self) -> i32 {
        self.s2
    }

    /// Exponent of 3
    pub fn s3(&self) -> i32 {
        self.s3
    }

    /// Position in two-three space
    pub fn two_three(&self) -> (i32, i32) {
        (self.s2, self.s3)
    }

    /// Name without the octave, e.g. `"Bb"`
    pub fn pitch_name(&self) -> String {
        format!("{}{}", self.letter, accidental_string(self.accidentals))
    }

    /// Equal-tempered frequency where a fifth spans `e` of the `f`
    /// semitones in an octave.
    pub fn well_tempered_frequency_with(&self, e: f64, f: f64) -> f64 {
        let three = 2f64.powf(e / f);
        A4_FREQ * 2f64.powi(self.s2 - A4_S2) * three.powi(self.s3 - A4_S3)
    }

    /// Twelve-tone equal-tempered frequency (like on a piano)
    pub fn well_tempered_frequency(&self) -> f64 {
        self.well_tempered_frequency_with(19.0, 12.0)
    }

    /// Frequency using only exact powers of 2 and 3, centered on A 440Hz
    pub fn two_three_frequency(&self) -> f64 {
        A4_FREQ * 2f64.powi(self.s2 - A4_S2) * 3f64.powi(self.s3 - A4_S3)
    }

    /// Jump by an interval
    pub fn jump(&self, interval: Interval) -> Self {
        Self::from_two_three(self.s2 + interval.s2, self.s3 + interval.s3)
    }

    /// Jump by an interval in the reverse direction
    pub fn jump_back(&self, interval: Interval) -> Self {
        Self::from_two_three(self.s2 - interval.s2, self.s3 - interval.s3)
    }

    /// Jump by a number of octaves
    pub fn octave_shift(&self, octaves: i32) -> Self {
        Self::from_two_three(self.s2 + octaves, self.s3)
    }

    /// Move the letter by `steps` diatonic positions, keeping the
    /// accidentals. Passing from `G` to `A` increments the octave.
    pub fn base_shift(&self, steps: i32) -> Self {
        let offset = self.letter.index() + steps;
        Self::new(
            Letter::from_index(offset),
            self.accidentals,
            self.octave + offset.div_euclid(7),
        )
    }

    /// Add `steps` accidentals. When `max_shift` is given and the result
    /// would carry more than that many sharps or flats, the note is
    /// returned unchanged.
    pub fn accidental_shift(&self, steps: i32, max_shift: Option<i32>) -> Self {
        let accidentals = self.accidentals + steps;
        match max_shift {
            Some(max) if accidentals.abs() > max => *self,
            _ => Self::new(self.letter, accidentals, self.octave),
        }
    }

    /// Note name in VexFlow's `letter/octave` notation, where octaves
    /// turn over at `C`.
    pub fn vexflow_name(&self) -> String {
        let octave_delta = if self.letter >= Letter::C { 1 } else { 0 };
        format!(
            "{}{}/{}",
            self.letter.as_char().to_ascii_lowercase(),
            accidental_string(self.accidentals),
            self.octave + octave_delta
        )
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch_name(), self.octave)
    }
}

impl FromStr for Note {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Note::parse(s)
    }
}

/// The distance between two notes in two-three space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    s2: i32,
    s3: i32,
}

impl Interval {
    /// Interval from raw exponents
    pub fn from_two_three(s2: i32, s3: i32) -> Self {
        Self { s2, s3 }
    }

    /// Interval that takes `from` to `to`
    pub fn between(to: &Note, from: &Note) -> Self {
        Self {
            s2: to.s2 - from.s2,
            s3: to.s3 - from.s3,
        }
    }

    /// Interval from `D0` to the spelled note
    fn above_d0(letter: Letter, accidentals: i32, octave: i32) -> Self {
        let note = Note::new(letter, accidentals, octave);
        Self {
            s2: note.s2,
            s3: note.s3,
        }
    }

    pub fn s2(&self) -> i32 {
        self.s2
    }

    pub fn s3(&self) -> i32 {
        self.s3
    }

    /// Compose two intervals
    pub fn jump(&self, other: Interval) -> Self {
        Self {
            s2: self.s2 + other.s2,
            s3: self.s3 + other.s3,
        }
    }

    /// Look up an interval by its short name (`"P5"`, `"m3"`, `"M7"`, ...)
    pub fn named(name: &str) -> Option<Self> {
        match name {
            "P1" => Some(Self::p1()),
            "a1" => Some(Self::a1()),
            "m2" => Some(Self::m2()),
            "M2" => Some(Self::maj2()),
            "m3" => Some(Self::m3()),
            "M3" => Some(Self::maj3()),
            "P4" => Some(Self::p4()),
            "d5" => Some(Self::d5()),
            "P5" => Some(Self::p5()),
            "a5" => Some(Self::a5()),
            "m6" => Some(Self::m6()),
            "M6" => Some(Self::maj6()),
            "d7" => Some(Self::d7()),
            "m7" => Some(Self::m7()),
            "M7" => Some(Self::maj7()),
            "a7" => Some(Self::a7()),
            "P8" => Some(Self::p8()),
            _ => None,
        }
    }

    /// Perfect unison
    pub fn p1() -> Self {
        Self::above_d0(Letter::D, 0, 0)
    }

    /// Augmented unison
    pub fn a1() -> Self {
        Self::above_d0(Letter::D, 1, 0)
    }

    /// Minor second
    pub fn m2() -> Self {
        Self::above_d0(Letter::E, -1, 0)
    }

    /// Major second
    pub fn maj2() -> Self {
        Self::above_d0(Letter::E, 0, 0)
    }

    /// Minor third
    pub fn m3() -> Self {
        Self::above_d0(Letter::F, 0, 0)
    }

    /// Major third
    pub fn maj3() -> Self {
        Self::above_d0(Letter::F, 1, 0)
    }

    /// Perfect fourth
    pub fn p4() -> Self {
        Self::above_d0(Letter::G, 0, 0)
    }

    /// Diminished fifth
    pub fn d5() -> Self {
        Self::above_d0(Letter::A, -1, 1)
    }

    /// Perfect fifth
    pub fn p5() -> Self {
        Self::above_d0(Letter::A, 0, 1)
    }

    /// Augmented fifth
    pub fn a5() -> Self {
        Self::above_d0(Letter::A, 1, 1)
    }

    /// Minor sixth
    pub fn m6() -> Self {
        Self::above_d0(Letter::B, -1, 1)
    }

    /// Major sixth
    pub fn maj6() -> Self {
        Self::above_d0(Letter::B, 0, 1)
    }

    /// Diminished seventh
    pub fn d7() -> Self {
        Self::above_d0(Letter::C, -1, 1)
    }

    /// Minor seventh
    pub fn m7() -> Self {
        Self::above_d0(Letter::C, 0, 1)
    }

    /// Major seventh
    pub fn maj7() -> Self {
        Self::above_d0(Letter::C, 1, 1)
    }

    /// Augmented seventh
    pub fn a7() -> Self {
        Self::above_d0(Letter::C, 2, 1)
    }

    /// Perfect octave
    pub fn p8() -> Self {
        Self::above_d0(Letter::D, 0, 1)
    }
}
