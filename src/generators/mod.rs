// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Generative engines for melody, harmony and arpeggios.
//!
//! Suggesters produce [`Outcome`]s and keep them in a [`History`]. Every
//! suggestion after the history's accept index is pending: a plain
//! `suggest` replaces the pending suggestions, `suggest(true)` adds to
//! them, and `accept` makes them permanent.

pub mod arpeggio;
pub mod chord;
pub mod melody;
pub mod patterns;

pub use arpeggio::{ArpeggioPattern, Arpeggiator, PatternVoice, Step};
pub use chord::BasicChordSuggester;
pub use melody::{BasicMelodyBarSuggester, BasicNoteSuggester, BasicRhythmSuggester, MelodicBar};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};

/// A candidate value and how likely it is
#[derive(Debug, Clone, PartialEq)]
pub struct Guess<T> {
    pub value: T,
    pub likelihood: f64,
}

impl<T> Guess<T> {
    pub fn new(value: T, likelihood: f64) -> Self {
        Self { value, likelihood }
    }
}

/// A weighted set of guesses. Likelihoods need not sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct Guesses<T> {
    guesses: Vec<Guess<T>>,
    total_prob: f64,
    most_likely: Option<usize>,
}

impl<T: Clone> Guesses<T> {
    pub fn new(guesses: Vec<Guess<T>>) -> Self {
        let mut total_prob = 0.0;
        let mut most_likely: Option<usize> = None;
        for (i, guess) in guesses.iter().enumerate() {
            total_prob += guess.likelihood;
            if most_likely.map_or(true, |m| guess.likelihood > guesses[m].likelihood) {
                most_likely = Some(i);
            }
        }
        Self {
            guesses,
            total_prob,
            most_likely,
        }
    }

    pub fn guesses(&self) -> &[Guess<T>] {
        &self.guesses
    }

    /// Sum of every likelihood
    pub fn total_prob(&self) -> f64 {
        self.total_prob
    }

    /// The first guess with the highest likelihood
    pub fn most_likely(&self) -> Option<&Guess<T>> {
        self.most_likely.map(|i| &self.guesses[i])
    }

    /// Pick a guess by weight using `random_value` in `[0, 1)`.
    ///
    /// Values of one or more run off the end of the guesses and fail.
    pub fn sample(&self, random_value: f64) -> Result<Outcome<T>> {
        let mut remaining = random_value * self.total_prob;
        for guess in &self.guesses {
            if remaining < guess.likelihood {
                return Ok(Outcome::new(guess.value.clone(), guess.likelihood / self.total_prob));
            }
            remaining -= guess.likelihood;
        }
        Err(Error::SampleOutOfRange(random_value))
    }

    /// Pick a guess by weight using `rng`
    pub fn sample_with(&self, rng: &mut impl Rng) -> Result<Outcome<T>> {
        self.sample(rng.gen::<f64>())
    }
}

/// A realized choice and the probability it had of being chosen
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub probability: f64,
}

impl<T> Outcome<T> {
    pub fn new(value: T, probability: f64) -> Self {
        Self { value, probability }
    }

    /// An outcome that was the only possibility
    pub fn fixed(value: T) -> Self {
        Self::new(value, 1.0)
    }
}

/// Suggested outcomes, split into accepted and pending
#[derive(Debug, Clone, PartialEq)]
pub struct History<T> {
    entries: Vec<Outcome<T>>,
    accept_index: usize,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            accept_index: 0,
        }
    }
}

impl<T> History<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Outcome<T>] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [Outcome<T>] {
        &mut self.entries
    }

    /// Every value, accepted first
    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.entries.iter().map(|o| &o.value)
    }

    pub fn accepted(&self) -> &[Outcome<T>] {
        &self.entries[..self.accept_index]
    }

    pub fn pending(&self) -> &[Outcome<T>] {
        &self.entries[self.accept_index..]
    }

    pub fn accept_index(&self) -> usize {
        self.accept_index
    }

    /// Move the accept boundary, clamped to the history length
    pub fn set_accept_index(&mut self, index: usize) {
        self.accept_index = index.min(self.entries.len());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&Outcome<T>> {
        self.entries.last()
    }

    /// Append an outcome without accepting it
    pub fn push(&mut self, outcome: Outcome<T>) -> &Outcome<T> {
        self.entries.push(outcome);
        &self.entries[self.entries.len() - 1]
    }

    /// Drop every pending outcome
    pub fn clear_suggestion(&mut self) {
        self.entries.truncate(self.accept_index);
    }

    /// Make every pending outcome permanent
    pub fn accept(&mut self) {
        self.accept_index = self.entries.len();
    }

    /// Forget everything, accepted or not
    pub fn clear(&mut self) {
        self.entries.clear();
        self.accept_index = 0;
    }
}

/// Something that proposes values and remembers what it proposed
pub trait Suggester {
    type Value;

    fn history(&self) -> &History<Self::Value>;

    fn history_mut(&mut self) -> &mut History<Self::Value>;

    /// Produce one new outcome
    fn suggest_internal(&mut self) -> Outcome<Self::Value>;

    /// Suggest a new outcome. Unless `append` is set, pending suggestions
    /// are replaced.
    fn suggest(&mut self, append: bool) -> &Outcome<Self::Value> {
        if !append {
            self.history_mut().clear_suggestion();
        }
        let outcome = self.suggest_internal();
        self.history_mut().push(outcome)
    }

    fn clear_suggestion(&mut self) {
        self.history_mut().clear_suggestion();
    }

    fn accept(&mut self) {
        self.history_mut().accept();
    }
}

/// Seeded or entropy-backed generator
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
