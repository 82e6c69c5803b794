// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Western chord vocabulary.
//!
//! Named chords, the common scales, and the diatonic chord sets of major
//! and minor keys used to drive the suggesters.

use super::chord::{ChordDictionary, ChordTemplate, ContextualChordTemplate, NamedChordTemplate};
use super::note::Interval;

fn named(intervals: Vec<Interval>, suffix: &str) -> NamedChordTemplate {
    NamedChordTemplate::new(ChordTemplate::new(intervals), suffix)
}

pub fn major() -> NamedChordTemplate {
    named(vec![Interval::p1(), Interval::maj3(), Interval::p5()], "")
}

pub fn minor() -> NamedChordTemplate {
    named(vec![Interval::p1(), Interval::m3(), Interval::p5()], "m")
}

pub fn dominant7() -> NamedChordTemplate {
    named(
        vec![Interval::p1(), Interval::maj3(), Interval::p5(), Interval::m7()],
        "7",
    )
}

pub fn minor7() -> NamedChordTemplate {
    named(
        vec![Interval::p1(), Interval::m3(), Interval::p5(), Interval::m7()],
        "m7",
    )
}

pub fn major7() -> NamedChordTemplate {
    named(
        vec![Interval::p1(), Interval::maj3(), Interval::p5(), Interval::maj7()],
        "maj7",
    )
}

pub fn diminished() -> NamedChordTemplate {
    named(vec![Interval::p1(), Interval::m3(), Interval::d5()], "dim")
}

pub fn diminished7() -> NamedChordTemplate {
    named(
        vec![Interval::p1(), Interval::m3(), Interval::d5(), Interval::d7()],
        "dim7",
    )
}

pub fn half_diminished7() -> NamedChordTemplate {
    named(
        vec![Interval::p1(), Interval::m3(), Interval::d5(), Interval::m7()],
        "m7b5",
    )
}

pub fn augmented() -> NamedChordTemplate {
    named(vec![Interval::p1(), Interval::maj3(), Interval::a5()], "aug")
}

/// Every named chord in the vocabulary
pub fn named_chords() -> Vec<NamedChordTemplate> {
    vec![
        major(),
        minor(),
        dominant7(),
        minor7(),
        major7(),
        diminished(),
        diminished7(),
        half_diminished7(),
        augmented(),
    ]
}

pub fn major_scale() -> ChordTemplate {
    ChordTemplate::new(vec![
        Interval::p1(),
        Interval::maj2(),
        Interval::maj3(),
        Interval::p4(),
        Interval::p5(),
        Interval::maj6(),
        Interval::maj7(),
    ])
}

/// Natural minor scale
pub fn minor_scale() -> ChordTemplate {
    ChordTemplate::new(vec![
        Interval::p1(),
        Interval::maj2(),
        Interval::m3(),
        Interval::p4(),
        Interval::p5(),
        Interval::m6(),
        Interval::m7(),
    ])
}

pub fn harmonic_minor_scale() -> ChordTemplate {
    ChordTemplate::new(vec![
        Interval::p1(),
        Interval::maj2(),
        Interval::m3(),
        Interval::p4(),
        Interval::p5(),
        Interval::m6(),
        Interval::maj7(),
    ])
}

/// Diatonic chords of a major key: I, IV, V, ii, vi and iii with their
/// seventh-chord variants.
pub fn major_context() -> Vec<ContextualChordTemplate> {
    let scale = major_scale();
    let degree = |interval, chord| ContextualChordTemplate::new(interval, chord, scale.clone());
    vec![
        degree(Interval::p1(), major()),
        degree(Interval::p1(), major7()),
        degree(Interval::p4(), major()),
        degree(Interval::p4(), major7()),
        degree(Interval::p5(), major()),
        degree(Interval::p5(), dominant7()),
        degree(Interval::maj2(), minor()),
        degree(Interval::maj2(), minor7()),
        degree(Interval::maj6(), minor()),
        degree(Interval::maj6(), minor7()),
        degree(Interval::maj3(), minor()),
        degree(Interval::maj3(), minor7()),
    ]
}

/// Diatonic chords of a minor key. The dominant borrows the harmonic minor
/// scale.
pub fn minor_context() -> Vec<ContextualChordTemplate> {
    let scale = minor_scale();
    let harmonic = harmonic_minor_scale();
    let degree = |interval, chord| ContextualChordTemplate::new(interval, chord, scale.clone());
    vec![
        degree(Interval::p1(), minor()),
        degree(Interval::p1(), minor7()),
        degree(Interval::p4(), minor()),
        degree(Interval::p4(), minor7()),
        ContextualChordTemplate::new(Interval::p5(), major(), harmonic.clone()),
        ContextualChordTemplate::new(Interval::p5(), dominant7(), harmonic),
        degree(Interval::maj2(), diminished()),
        degree(Interval::maj2(), half_diminished7()),
        degree(Interval::m6(), major()),
        degree(Interval::m6(), major7()),
        degree(Interval::m3(), major()),
        degree(Interval::m3(), major7()),
    ]
}

/// Major key chords followed by the minor key chords over the same root
pub fn extended_context() -> Vec<ContextualChordTemplate> {
    let mut context = major_context();
    context.extend(minor_context());
    context
}

/// One-bar rhythms in beats
pub fn duration_templates() -> Vec<Vec<f64>> {
    vec![
        vec![1.0, 1.0, 1.0, 1.0],
        vec![1.0, 0.5, 0.5, 1.0, 1.0],
        vec![1.0, 1.0, 1.0, 0.5, 0.5],
        vec![0.5, 0.5, 0.5, 0.5, 1.0, 1.0],
        vec![1.0, 1.0, 0.5, 0.5, 0.5, 0.5],
    ]
}

/// Dictionary of every named chord, keyed by suffix
pub fn western_chord_dictionary() -> ChordDictionary {
    ChordDictionary::from_templates(named_chords())
}
