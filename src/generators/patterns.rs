// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Built-in arpeggio patterns.

use super::arpeggio::{ArpeggioPattern, PatternVoice, Step};

use Step::{Hold as H, Off, On};

/// Names accepted by [`by_name`]
pub const NAMES: [&str; 5] = ["waterfall", "persistence", "klez", "twinkle", "rapid"];

fn voice(scale_index: i32, octave_shift: i32, steps: &[Step]) -> PatternVoice {
    PatternVoice::new(scale_index, octave_shift, steps.to_vec())
}

/// Root held under a cascade of upper tones
pub fn waterfall() -> ArpeggioPattern {
    ArpeggioPattern::new(
        "waterfall",
        vec![
            voice(0, 0, &[On, H, H, H, H, H, H, H]),
            voice(1, 0, &[Off, On, Off, On, Off, Off, Off, On]),
            voice(2, 0, &[Off, Off, On, Off, On, Off, On, Off]),
            voice(3, 0, &[Off, Off, Off, Off, Off, On, Off, Off]),
        ],
    )
}

/// Every tone pulsing together
pub fn persistence() -> ArpeggioPattern {
    let pulse = [On, Off, On, Off, On, Off, On, Off];
    ArpeggioPattern::new(
        "persistence",
        vec![
            voice(0, -1, &pulse),
            voice(0, 0, &pulse),
            voice(1, 0, &pulse),
            voice(2, 0, &pulse),
            voice(3, 0, &pulse),
        ],
    )
}

/// Bass on the beat, chord on the offbeat
pub fn klez() -> ArpeggioPattern {
    let bass = [On, H, Off, Off, On, H, Off, Off, On, H, Off, Off, On, H, Off, Off];
    let chord = [Off, Off, On, On, Off, Off, On, H, Off, Off, On, H, Off, Off, On, H];
    ArpeggioPattern::new(
        "klez",
        vec![
            voice(0, -1, &bass),
            voice(0, 0, &chord),
            voice(1, 0, &chord),
            voice(2, 0, &chord),
            voice(3, 0, &chord),
        ],
    )
}

/// Held octaves with alternating inner tones
pub fn twinkle() -> ArpeggioPattern {
    ArpeggioPattern::new(
        "twinkle",
        vec![
            voice(0, -1, &[On, H, H, H, H, H, H, H]),
            voice(2, -1, &[On, Off, On, Off, On, Off, On, Off]),
            voice(1, 0, &[Off, On, Off, On, Off, On, Off, On]),
            voice(0, 1, &[On, H, H, H, H, H, H, H]),
        ],
    )
}

/// Busy repeated tones over a two-beat bass
pub fn rapid() -> ArpeggioPattern {
    let busy = [On, On, Off, On, On, On, Off, On];
    let alternate = [On, Off, On, Off, On, Off, On, Off];
    ArpeggioPattern::new(
        "rapid",
        vec![
            voice(0, -1, &[On, H, H, H, On, H, H, H]),
            voice(0, 0, &busy),
            voice(1, 0, &alternate),
            voice(2, 0, &busy),
            voice(3, 0, &alternate),
        ],
    )
}

/// Look up a built-in pattern, ignoring case
pub fn by_name(name: &str) -> Option<ArpeggioPattern> {
    match name.to_ascii_lowercase().as_str() {
        "waterfall" => Some(waterfall()),
        "persistence" => Some(persistence()),
        "klez" => Some(klez()),
        "twinkle" => Some(twinkle()),
        "rapid" => Some(rapid()),
        _ => None,
    }
}
