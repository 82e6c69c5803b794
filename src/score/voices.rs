// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Splitting notes into non-overlapping voices and measures.
//!
//! Notes sharing exactly the same start and end are kept together as one
//! cluster. Clusters are assigned greedily, in order of first appearance,
//! to the first voice they do not overlap.

use std::collections::HashMap;
use std::fmt;

use crate::sequencer::{NoteGroup, TimedNote};

/// Beats are divided into this to get a notation duration (4 = quarter)
const DURATION_FACTOR: f64 = 4.0;

/// Notation duration code for `beats`: `1` whole, `2` half, `4` quarter...
pub fn duration_code(beats: f64) -> String {
    format!("{}", (DURATION_FACTOR / beats).round() as i64)
}

/// A note cluster or a rest placed in a measure
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreObject {
    Rest(f64),
    /// Notes sharing a start and end
    Notes(Vec<TimedNote>),
}

impl ScoreObject {
    /// Length in beats
    pub fn duration(&self) -> f64 {
        match self {
            ScoreObject::Rest(beats) => *beats,
            ScoreObject::Notes(notes) => notes.first().map_or(0.0, TimedNote::duration),
        }
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, ScoreObject::Rest(_))
    }

    /// The cluster's notes, empty for a rest
    pub fn notes(&self) -> &[TimedNote] {
        match self {
            ScoreObject::Rest(_) => &[],
            ScoreObject::Notes(notes) => notes,
        }
    }
}

impl fmt::Display for ScoreObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = duration_code(self.duration());
        match self {
            ScoreObject::Rest(_) => write!(f, "[r {}]", code),
            ScoreObject::Notes(notes) => {
                let names: Vec<String> = notes.iter().map(|n| n.note.vexflow_name()).collect();
                write!(f, "[{} {}]", names.join(","), code)
            }
        }
    }
}

/// One voice within one measure
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BarVoice {
    pub objects: Vec<ScoreObject>,
}

impl fmt::Display for BarVoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for object in &self.objects {
            write!(f, "{}", object)?;
        }
        Ok(())
    }
}

/// Non-overlapping note clusters
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    /// One subgroup per cluster
    notes: NoteGroup,
    intervals: Vec<(f64, f64)>,
}

impl Voice {
    fn new(cluster: Vec<TimedNote>, interval: (f64, f64)) -> Self {
        Self {
            notes: NoteGroup::from_groups([NoteGroup::from_events(cluster)]),
            intervals: vec![interval],
        }
    }

    fn overlaps(&self, (start1, end1): (f64, f64)) -> bool {
        self.intervals
            .iter()
            .any(|&(start2, end2)| end1 > start2 && start1 < end2)
    }

    fn push(&mut self, cluster: Vec<TimedNote>, interval: (f64, f64)) {
        self.notes.add_group(NoteGroup::from_events(cluster));
        self.intervals.push(interval);
    }

    /// Number of notes in the voice
    pub fn len(&self) -> usize {
        self.notes.length()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn notes(&self) -> &NoteGroup {
        &self.notes
    }

    /// `(start, end)` of each cluster, in assignment order
    pub fn intervals(&self) -> &[(f64, f64)] {
        &self.intervals
    }

    /// Clusters sorted by start
    fn sorted_clusters(&self) -> Vec<&[TimedNote]> {
        let mut clusters: Vec<&[TimedNote]> = self
            .notes
            .subgroups()
            .iter()
            .map(|g| g.events())
            .filter(|events| !events.is_empty())
            .collect();
        clusters.sort_by(|a, b| a[0].start.total_cmp(&b[0].start));
        clusters
    }
}

/// A set of voices built from a note group
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Voices {
    voices: Vec<Voice>,
}

impl Voices {
    pub fn from_note_group(group: &NoteGroup) -> Self {
        let mut clusters: Vec<Vec<TimedNote>> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for timed_note in group.iter() {
            let slot = *index.entry(timed_note.time_key()).or_insert_with(|| {
                clusters.push(Vec::new());
                clusters.len() - 1
            });
            clusters[slot].push(timed_note);
        }

        let mut voices: Vec<Voice> = Vec::new();
        for cluster in clusters {
            let (start, end) = (cluster[0].start, cluster[0].end);
            match voices.iter_mut().find(|v| !v.overlaps((start, end))) {
                Some(voice) => voice.push(cluster, (start, end)),
                None => voices.push(Voice::new(cluster, (start, end))),
            }
        }
        Self { voices }
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Lay every voice out in measures of `num_beats`, filling gaps with
    /// rests. The result is indexed by measure, then voice.
    ///
    /// Notes are never split across a bar line; a note starting in a later
    /// measure opens a new one.
    pub fn to_proper_voices(&self, num_beats: f64) -> Vec<Vec<BarVoice>> {
        let mut measures: Vec<Vec<BarVoice>> = Vec::new();
        let mut add_to_measure = |measure: usize, objects: Vec<ScoreObject>| {
            while measures.len() <= measure {
                measures.push(Vec::new());
            }
            measures[measure].push(BarVoice { objects });
        };

        for voice in &self.voices {
            let mut measure_end = num_beats;
            let mut objects = Vec::new();
            let mut current_beat = 0.0;
            let mut current_measure = 0;

            for cluster in voice.sorted_clusters() {
                let (start, end) = (cluster[0].start, cluster[0].end);
                if start > current_beat && start >= measure_end {
                    objects.push(ScoreObject::Rest(measure_end - current_beat));
                    add_to_measure(current_measure, std::mem::take(&mut objects));
                    current_beat = measure_end;
                    current_measure += 1;
                    measure_end += num_beats;
                }
                if start > current_beat {
                    objects.push(ScoreObject::Rest(start - current_beat));
                }
                if start >= measure_end {
                    add_to_measure(current_measure, std::mem::take(&mut objects));
                    current_measure += 1;
                    measure_end += num_beats;
                }
                objects.push(ScoreObject::Notes(cluster.to_vec()));
                current_beat = end;
            }
            if measure_end > current_beat {
                objects.push(ScoreObject::Rest(measure_end - current_beat));
            }
            if !objects.is_empty() {
                add_to_measure(current_measure, objects);
            }
        }
        measures
    }

    /// [`to_proper_voices`](Self::to_proper_voices) rendered as strings
    pub fn to_proper_strings(&self, num_beats: f64) -> Vec<Vec<String>> {
        self.to_proper_voices(num_beats)
            .iter()
            .map(|measure| measure.iter().map(|v| v.to_string()).collect())
            .collect()
    }
}
