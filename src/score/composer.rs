// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Interactive composition: suggest, accept, edit and play bars.
//!
//! The [`Composer`] keeps the melody suggester's history as the score. The
//! last pending bar is the current suggestion; everything before it has
//! been accepted. After every change the playback schedule and the list of
//! [`InteractiveNote`]s are rebuilt from that history.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tracing::{debug, error};

use super::serializer::{score_serializers, SerializationDictionary};
use super::voices::{ScoreObject, Voices};
use super::Score;
use crate::error::{Error, Result};
use crate::generators::{
    ArpeggioPattern, Arpeggiator, BasicMelodyBarSuggester, MelodicBar, Outcome, Suggester,
};
use crate::instrument::Instrument;
use crate::music::{ChordDictionary, ContextualChord, Note};
use crate::sequencer::{
    driver, FunctionEvent, Group, NoteGroup, PerformanceOptions, Scheduler, TimedNote,
    DEFAULT_CALLBACK_INTERVAL_MS,
};

/// Most sharps or flats a note can be shifted to
pub const MAX_ACCIDENTALS: i32 = 2;

/// Name of the schedule layer holding the arpeggio
const ARPEGGIO_GROUP: &str = "arpeggio";
const ARPEGGIO_HANDLE: &str = "arpeggio:";
const PREVIEW_HANDLE: &str = "preview:";

/// Arpeggio accompaniment played under every bar
#[derive(Debug, Clone, PartialEq)]
pub struct ArpeggioSettings {
    pub pattern: ArpeggioPattern,
    pub beats_per_step: f64,
}

#[derive(Debug, Clone)]
pub struct ComposerSettings {
    pub chord_dictionary: ChordDictionary,
    pub arpeggio: Option<ArpeggioSettings>,
    pub beats_per_bar: f64,
    /// How melody notes are turned into instrument events
    pub performance: PerformanceOptions,
}

impl ComposerSettings {
    pub fn new(chord_dictionary: ChordDictionary) -> Self {
        Self {
            chord_dictionary,
            arpeggio: None,
            beats_per_bar: 4.0,
            performance: PerformanceOptions::default(),
        }
    }
}

/// A cluster of notes sharing a start and end, as shown in the score.
///
/// Neighbours are indices into [`Composer::interactive_notes`].
#[derive(Debug, Clone, PartialEq)]
pub struct InteractiveNote {
    pub index: usize,
    pub measure: usize,
    pub notes: NoteGroup,
    pub start: f64,
    pub end: f64,
    pub left: Option<usize>,
    pub right: Option<usize>,
    /// Part of a bar that has not been accepted yet
    pub suggested: bool,
    pub selected: bool,
}

/// Suggests, edits and performs a score one bar at a time
pub struct Composer<I: Instrument> {
    suggester: BasicMelodyBarSuggester,
    scheduler: Scheduler,
    instrument: I,
    settings: ComposerSettings,
    serializers: SerializationDictionary<Score>,
    interactive_notes: Vec<InteractiveNote>,
    selected: Option<usize>,
    playing_note: Arc<Mutex<Option<usize>>>,
    cursor: Arc<Mutex<f64>>,
}

impl<I: Instrument> Composer<I> {
    /// Start composing, optionally from a serialized score.
    ///
    /// A score that fails to load is logged and replaced with a fresh
    /// suggestion.
    pub fn new(
        suggester: BasicMelodyBarSuggester,
        mut scheduler: Scheduler,
        instrument: I,
        settings: ComposerSettings,
        serialized: Option<&str>,
    ) -> Result<Self> {
        let serializers = score_serializers(settings.chord_dictionary.clone())?;

        let cursor = Arc::new(Mutex::new(0.0));
        let cursor_handle = Arc::clone(&cursor);
        scheduler.set_beat_offset_callback(
            move |beat| {
                if let Ok(mut position) = cursor_handle.lock() {
                    *position = beat;
                }
            },
            DEFAULT_CALLBACK_INTERVAL_MS,
        );

        let mut composer = Self {
            suggester,
            scheduler,
            instrument,
            settings,
            serializers,
            interactive_notes: Vec::new(),
            selected: None,
            playing_note: Arc::new(Mutex::new(None)),
            cursor,
        };

        if let Some(serialized) = serialized {
            if let Err(e) = composer.deserialize(serialized) {
                error!(error = %e, "Failed to load score, starting a new one");
            }
        }
        if composer.suggester.history().is_empty() {
            composer.shuffle();
        } else {
            composer.rebuild_schedule(false);
        }
        Ok(composer)
    }

    pub fn suggester(&self) -> &BasicMelodyBarSuggester {
        &self.suggester
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn instrument(&self) -> &I {
        &self.instrument
    }

    pub fn instrument_mut(&mut self) -> &mut I {
        &mut self.instrument
    }

    pub fn settings(&self) -> &ComposerSettings {
        &self.settings
    }

    /// Number of bars accepted so far
    pub fn accepted_bars(&self) -> usize {
        self.suggester.history().accept_index()
    }

    /// Every bar, accepted ones first
    pub fn bars(&self) -> impl Iterator<Item = &MelodicBar> + '_ {
        self.suggester.history().values()
    }

    pub fn all_notes(&self) -> NoteGroup {
        NoteGroup::from_groups(self.bars().map(|bar| bar.notes.clone()))
    }

    pub fn all_chords(&self) -> Vec<ContextualChord> {
        self.bars().map(|bar| bar.chord.clone()).collect()
    }

    pub fn score(&self) -> Score {
        Score::from_bars(self.bars())
    }

    /// Replace the pending bar with a new suggestion and play it
    pub fn shuffle(&mut self) {
        self.suggester.suggest(false);
        self.rebuild_schedule(false);
        let offset = self.accepted_bars() as f64 * self.settings.beats_per_bar;
        self.set_beat_offset(offset);
        self.play();
    }

    /// Keep the pending bar and suggest the next one
    pub fn accept(&mut self) {
        self.suggester.accept();
        debug!(bars = self.accepted_bars(), "Accepted bar");
        self.shuffle();
    }

    /// Serialize with the newest format
    pub fn serialize(&self) -> Result<String> {
        self.serializers.serialize(&self.score(), None)
    }

    /// Replace the history with a serialized score.
    ///
    /// Notes are split into measures; each measure becomes one bar over
    /// the chord at the same position. The last bar is left pending. On
    /// error the history is unchanged.
    pub fn deserialize(&mut self, s: &str) -> Result<()> {
        let score = self.serializers.deserialize(s)?;
        let measures = Voices::from_note_group(&score.notes)
            .to_proper_voices(self.settings.beats_per_bar);

        let mut bars = Vec::with_capacity(measures.len());
        for (i, measure) in measures.iter().enumerate() {
            let named_chord = score.chords.get(i).cloned().ok_or_else(|| {
                Error::Deserialization(format!("no chord for measure {}", i + 1))
            })?;
            let mut notes = NoteGroup::new();
            for object in measure.iter().flat_map(|voice| &voice.objects) {
                if let ScoreObject::Notes(cluster) = object {
                    notes.add_group(NoteGroup::from_events(cluster.iter().copied()));
                }
            }
            bars.push(MelodicBar::new(ContextualChord::without_scale(named_chord), notes));
        }

        if bars.is_empty() {
            return Ok(());
        }
        let count = bars.len();
        let history = self.suggester.history_mut();
        history.clear();
        for bar in bars {
            history.push(Outcome::fixed(bar));
        }
        history.set_accept_index(count - 1);

        let beats_per_bar = self.settings.beats_per_bar;
        self.suggester.set_pending_span(
            (count - 1) as f64 * beats_per_bar,
            count as f64 * beats_per_bar,
        );
        debug!(bars = count, "Loaded score");
        Ok(())
    }

    /// Change the pitch of the first note in the history whose string form
    /// matches `original`. Timing is untouched.
    pub fn mutate(&mut self, original: &TimedNote, note: Note) -> Result<()> {
        let target = original.to_string();
        for outcome in self.suggester.history_mut().entries_mut() {
            let group = &mut outcome.value.notes;
            let found = group
                .subgroups_mut()
                .iter_mut()
                .flat_map(|subgroup| subgroup.events_mut().iter_mut())
                .find(|timed| timed.to_string() == target);
            if let Some(timed) = found {
                timed.note = note;
                return Ok(());
            }
            if let Some(timed) = group
                .events_mut()
                .iter_mut()
                .find(|timed| timed.to_string() == target)
            {
                timed.note = note;
                return Ok(());
            }
        }
        Err(Error::MutationNotFound(target))
    }

    pub fn interactive_notes(&self) -> &[InteractiveNote] {
        &self.interactive_notes
    }

    pub fn selected(&self) -> Option<&InteractiveNote> {
        self.selected.and_then(|i| self.interactive_notes.get(i))
    }

    /// Select a note, moving the playhead to it. With `preview` the note is
    /// sounded on its own. Returns false for an unknown index.
    pub fn select(&mut self, index: usize, preview: bool) -> bool {
        let Some(start) = self.interactive_notes.get(index).map(|n| n.start) else {
            return false;
        };
        self.deselect();
        self.set_beat_offset(start);
        self.selected = Some(index);
        self.interactive_notes[index].selected = true;
        if preview {
            self.preview(index);
        }
        true
    }

    pub fn deselect(&mut self) {
        if let Some(index) = self.selected.take() {
            if let Some(note) = self.interactive_notes.get_mut(index) {
                note.selected = false;
            }
        }
    }

    /// Move the selection one note left or right, previewing the new note
    pub fn select_adjacent(&mut self, left: bool) {
        let Some(current) = self.selected() else {
            return;
        };
        let next = if left { current.left } else { current.right };
        if let Some(next) = next {
            self.select(next, true);
        }
    }

    /// Shift every note of the selection by `jump` letters, or by `jump`
    /// accidentals (up to [`MAX_ACCIDENTALS`]) with `shift_accidentals`.
    pub fn shift_selected(&mut self, jump: i32, shift_accidentals: bool) -> Result<()> {
        let Some(selected) = self.selected() else {
            return Ok(());
        };
        let targets: Vec<TimedNote> = selected.notes.iter().collect();
        for timed in targets {
            let note = if shift_accidentals {
                timed.note.accidental_shift(jump, Some(MAX_ACCIDENTALS))
            } else {
                timed.note.base_shift(jump)
            };
            self.mutate(&timed, note)?;
        }
        self.rebuild_schedule(true);
        Ok(())
    }

    /// Swap the arpeggio layer without touching the melody
    pub fn set_arpeggio(&mut self, arpeggio: Option<ArpeggioSettings>) {
        self.all_off();
        self.scheduler.schedule_mut().remove_group_by_name(ARPEGGIO_GROUP);
        self.settings.arpeggio = arpeggio;
        if let Some(group) = self.arpeggio_group() {
            self.scheduler.add(group, 0.0);
        }
        self.scheduler.initialize();
    }

    /// Rebuild the interactive notes and the playback schedule from the
    /// history. With `preserve_selected` the selection is restored by index.
    pub fn rebuild_schedule(&mut self, preserve_selected: bool) {
        let reselect = if preserve_selected { self.selected } else { None };

        self.scheduler.clear();
        self.instrument.all_off();
        self.selected = None;
        self.set_playing_note(None);

        let all_notes = self.all_notes();
        let accepted = self.accepted_bars();
        let measures = Voices::from_note_group(&all_notes)
            .to_proper_voices(self.settings.beats_per_bar);

        self.interactive_notes.clear();
        for (measure, voices) in measures.iter().enumerate() {
            let mut clusters: Vec<&[TimedNote]> = voices
                .iter()
                .flat_map(|voice| &voice.objects)
                .map(ScoreObject::notes)
                .filter(|notes| !notes.is_empty())
                .collect();
            clusters.sort_by(|a, b| a[0].start.total_cmp(&b[0].start));

            for cluster in clusters {
                let index = self.interactive_notes.len();
                self.interactive_notes.push(InteractiveNote {
                    index,
                    measure,
                    notes: NoteGroup::from_events(cluster.iter().copied()),
                    start: cluster[0].start,
                    end: cluster[0].end,
                    left: index.checked_sub(1),
                    right: None,
                    suggested: measure >= accepted,
                    selected: false,
                });
            }
        }
        let count = self.interactive_notes.len();
        for note in &mut self.interactive_notes {
            note.right = Some(note.index + 1).filter(|i| *i < count);
        }

        let groups: Vec<Group<FunctionEvent>> = self
            .interactive_notes
            .iter()
            .map(|note| self.note_group(note))
            .collect();
        for group in groups {
            self.scheduler.add(group, 0.0);
        }
        if let Some(group) = self.arpeggio_group() {
            self.scheduler.add(group, 0.0);
        }
        self.scheduler.initialize();

        if let Some(index) = reselect {
            self.select(index, true);
        }
    }

    /// Performance events for one note plus markers tracking what is playing
    fn note_group(&self, note: &InteractiveNote) -> Group<FunctionEvent> {
        let mut group = note.notes.to_performance_group(&self.settings.performance);
        let index = note.index;

        let playing = Arc::clone(&self.playing_note);
        group.add_event(FunctionEvent::call(
            move || {
                if let Ok(mut current) = playing.lock() {
                    *current = Some(index);
                }
            },
            note.start,
        ));
        let playing = Arc::clone(&self.playing_note);
        group.add_event(FunctionEvent::call(
            move || {
                if let Ok(mut current) = playing.lock() {
                    if *current == Some(index) {
                        *current = None;
                    }
                }
            },
            note.end,
        ));
        group
    }

    /// One arpeggiated bar per chord, cut to the bar
    fn arpeggio_group(&self) -> Option<Group<FunctionEvent>> {
        let settings = self.settings.arpeggio.as_ref()?;
        let beats_per_bar = self.settings.beats_per_bar;
        let options = PerformanceOptions {
            unique_handle: ARPEGGIO_HANDLE.to_string(),
            ..self.settings.performance.clone()
        };

        let mut layer = Group::new().with_name(ARPEGGIO_GROUP);
        for (i, chord) in self.bars().map(|bar| &bar.chord).enumerate() {
            let start = i as f64 * beats_per_bar;
            let notes = Arpeggiator::new(settings.pattern.clone(), chord.chord().clone())
                .with_beats_per_step(settings.beats_per_step)
                .with_window(start, Some(start + beats_per_bar))
                .to_note_group();
            layer.add_group(notes.to_performance_group(&options).with_offset(start));
        }
        Some(layer)
    }

    fn preview(&mut self, index: usize) {
        let Some(note) = self.interactive_notes.get(index) else {
            return;
        };
        let options = PerformanceOptions {
            shift_start: true,
            unique_handle: PREVIEW_HANDLE.to_string(),
            ..self.settings.performance.clone()
        };
        let group = note.notes.to_performance_group(&options);
        self.scheduler.cancel_previews();
        self.instrument.all_off();
        self.scheduler.preview(&group);
    }

    fn set_playing_note(&self, index: Option<usize>) {
        if let Ok(mut current) = self.playing_note.lock() {
            *current = index;
        }
    }

    /// Play from the current beat offset, clearing the selection
    pub fn play(&mut self) {
        self.deselect();
        self.scheduler.play(None);
    }

    pub fn pause(&mut self) {
        self.all_off();
    }

    /// Stop playback and silence everything, previews included
    pub fn all_off(&mut self) {
        self.scheduler.pause();
        self.instrument.all_off();
        self.scheduler.cancel_previews();
        self.set_playing_note(None);
    }

    pub fn toggle(&mut self) {
        if self.scheduler.is_playing() {
            self.all_off();
        } else {
            self.play();
        }
    }

    /// Play from the first beat
    pub fn restart(&mut self) {
        self.all_off();
        self.scheduler.set_beat_offset(0.0);
        self.play();
    }

    /// Move the playhead. Playback stops if it was running.
    pub fn set_beat_offset(&mut self, beats: f64) {
        if self.scheduler.is_playing() {
            self.all_off();
        }
        self.scheduler.set_beat_offset(beats);
    }

    pub fn is_playing(&self) -> bool {
        self.scheduler.is_playing()
    }

    /// Fire whatever is due. Returns the number of events run.
    pub fn poll(&mut self) -> usize {
        self.scheduler.poll(&mut self.instrument)
    }

    /// Perform until playback finishes
    pub async fn run(&mut self) -> usize {
        driver::run(&mut self.scheduler, &mut self.instrument).await
    }

    /// Perform until playback finishes or `stop` completes
    pub async fn run_until<F>(&mut self, stop: F) -> usize
    where
        F: Future<Output = ()>,
    {
        let fired = driver::run_until(&mut self.scheduler, &mut self.instrument, stop).await;
        self.set_playing_note(None);
        fired
    }

    /// Index of the note currently sounding in the schedule
    pub fn playing_note(&self) -> Option<usize> {
        self.playing_note.lock().ok().and_then(|current| *current)
    }

    /// Last beat published by the scheduler
    pub fn cursor_beat(&self) -> f64 {
        self.cursor.lock().map(|beat| *beat).unwrap_or(0.0)
    }

    /// The note under `beat`, if any
    pub fn note_at_beat(&self, beat: f64) -> Option<&InteractiveNote> {
        self.interactive_notes
            .iter()
            .find(|note| note.start <= beat && beat < note.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{make_rng, patterns};
    use crate::instrument::{Command, RecordingInstrument};
    use crate::music::western::{duration_templates, extended_context, western_chord_dictionary};
    use crate::timing::{ManualClock, Timing};

    const ONE_BAR: &str = "v0|E4-m~D4-0-1|A4-1-1.5|C4-1.5-2|D4-2-3|B4-3-4";
    const FOUR_BARS: &str = "v0|E4-7|F4-maj7|F4-maj7|A4-7~E4-0-1|E4-1-2|B4-2-2.5|E4-2.5-3|E4-3-3.5|E4-3.5-4|B4-4-5|A4-5-6|A4-6-7|G4-7-8|D4-8-9|G3-9-9.5|D4-9.5-10|A4-10-11|G3-11-12|F4-12-12.5|G3-12.5-13|B4-13-13.5|C_4-13.5-14|G4-14-15|F4-15-16";

    fn composer(serialized: Option<&str>) -> (Composer<RecordingInstrument>, ManualClock) {
        let clock = ManualClock::new();
        let suggester = BasicMelodyBarSuggester::new(
            Note::parse("A4").unwrap(),
            &extended_context(),
            duration_templates(),
            -1,
            None,
        )
        .with_rng(make_rng(Some(17)));
        let scheduler = Scheduler::with_clock(Timing::new(120.0), clock.clone());
        let settings = ComposerSettings::new(western_chord_dictionary());
        let composer = Composer::new(
            suggester,
            scheduler,
            RecordingInstrument::new(),
            settings,
            serialized,
        )
        .unwrap();
        (composer, clock)
    }

    fn note_ons(instrument: &mut RecordingInstrument) -> Vec<String> {
        instrument
            .take()
            .into_iter()
            .filter_map(|c| match c {
                Command::NoteOn { handle, .. } => Some(handle),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_new_score_suggests_and_plays() {
        let (composer, _) = composer(None);
        assert_eq!(composer.suggester().history().len(), 1);
        assert_eq!(composer.accepted_bars(), 0);
        assert!(composer.is_playing());
        assert!(!composer.interactive_notes().is_empty());
        assert!(composer.interactive_notes().iter().all(|n| n.suggested));
        assert_eq!(composer.scheduler().beat_offset(), 0.0);
    }

    #[test]
    fn test_accept_moves_to_next_bar() {
        let (mut composer, _) = composer(None);
        composer.accept();
        assert_eq!(composer.suggester().history().len(), 2);
        assert_eq!(composer.accepted_bars(), 1);
        assert_eq!(composer.scheduler().beat_offset(), 4.0);

        for note in composer.interactive_notes() {
            assert_eq!(note.suggested, note.measure >= 1, "note {}", note.index);
            assert_eq!(note.suggested, note.start >= 4.0);
        }
        let second = composer.bars().nth(1).unwrap();
        assert_eq!(second.notes.min_start(), Some(4.0));
    }

    #[test]
    fn test_shuffle_keeps_accepted_bars() {
        let (mut composer, _) = composer(None);
        composer.accept();
        let first = composer.bars().next().unwrap().clone();
        composer.shuffle();
        composer.shuffle();
        assert_eq!(composer.suggester().history().len(), 2);
        assert_eq!(composer.bars().next().unwrap(), &first);
    }

    #[test]
    fn test_load_serialized_score() {
        let (composer, _) = composer(Some(FOUR_BARS));
        assert_eq!(composer.suggester().history().len(), 4);
        assert_eq!(composer.accepted_bars(), 3);
        assert!(!composer.is_playing());
        assert_eq!(composer.serialize().unwrap(), FOUR_BARS);

        let names: Vec<String> = composer.all_chords().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["E7", "Fmaj7", "Fmaj7", "A7"]);
        assert_eq!(composer.interactive_notes().len(), 21);
        assert_eq!(
            composer.interactive_notes().iter().filter(|n| n.suggested).count(),
            6
        );
    }

    #[test]
    fn test_accept_after_load_continues_the_score() {
        let (mut composer, _) = composer(Some(ONE_BAR));
        composer.accept();
        assert_eq!(composer.suggester().history().len(), 2);
        let next = composer.bars().nth(1).unwrap();
        assert_eq!(next.notes.min_start(), Some(4.0));
        assert!(composer.serialize().unwrap().starts_with("v0|E4-m|"));
    }

    #[test]
    fn test_bad_score_falls_back_to_suggestion() {
        let (unknown_version, _) = composer(Some("v9|nonsense"));
        assert_eq!(unknown_version.suggester().history().len(), 1);
        assert!(unknown_version.is_playing());

        let (no_notes, _) = composer(Some("v0|E4-m"));
        assert_eq!(no_notes.suggester().history().len(), 1);
    }

    #[test]
    fn test_deserialize_failure_leaves_history() {
        let (mut composer, _) = composer(Some(ONE_BAR));
        let before = composer.serialize().unwrap();
        assert!(composer.deserialize("v0|~D4-0-1").is_err());
        assert_eq!(composer.serialize().unwrap(), before);
    }

    #[test]
    fn test_mutate() {
        let (mut composer, _) = composer(Some(ONE_BAR));
        let original = TimedNote::new(Note::parse("C4").unwrap(), 1.5, 2.0);
        composer.mutate(&original, Note::parse("C#4").unwrap()).unwrap();
        assert_eq!(
            composer.serialize().unwrap(),
            "v0|E4-m~D4-0-1|A4-1-1.5|C_4-1.5-2|D4-2-3|B4-3-4"
        );

        assert_eq!(
            composer.mutate(&original, Note::parse("D4").unwrap()),
            Err(Error::MutationNotFound("C4,1.5,2".into()))
        );
    }

    #[test]
    fn test_select_and_navigate() {
        let (mut composer, _) = composer(Some(ONE_BAR));
        assert!(composer.select(0, false));
        assert_eq!(composer.selected().map(|n| n.index), Some(0));
        assert!(composer.interactive_notes()[0].selected);

        composer.select_adjacent(false);
        let selected = composer.selected().unwrap();
        assert_eq!(selected.index, 1);
        assert_eq!(selected.start, 1.0);
        assert_eq!(composer.scheduler().beat_offset(), 1.0);
        assert!(!composer.interactive_notes()[0].selected);

        composer.select_adjacent(true);
        composer.select_adjacent(true);
        assert_eq!(composer.selected().map(|n| n.index), Some(0));

        composer.deselect();
        assert!(composer.selected().is_none());
        assert!(!composer.select(99, false));
    }

    #[test]
    fn test_select_previews_note() {
        let (mut composer, clock) = composer(Some(ONE_BAR));
        composer.instrument_mut().take();
        composer.select(1, true);
        clock.advance(1.0);
        composer.poll();
        assert_eq!(note_ons(composer.instrument_mut()), vec!["preview:A4"]);
    }

    #[test]
    fn test_shift_selected() {
        let (mut composer, _) = composer(Some(ONE_BAR));
        composer.select(0, false);
        composer.shift_selected(1, false).unwrap();
        assert!(composer.serialize().unwrap().contains("~E4-0-1|"));
        assert_eq!(composer.selected().map(|n| n.index), Some(0));

        composer.shift_selected(1, true).unwrap();
        composer.shift_selected(1, true).unwrap();
        composer.shift_selected(1, true).unwrap();
        assert!(composer.serialize().unwrap().contains("~E__4-0-1|"));

        composer.deselect();
        composer.shift_selected(1, false).unwrap();
        assert!(composer.serialize().unwrap().contains("~E__4-0-1|"));
    }

    #[test]
    fn test_playback_tracks_playing_note() {
        let (mut composer, clock) = composer(Some(ONE_BAR));
        composer.restart();
        composer.instrument_mut().take();

        composer.poll();
        assert_eq!(note_ons(composer.instrument_mut()), vec!["D4"]);
        assert_eq!(composer.playing_note(), Some(0));

        clock.advance(500.0);
        composer.poll();
        assert_eq!(note_ons(composer.instrument_mut()), vec!["A4"]);
        assert_eq!(composer.playing_note(), Some(1));

        clock.advance(1500.0);
        composer.poll();
        assert!(!composer.is_playing());
        assert_eq!(composer.playing_note(), None);
        assert!((composer.cursor_beat() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_toggle_and_all_off() {
        let (mut composer, clock) = composer(Some(ONE_BAR));
        composer.toggle();
        assert!(composer.is_playing());
        clock.advance(1000.0);
        composer.toggle();
        assert!(!composer.is_playing());
        assert_eq!(composer.scheduler().beat_offset(), 2.0);
        assert_eq!(composer.instrument().commands().last(), Some(&Command::AllOff));
    }

    #[test]
    fn test_arpeggio_layer() {
        let (mut composer, _) = composer(Some(ONE_BAR));
        let melody_timers = composer.scheduler().timer_count();

        composer.set_arpeggio(Some(ArpeggioSettings {
            pattern: patterns::waterfall(),
            beats_per_step: 0.5,
        }));
        assert!(composer.scheduler().timer_count() > melody_timers);

        composer.restart();
        composer.instrument_mut().take();
        composer.poll();
        let played = note_ons(composer.instrument_mut());
        assert!(played.contains(&"D4".to_string()));
        assert!(played.iter().any(|h| h.starts_with("arpeggio:")));

        composer.set_arpeggio(None);
        assert_eq!(composer.scheduler().timer_count(), melody_timers);
    }

    #[test]
    fn test_note_at_beat() {
        let (composer, _) = composer(Some(ONE_BAR));
        assert_eq!(composer.note_at_beat(1.2).map(|n| n.index), Some(1));
        assert_eq!(composer.note_at_beat(3.5).map(|n| n.index), Some(4));
        assert!(composer.note_at_beat(4.0).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_stops_playback() {
        use crate::timing::TokioClock;
        use std::time::Duration;

        let suggester = BasicMelodyBarSuggester::new(
            Note::parse("A4").unwrap(),
            &extended_context(),
            duration_templates(),
            -1,
            None,
        )
        .with_rng(make_rng(Some(3)));
        let scheduler = Scheduler::with_clock(Timing::new(120.0), TokioClock::new());
        let mut composer = Composer::new(
            suggester,
            scheduler,
            RecordingInstrument::new(),
            ComposerSettings::new(western_chord_dictionary()),
            Some(ONE_BAR),
        )
        .unwrap();

        composer.restart();
        let fired = composer
            .run_until(tokio::time::sleep(Duration::from_millis(600)))
            .await;
        assert!(fired >= 4);
        assert!(!composer.is_playing());
        assert_eq!(composer.playing_note(), None);
    }
}
