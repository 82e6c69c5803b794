// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Beat-based event scheduler with play, pause and seek.
//!
//! The scheduler owns a root [`Group`] of [`FunctionEvent`]s. Calling
//! [`Scheduler::initialize`] flattens it into timers; [`Scheduler::play`]
//! arms every timer at or after the current beat offset against a
//! [`Clock`]. Nothing fires on its own: the owner calls
//! [`Scheduler::poll`] (directly, or through the async driver) and due
//! timers run in order of their deadlines.
//!
//! Actions run from `poll` cannot reach back into the scheduler, so the
//! schedule is never mutated while it is being performed.

use std::fmt;
use std::time::Duration;

use tracing::debug;

use super::event::{Event, FunctionEvent};
use super::group::Group;
use crate::instrument::Instrument;
use crate::timing::{Clock, SystemClock, Timing};

/// Default period of the beat offset callback in milliseconds
pub const DEFAULT_CALLBACK_INTERVAL_MS: f64 = 50.0;

/// Where the scheduler is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No timers exist
    Idle,
    /// Timers exist but have never been armed
    Initialized,
    /// Timers are armed and the clock is running
    Playing,
    /// Timers are disarmed; the beat offset holds the resume point
    Paused,
}

/// One flattened schedule event and its deadline
#[derive(Debug, Clone)]
struct Timer {
    event: FunctionEvent,
    /// Clock time the timer fires at, when armed
    due_at: Option<f64>,
    /// Re-arm period in milliseconds for looping playback
    period: Option<f64>,
}

impl Timer {
    fn new(event: FunctionEvent) -> Self {
        Self {
            event,
            due_at: None,
            period: None,
        }
    }

    fn arm(&mut self, due_at: f64, period: Option<f64>) {
        self.due_at = Some(due_at);
        self.period = period.filter(|p| *p > 0.0);
    }

    fn disarm(&mut self) {
        self.due_at = None;
        self.period = None;
    }
}

type OffsetFn = Box<dyn FnMut(f64) + Send>;

struct OffsetCallback {
    callback: OffsetFn,
    interval: f64,
    next_due: f64,
}

/// Scheduler for a tree of timed instrument actions
pub struct Scheduler {
    timing: Timing,
    schedule: Group<FunctionEvent>,
    clock: Box<dyn Clock>,
    timers: Vec<Timer>,
    /// One-off events armed outside the main schedule
    previews: Vec<Timer>,
    auto_pause_at: Option<f64>,
    offset_callback: Option<OffsetCallback>,
    playing: bool,
    has_played: bool,
    start_time: f64,
    start_offset: f64,
    beat_offset: f64,
    loop_beats: Option<f64>,
}

impl Scheduler {
    /// Create a scheduler measuring time with the system clock
    pub fn new(timing: Timing) -> Self {
        Self::with_clock(timing, SystemClock::new())
    }

    /// Create a scheduler measuring time with `clock`
    pub fn with_clock(timing: Timing, clock: impl Clock + 'static) -> Self {
        Self {
            timing,
            schedule: Group::new(),
            clock: Box::new(clock),
            timers: Vec::new(),
            previews: Vec::new(),
            auto_pause_at: None,
            offset_callback: None,
            playing: false,
            has_played: false,
            start_time: 0.0,
            start_offset: 0.0,
            beat_offset: 0.0,
            loop_beats: None,
        }
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Change the tempo, keeping the current beat position
    pub fn set_tempo(&mut self, tempo: f64) {
        let was_playing = self.playing;
        if was_playing {
            self.pause();
        }
        self.timing.tempo = tempo;
        if was_playing {
            self.play(self.loop_beats);
        }
    }

    pub fn schedule(&self) -> &Group<FunctionEvent> {
        &self.schedule
    }

    /// Mutable access to the schedule. Changes take effect at the next
    /// [`initialize`](Self::initialize).
    pub fn schedule_mut(&mut self) -> &mut Group<FunctionEvent> {
        &mut self.schedule
    }

    /// Add a group to the schedule at `beat_offset`
    pub fn add(&mut self, group: Group<FunctionEvent>, beat_offset: f64) {
        self.schedule
            .add_group(Group::from_groups([group]).with_offset(beat_offset));
    }

    /// Add a single event to the schedule at `beat_offset`
    pub fn add_event(&mut self, event: FunctionEvent, beat_offset: f64) {
        self.schedule
            .add_group(Group::from_events([event]).with_offset(beat_offset));
    }

    /// Flatten the schedule into fresh timers
    pub fn initialize(&mut self) {
        self.clear_timers();
        self.timers = self.schedule.iter().map(Timer::new).collect();
        self.has_played = false;
        debug!(timers = self.timers.len(), "Scheduler initialized");
    }

    /// Arm every timer at or after the beat offset.
    ///
    /// With `loop_beats`, each timer re-fires every `loop_beats` beats.
    /// Playback pauses itself once the last timer has fired.
    pub fn play(&mut self, loop_beats: Option<f64>) {
        let now = self.clock.now_millis();
        self.playing = true;
        self.has_played = true;
        self.start_time = now;
        self.start_offset = self.beat_offset;
        self.loop_beats = loop_beats;

        let period = loop_beats.map(|beats| self.timing.get_duration(beats));
        let mut max_millis: f64 = 0.0;
        let mut armed = 0;
        for timer in &mut self.timers {
            let beats = timer.event.beats();
            if beats < self.beat_offset {
                continue;
            }
            let millis = self.timing.get_duration(beats - self.beat_offset);
            max_millis = max_millis.max(millis);
            timer.arm(now + millis, period);
            armed += 1;
        }
        self.auto_pause_at = Some(now + max_millis);

        if let Some(callback) = &mut self.offset_callback {
            callback.next_due = now + callback.interval;
        }
        debug!(
            armed,
            beat_offset = self.beat_offset,
            max_millis,
            "Scheduler playing"
        );
    }

    /// Stop playback, remembering the beat reached
    pub fn pause(&mut self) {
        if self.playing {
            let elapsed = self.clock.now_millis() - self.start_time;
            self.beat_offset = self.timing.get_beats(elapsed) + self.start_offset;
            self.playing = false;
            debug!(beat_offset = self.beat_offset, "Scheduler paused");
        }
        for timer in &mut self.timers {
            timer.disarm();
        }
        self.auto_pause_at = None;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn state(&self) -> SchedulerState {
        if self.playing {
            SchedulerState::Playing
        } else if self.timers.is_empty() {
            SchedulerState::Idle
        } else if self.has_played {
            SchedulerState::Paused
        } else {
            SchedulerState::Initialized
        }
    }

    /// Beat offset playback resumes from
    pub fn beat_offset(&self) -> f64 {
        self.beat_offset
    }

    /// Beat currently being played, or the resume point when paused
    pub fn current_beat(&self) -> f64 {
        if self.playing {
            let elapsed = self.clock.now_millis() - self.start_time;
            self.timing.get_beats(elapsed) + self.start_offset
        } else {
            self.beat_offset
        }
    }

    /// Move the playhead. The offset callback sees the new offset before
    /// playback resumes.
    pub fn set_beat_offset(&mut self, beats: f64) {
        let was_playing = self.playing;
        if was_playing {
            self.pause();
        }
        self.beat_offset = beats;
        if let Some(callback) = &mut self.offset_callback {
            (callback.callback)(beats);
        }
        if was_playing {
            self.play(self.loop_beats);
        }
    }

    /// Publish the current beat to `callback` every `interval_ms` while
    /// playing, and once on every [`set_beat_offset`](Self::set_beat_offset).
    pub fn set_beat_offset_callback(
        &mut self,
        callback: impl FnMut(f64) + Send + 'static,
        interval_ms: f64,
    ) {
        self.offset_callback = Some(OffsetCallback {
            callback: Box::new(callback),
            interval: interval_ms.max(1.0),
            next_due: self.clock.now_millis() + interval_ms.max(1.0),
        });
    }

    pub fn clear_beat_offset_callback(&mut self) {
        self.offset_callback = None;
    }

    /// Play `group` once starting now, independently of the schedule.
    pub fn preview(&mut self, group: &Group<FunctionEvent>) {
        let now = self.clock.now_millis();
        for event in group.iter() {
            let mut timer = Timer::new(event);
            let millis = self.timing.get_duration(timer.event.beats().max(0.0));
            timer.arm(now + millis, None);
            self.previews.push(timer);
        }
    }

    /// Drop any pending preview events
    pub fn cancel_previews(&mut self) {
        self.previews.clear();
    }

    /// Disarm and discard every timer
    pub fn clear_timers(&mut self) {
        self.timers.clear();
        self.previews.clear();
        self.auto_pause_at = None;
    }

    /// Discard the schedule and all timers and stop playing
    pub fn clear(&mut self) {
        self.clear_timers();
        self.schedule = Group::new();
        self.playing = false;
        self.has_played = false;
    }

    /// Number of timers created by the last initialize
    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Number of timers waiting to fire
    pub fn armed_count(&self) -> usize {
        self.timers.iter().filter(|t| t.due_at.is_some()).count()
            + self.previews.len()
    }

    /// Fire everything that is due. Returns the number of events run.
    pub fn poll(&mut self, instrument: &mut dyn Instrument) -> usize {
        let now = self.clock.now_millis();
        let mut fired = self.fire_previews(now, instrument);

        if !self.playing {
            return fired;
        }

        let mut due: Vec<(f64, usize)> = self
            .timers
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.due_at.filter(|at| *at <= now).map(|at| (at, i)))
            .collect();
        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        for (_, i) in due {
            let timer = &mut self.timers[i];
            timer.event.action.run(instrument);
            timer.due_at = match (timer.due_at, timer.period) {
                (Some(at), Some(period)) => Some(at + period),
                _ => None,
            };
            fired += 1;
        }

        if let Some(callback) = &mut self.offset_callback {
            if callback.next_due <= now {
                let beat = self.timing.get_beats(now - self.start_time) + self.start_offset;
                (callback.callback)(beat);
                callback.next_due = (callback.next_due + callback.interval).max(now);
            }
        }

        if self.auto_pause_at.is_some_and(|at| at <= now) {
            debug!("Reached the end of the schedule");
            self.pause();
        }

        fired
    }

    fn fire_previews(&mut self, now: f64, instrument: &mut dyn Instrument) -> usize {
        let (mut due, pending): (Vec<Timer>, Vec<Timer>) = std::mem::take(&mut self.previews)
            .into_iter()
            .partition(|t| t.due_at.is_some_and(|at| at <= now));
        self.previews = pending;
        due.sort_by(|a, b| {
            let a = a.due_at.unwrap_or(0.0);
            let b = b.due_at.unwrap_or(0.0);
            a.total_cmp(&b)
        });
        for timer in &due {
            timer.event.action.run(instrument);
        }
        due.len()
    }

    /// Clock time of the next thing `poll` would do
    fn next_deadline(&self) -> Option<f64> {
        let previews = self.previews.iter().filter_map(|t| t.due_at);
        if !self.playing {
            return previews.reduce(f64::min);
        }
        self.timers
            .iter()
            .filter_map(|t| t.due_at)
            .chain(previews)
            .chain(self.auto_pause_at)
            .chain(self.offset_callback.as_ref().map(|c| c.next_due))
            .reduce(f64::min)
    }

    /// How long until `poll` has work to do, or `None` when idle
    pub fn time_until_next(&self) -> Option<Duration> {
        let deadline = self.next_deadline()?;
        let wait = (deadline - self.clock.now_millis()).max(0.0);
        Some(Duration::from_secs_f64(wait / 1000.0))
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("timing", &self.timing)
            .field("state", &self.state())
            .field("beat_offset", &self.beat_offset)
            .field("timers", &self.timers.len())
            .field("previews", &self.previews.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::{Command, RecordingInstrument};
    use crate::timing::ManualClock;
    use approx::assert_relative_eq;
    use std::sync::{Arc, Mutex};

    fn scheduler(tempo: f64) -> (Scheduler, ManualClock) {
        let clock = ManualClock::new();
        (Scheduler::with_clock(Timing::new(tempo), clock.clone()), clock)
    }

    fn notes(handles: &[(&str, f64)]) -> Group<FunctionEvent> {
        Group::from_events(
            handles
                .iter()
                .map(|(h, beats)| FunctionEvent::note_on(*h, 440.0, 0.2, *beats)),
        )
    }

    #[test]
    fn test_new_scheduler_is_idle() {
        let (scheduler, _) = scheduler(120.0);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(!scheduler.is_playing());
        assert_eq!(scheduler.time_until_next(), None);
    }

    #[test]
    fn test_note_fires_at_tempo() {
        let (mut scheduler, clock) = scheduler(120.0);
        let mut instrument = RecordingInstrument::new();
        scheduler.add(notes(&[("a", 1.0)]), 0.0);
        scheduler.initialize();
        assert_eq!(scheduler.state(), SchedulerState::Initialized);

        scheduler.play(None);
        assert_eq!(scheduler.state(), SchedulerState::Playing);
        assert_eq!(scheduler.time_until_next(), Some(Duration::from_millis(500)));

        clock.set(499.0);
        assert_eq!(scheduler.poll(&mut instrument), 0);
        clock.set(500.0);
        assert_eq!(scheduler.poll(&mut instrument), 1);
        assert_eq!(instrument.notes_played(), vec!["a"]);

        // The last timer doubles as the end of the schedule
        assert!(!scheduler.is_playing());
        assert_eq!(scheduler.state(), SchedulerState::Paused);
        assert_eq!(scheduler.beat_offset(), 1.0);
    }

    #[test]
    fn test_events_fire_in_beat_order() {
        let (mut scheduler, clock) = scheduler(60.0);
        let mut instrument = RecordingInstrument::new();
        scheduler.add(notes(&[("c", 2.0), ("a", 0.0), ("b", 1.0)]), 0.0);
        scheduler.initialize();
        scheduler.play(None);

        clock.set(5000.0);
        assert_eq!(scheduler.poll(&mut instrument), 3);
        assert_eq!(instrument.notes_played(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_group_offsets_are_respected() {
        let (mut scheduler, clock) = scheduler(60.0);
        let mut instrument = RecordingInstrument::new();
        scheduler.add(notes(&[("late", 0.0)]), 4.0);
        scheduler.add_event(FunctionEvent::note_on("early", 440.0, 0.2, 1.0), 0.0);
        scheduler.initialize();
        scheduler.play(None);

        clock.set(1000.0);
        scheduler.poll(&mut instrument);
        assert_eq!(instrument.notes_played(), vec!["early"]);
        clock.set(4000.0);
        scheduler.poll(&mut instrument);
        assert_eq!(instrument.notes_played(), vec!["early", "late"]);
    }

    #[test]
    fn test_pause_and_resume() {
        let (mut scheduler, clock) = scheduler(60.0);
        let mut instrument = RecordingInstrument::new();
        scheduler.add(notes(&[("a", 1.0), ("b", 3.0)]), 0.0);
        scheduler.initialize();
        scheduler.play(None);

        clock.set(1500.0);
        scheduler.poll(&mut instrument);
        scheduler.pause();
        assert_eq!(scheduler.beat_offset(), 1.5);
        assert_eq!(scheduler.armed_count(), 0);

        // Time passing while paused changes nothing
        clock.set(10_000.0);
        assert_eq!(scheduler.poll(&mut instrument), 0);

        scheduler.play(None);
        assert_eq!(scheduler.armed_count(), 1);
        clock.set(11_000.0);
        assert_eq!(scheduler.poll(&mut instrument), 0);
        clock.set(11_500.0);
        assert_eq!(scheduler.poll(&mut instrument), 1);
        assert_eq!(instrument.notes_played(), vec!["a", "b"]);
    }

    #[test]
    fn test_play_skips_events_before_offset() {
        let (mut scheduler, clock) = scheduler(60.0);
        let mut instrument = RecordingInstrument::new();
        scheduler.add(notes(&[("a", 0.0), ("b", 2.0), ("c", 3.0)]), 0.0);
        scheduler.initialize();
        scheduler.set_beat_offset(2.0);
        scheduler.play(None);
        assert_eq!(scheduler.armed_count(), 2);

        clock.set(0.0);
        scheduler.poll(&mut instrument);
        assert_eq!(instrument.notes_played(), vec!["b"]);
    }

    #[test]
    fn test_set_beat_offset_while_playing() {
        let (mut scheduler, clock) = scheduler(60.0);
        let mut instrument = RecordingInstrument::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        scheduler.set_beat_offset_callback(move |beat| sink.lock().unwrap().push(beat), 50.0);
        scheduler.add(notes(&[("a", 1.0), ("b", 8.0)]), 0.0);
        scheduler.initialize();
        scheduler.play(None);

        clock.set(10.0);
        scheduler.set_beat_offset(7.0);
        assert!(scheduler.is_playing());
        assert_eq!(seen.lock().unwrap().as_slice(), &[7.0]);

        clock.set(1010.0);
        scheduler.poll(&mut instrument);
        assert_eq!(instrument.notes_played(), vec!["b"]);
    }

    #[test]
    fn test_offset_callback_only_while_playing() {
        let (mut scheduler, clock) = scheduler(60.0);
        let mut instrument = RecordingInstrument::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        scheduler.set_beat_offset_callback(move |beat| sink.lock().unwrap().push(beat), 50.0);
        scheduler.add(notes(&[("a", 2.0)]), 0.0);
        scheduler.initialize();

        clock.set(100.0);
        scheduler.poll(&mut instrument);
        assert!(seen.lock().unwrap().is_empty());

        scheduler.play(None);
        clock.set(150.0);
        scheduler.poll(&mut instrument);
        clock.set(200.0);
        scheduler.poll(&mut instrument);
        {
            let seen = seen.lock().unwrap();
            assert_eq!(seen.len(), 2);
            assert_relative_eq!(seen[0], 0.05);
            assert_relative_eq!(seen[1], 0.1);
        }

        scheduler.pause();
        clock.set(400.0);
        scheduler.poll(&mut instrument);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_loop_rearms_timers() {
        let (mut scheduler, clock) = scheduler(60.0);
        let mut instrument = RecordingInstrument::new();
        scheduler.add(notes(&[("a", 0.0), ("b", 1.0)]), 0.0);
        scheduler.initialize();
        scheduler.play(Some(0.5));

        clock.set(0.0);
        assert_eq!(scheduler.poll(&mut instrument), 1);
        clock.set(500.0);
        assert_eq!(scheduler.poll(&mut instrument), 1);
        assert_eq!(instrument.notes_played(), vec!["a", "a"]);
    }

    #[test]
    fn test_empty_schedule_pauses_immediately() {
        let (mut scheduler, _) = scheduler(120.0);
        let mut instrument = RecordingInstrument::new();
        scheduler.initialize();
        scheduler.play(None);
        assert_eq!(scheduler.poll(&mut instrument), 0);
        assert!(!scheduler.is_playing());
        assert_eq!(scheduler.beat_offset(), 0.0);
    }

    #[test]
    fn test_preview_plays_while_paused() {
        let (mut scheduler, clock) = scheduler(120.0);
        let mut instrument = RecordingInstrument::new();
        let group = Group::from_events([
            FunctionEvent::note_on("p", 440.0, 0.2, 0.0),
            FunctionEvent::note_off("p", 1.0),
        ]);
        scheduler.preview(&group);
        assert_eq!(scheduler.time_until_next(), Some(Duration::ZERO));
        assert_eq!(scheduler.poll(&mut instrument), 1);

        clock.set(500.0);
        assert_eq!(scheduler.poll(&mut instrument), 1);
        assert_eq!(
            instrument.commands().last(),
            Some(&Command::NoteOff { handle: "p".into() })
        );
        assert_eq!(scheduler.time_until_next(), None);
    }

    #[test]
    fn test_clear() {
        let (mut scheduler, _) = scheduler(120.0);
        scheduler.add(notes(&[("a", 0.0)]), 0.0);
        scheduler.initialize();
        scheduler.play(None);
        scheduler.clear();
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(scheduler.schedule().is_empty());
        assert_eq!(scheduler.timer_count(), 0);
    }

    #[test]
    fn test_set_tempo_keeps_position() {
        let (mut scheduler, clock) = scheduler(60.0);
        let mut instrument = RecordingInstrument::new();
        scheduler.add(notes(&[("a", 2.0)]), 0.0);
        scheduler.initialize();
        scheduler.play(None);

        clock.set(1000.0);
        scheduler.set_tempo(120.0);
        assert_eq!(scheduler.beat_offset(), 1.0);
        clock.set(1500.0);
        assert_eq!(scheduler.poll(&mut instrument), 1);
    }
}
