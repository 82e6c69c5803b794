// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Sequencer core: timed events, nested groups and the scheduler.
//!
//! - [`Group`] trees of events with per-group beat offsets
//! - [`TimedNote`] and [`FunctionEvent`] events
//! - [`Scheduler`] for play, pause and seek against a clock
//! - [`driver`] to run a scheduler on the tokio timer

pub mod driver;
pub mod event;
pub mod group;
pub mod scheduler;

pub use event::{
    format_number, parse_beats, Action, Callback, Event, FunctionEvent, NoteGroup,
    PerformanceOptions, TimedNote,
};
pub use group::Group;
pub use scheduler::{Scheduler, SchedulerState, DEFAULT_CALLBACK_INTERVAL_MS};
