// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing and clock module.
//!
//! Beat/millisecond conversion plus the clocks the scheduler measures
//! playback against.

pub mod clock;
pub mod tempo;

pub use clock::{Clock, ManualClock, SystemClock, TokioClock};
pub use tempo::Timing;
