// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Async loop that keeps a [`Scheduler`] firing on time.

use std::future::Future;

use tracing::debug;

use super::scheduler::Scheduler;
use crate::instrument::Instrument;

/// Poll `scheduler` until it has nothing left to do.
///
/// Sleeps on the tokio timer between deadlines, so the scheduler should
/// use a [`TokioClock`](crate::timing::TokioClock). Returns the number of
/// events fired.
pub async fn run(scheduler: &mut Scheduler, instrument: &mut dyn Instrument) -> usize {
    let mut fired = 0;
    loop {
        fired += scheduler.poll(instrument);
        let Some(wait) = scheduler.time_until_next() else {
            break;
        };
        tokio::time::sleep(wait).await;
    }
    debug!(fired, "Scheduler run finished");
    fired
}

/// Like [`run`], but stops early once `stop` completes.
///
/// Every sounding note is released on an early stop.
pub async fn run_until<F>(
    scheduler: &mut Scheduler,
    instrument: &mut dyn Instrument,
    stop: F,
) -> usize
where
    F: Future<Output = ()>,
{
    tokio::pin!(stop);
    let mut fired = 0;
    loop {
        fired += scheduler.poll(instrument);
        let Some(wait) = scheduler.time_until_next() else {
            break;
        };
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = &mut stop => {
                debug!("Scheduler run interrupted");
                scheduler.pause();
                instrument.all_off();
                break;
            }
        }
    }
    fired
}
