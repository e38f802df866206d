//! Periodic duration and level sampling while a session is active.
//!
//! The loop is a `tokio` interval owned by the recording manager task. It is
//! created when a session starts and dropped when the session ends, so once
//! `stop` has been handled no further tick can be observed.

use crate::{audio::normalize_level, recorder::session::RecordingSession};

use std::{future, time::Duration};

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::warn;

/// Default time between samples.
pub const DEFAULT_SAMPLING_INTERVAL: Duration = Duration::from_millis(100);

/// One reading of an active session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Sample {
    pub(crate) duration: Duration,
    pub(crate) level: f32,
}

pub(crate) struct SamplingLoop {
    interval: Interval,
}

impl SamplingLoop {
    /// Start ticking every `period`, first tick one period from now.
    pub(crate) fn start(period: Duration) -> Self {
        let period = if period.is_zero() {
            warn!("Zero sampling interval requested, using default");
            DEFAULT_SAMPLING_INTERVAL
        } else {
            period
        };

        let mut interval = interval_at(Instant::now() + period, period);
        // A stalled manager should not fire a burst of catch-up ticks.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self { interval }
    }

    pub(crate) fn period(&self) -> Duration {
        self.interval.period()
    }
}

/// Resolve on the next tick, or never when no loop is running.
pub(crate) async fn next_tick(sampler: &mut Option<SamplingLoop>) {
    match sampler {
        Some(sampler) => {
            sampler.interval.tick().await;
        }
        None => future::pending::<()>().await,
    }
}

/// Read elapsed time and level from the session's device.
///
/// Returns `None` once the device has stopped capturing on its own.
pub(crate) fn take_sample(session: &mut RecordingSession) -> Option<Sample> {
    if !session.is_capturing() {
        return None;
    }

    let power = session.sample_power();

    Some(Sample {
        duration: session.elapsed(),
        level: normalize_level(power),
    })
}
