//! Wall-clock driving for a match.
//!
//! The rules never read a clock; every call takes `now_ms`. In a live
//! server one [`MatchClock`] per match supplies those timestamps, and a
//! ticker task feeds the same clock into [`MatchHandle::tick`] so sabotage
//! expiry and the voting deadline fire without player input.
//!
//! ```ignore
//! let clock = MatchClock::start();
//! handle.start(clock.now_ms()).await?;
//! let ticker = spawn_ticker(handle.clone(), clock, Duration::from_millis(250));
//! ```

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::MatchHandle;

/// Milliseconds since the match was created.
#[derive(Debug, Clone, Copy)]
pub struct MatchClock {
    origin: Instant,
}

impl MatchClock {
    /// A clock whose zero is now.
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for MatchClock {
    fn default() -> Self {
        Self::start()
    }
}

/// Spawns a task that ticks the match every `period` until the actor goes
/// away.
///
/// Late ticks are skipped rather than replayed: a tick only compares
/// timestamps, so one late tick does the work of every missed one.
pub fn spawn_ticker(handle: MatchHandle, clock: MatchClock, period: Duration) -> JoinHandle<()> {
    let period = period.max(Duration::from_millis(1));
    tokio::spawn(async move {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::debug!(period_ms = period.as_millis() as u64, "match ticker started");

        loop {
            interval.tick().await;
            if handle.tick(clock.now_ms()).await.is_err() {
                break;
            }
        }

        tracing::debug!("match ticker stopped");
    })
}
