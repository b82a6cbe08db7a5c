//! Per-match countdown task.
//!
//! One task per competitive match, bound to `(match_id, epoch)`. Each
//! period it asks the coordinator to tick; the coordinator answers
//! whether the match is still alive. The task holds only a weak sender,
//! so it never keeps a stopped coordinator's channel open.

use std::time::Duration;

use skirmish_protocol::MatchId;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant};
use tracing::{debug, warn};

use crate::actor::Command;

/// Fixed-period clock that skips ahead when it falls behind.
///
/// A late wake-up schedules the next tick one period from now instead of
/// firing a burst of catch-up ticks.
#[derive(Debug)]
pub(crate) struct CountdownClock {
    period: Duration,
    next: Instant,
    ticks: u64,
}

impl CountdownClock {
    pub(crate) fn new(period: Duration) -> Self {
        Self {
            period,
            next: Instant::now() + period,
            ticks: 0,
        }
    }

    /// Sleeps until the next tick. Returns how many periods were skipped.
    pub(crate) async fn wait(&mut self) -> u64 {
        time::sleep_until(self.next).await;

        let now = Instant::now();
        self.ticks += 1;

        let late_by = now.saturating_duration_since(self.next);
        let mut skipped = 0;
        if late_by > self.period / 10 {
            skipped = (late_by.as_nanos() / self.period.as_nanos().max(1)) as u64;
            if skipped > 0 {
                warn!(
                    tick = self.ticks,
                    skipped,
                    late_ms = late_by.as_secs_f64() * 1000.0,
                    "countdown overrun, skipping ahead"
                );
            }
        }
        self.next = now + self.period;
        skipped
    }
}

/// Drives one match's countdown until the coordinator says stop.
pub(crate) async fn run(
    commands: mpsc::WeakSender<Command>,
    match_id: MatchId,
    epoch: u64,
    period: Duration,
) {
    let mut clock = CountdownClock::new(period);
    debug!(%match_id, epoch, "countdown started");

    loop {
        let skipped = clock.wait().await;
        let periods = u32::try_from(skipped.saturating_add(1)).unwrap_or(u32::MAX);

        let Some(sender) = commands.upgrade() else {
            break;
        };
        let (reply, alive) = oneshot::channel();
        let sent = sender
            .send(Command::Countdown {
                match_id: match_id.clone(),
                epoch,
                periods,
                reply,
            })
            .await;
        drop(sender);

        if sent.is_err() || !alive.await.unwrap_or(false) {
            break;
        }
    }

    debug!(%match_id, epoch, "countdown stopped");
}
