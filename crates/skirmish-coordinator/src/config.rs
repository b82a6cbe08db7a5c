//! Match configuration and phase.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// MatchConfig
// ---------------------------------------------------------------------------

/// Tunables for the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Length of a competitive match. The countdown starts here.
    pub match_duration: Duration,

    /// Interval between two `match_timer` events.
    pub tick_period: Duration,

    /// Maximum level difference between two players paired by the queue.
    pub level_range: u32,

    /// Capacity of the coordinator's command channel. Callers wait when
    /// it is full.
    pub channel_capacity: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            match_duration: Duration::from_secs(600),
            tick_period: Duration::from_secs(1),
            level_range: 1,
            channel_capacity: 256,
        }
    }
}

impl MatchConfig {
    /// Number of countdown ticks in a full competitive match.
    ///
    /// Never zero, so a match always emits at least one `match_timer`.
    pub fn countdown_ticks(&self) -> u32 {
        let period = self.tick_period.as_millis().max(1);
        let ticks = self.match_duration.as_millis() / period;
        u32::try_from(ticks).unwrap_or(u32::MAX).max(1)
    }
}

// ---------------------------------------------------------------------------
// MatchPhase
// ---------------------------------------------------------------------------

/// Where a match record is in its lifecycle.
///
/// ```text
/// AwaitingReady → Active → (record removed)
/// ```
///
/// Friend visits are created directly in `Active`. There is no explicit
/// ended phase: an ended match simply no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Created by the first `player_ready`; waiting for the second.
    AwaitingReady,
    /// Both participants present.
    Active,
}

impl MatchPhase {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AwaitingReady => write!(f, "AwaitingReady"),
            Self::Active => write!(f, "Active"),
        }
    }
}
