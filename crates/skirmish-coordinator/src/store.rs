//! Persistence collaborators.
//!
//! The coordinator owns no durable state. Player levels, queue entries,
//! staked gems and chat history live behind these traits so the game's
//! database layer can plug in. [`MemoryStore`] implements all of them in
//! memory for the demo server and the tests.
//!
//! Calls are synchronous and made from inside the coordinator task. A
//! slow backend therefore stalls every match for the duration of the call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use skirmish_protocol::{MatchId, PlayerId};

use crate::StoreError;

/// The outcome of a competitive match, as handed to the ledger.
///
/// Keyed by `match_id` so a durable ledger can reject a replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub match_id: MatchId,
    pub participants: Vec<PlayerId>,
    /// `None` is a draw: every stake goes back to its owner.
    pub winner: Option<PlayerId>,
}

/// A chat line to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub user_id: PlayerId,
    pub message: String,
}

/// Looks up players known to the game.
pub trait PlayerDirectory: Send + 'static {
    /// The player's level, or `None` if the player does not exist.
    fn player_level(&self, player: PlayerId) -> Result<Option<u32>, StoreError>;
}

/// The matchmaking queue.
pub trait QueueStore: Send + 'static {
    fn is_queued(&self, player: PlayerId) -> Result<bool, StoreError>;

    fn enqueue(&mut self, player: PlayerId) -> Result<(), StoreError>;

    /// Removes the player's entry. Returns `false` if there was none.
    fn dequeue(&mut self, player: PlayerId) -> Result<bool, StoreError>;

    /// First queued player other than `player` and outside `excluded`
    /// whose level is within `range` of `level` (inclusive).
    fn find_opponent(
        &self,
        player: PlayerId,
        level: u32,
        range: u32,
        excluded: &[PlayerId],
    ) -> Result<Option<PlayerId>, StoreError>;
}

/// Moves staked resources when a competitive match ends.
pub trait StakeLedger: Send + 'static {
    /// Applies the outcome. Must be durable when it returns `Ok`.
    ///
    /// Winner set: every staked gem of every participant becomes the
    /// winner's and is unstaked. Draw: stakes are cleared in place.
    fn settle(&mut self, settlement: &Settlement) -> Result<(), StoreError>;
}

/// Chat history.
pub trait ChatLog: Send + 'static {
    fn record(&mut self, entry: &ChatRecord) -> Result<(), StoreError>;
}

/// Everything the coordinator needs from persistence.
pub trait Persistence: PlayerDirectory + QueueStore + StakeLedger + ChatLog {}

impl<T> Persistence for T where T: PlayerDirectory + QueueStore + StakeLedger + ChatLog {}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// A gem owned by a player, possibly staked in a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gem {
    pub id: u64,
    pub owner: PlayerId,
    pub staked: bool,
}

#[derive(Debug, Default)]
struct MemoryState {
    levels: HashMap<PlayerId, u32>,
    /// Oldest entry first; `find_opponent` returns the longest waiter.
    queue: Vec<PlayerId>,
    gems: Vec<Gem>,
    chat: Vec<ChatRecord>,
    settlements: Vec<Settlement>,
    fail_settlement: bool,
    fail_chat: bool,
}

/// In-memory implementation of every persistence trait.
///
/// Clones share the same state, so a test can hand one clone to the
/// coordinator and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a player with a level.
    pub fn add_player(&self, player: PlayerId, level: u32) {
        self.state().levels.insert(player, level);
    }

    /// Gives `owner` a new gem and returns its id.
    pub fn add_gem(&self, owner: PlayerId, staked: bool) -> u64 {
        let mut state = self.state();
        let id = state.gems.len() as u64 + 1;
        state.gems.push(Gem { id, owner, staked });
        id
    }

    pub fn gems_of(&self, owner: PlayerId) -> Vec<Gem> {
        self.state()
            .gems
            .iter()
            .filter(|g| g.owner == owner)
            .cloned()
            .collect()
    }

    pub fn queued(&self) -> Vec<PlayerId> {
        self.state().queue.clone()
    }

    pub fn chat_history(&self) -> Vec<ChatRecord> {
        self.state().chat.clone()
    }

    pub fn settlements(&self) -> Vec<Settlement> {
        self.state().settlements.clone()
    }

    /// Makes every following `settle` call fail until reset.
    pub fn set_fail_settlement(&self, fail: bool) {
        self.state().fail_settlement = fail;
    }

    /// Makes every following chat `record` call fail until reset.
    pub fn set_fail_chat(&self, fail: bool) {
        self.state().fail_chat = fail;
    }
}

impl PlayerDirectory for MemoryStore {
    fn player_level(&self, player: PlayerId) -> Result<Option<u32>, StoreError> {
        Ok(self.state().levels.get(&player).copied())
    }
}

impl QueueStore for MemoryStore {
    fn is_queued(&self, player: PlayerId) -> Result<bool, StoreError> {
        Ok(self.state().queue.contains(&player))
    }

    fn enqueue(&mut self, player: PlayerId) -> Result<(), StoreError> {
        let mut state = self.state();
        if !state.queue.contains(&player) {
            state.queue.push(player);
        }
        Ok(())
    }

    fn dequeue(&mut self, player: PlayerId) -> Result<bool, StoreError> {
        let mut state = self.state();
        let before = state.queue.len();
        state.queue.retain(|p| *p != player);
        Ok(state.queue.len() != before)
    }

    fn find_opponent(
        &self,
        player: PlayerId,
        level: u32,
        range: u32,
        excluded: &[PlayerId],
    ) -> Result<Option<PlayerId>, StoreError> {
        let state = self.state();
        let low = level.saturating_sub(range);
        let high = level.saturating_add(range);
        Ok(state.queue.iter().copied().find(|candidate| {
            *candidate != player
                && !excluded.contains(candidate)
                && state
                    .levels
                    .get(candidate)
                    .is_some_and(|l| (low..=high).contains(l))
        }))
    }
}

impl StakeLedger for MemoryStore {
    fn settle(&mut self, settlement: &Settlement) -> Result<(), StoreError> {
        let mut state = self.state();
        if state.fail_settlement {
            return Err(StoreError::Backend("settlement rejected".into()));
        }
        for gem in state
            .gems
            .iter_mut()
            .filter(|g| g.staked && settlement.participants.contains(&g.owner))
        {
            if let Some(winner) = settlement.winner {
                gem.owner = winner;
            }
            gem.staked = false;
        }
        state.settlements.push(settlement.clone());
        Ok(())
    }
}

impl ChatLog for MemoryStore {
    fn record(&mut self, entry: &ChatRecord) -> Result<(), StoreError> {
        let mut state = self.state();
        if state.fail_chat {
            return Err(StoreError::Backend("chat log unavailable".into()));
        }
        state.chat.push(entry.clone());
        Ok(())
    }
}
