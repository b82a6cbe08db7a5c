//! Match records and the playing index.

use std::collections::HashMap;

use skirmish_protocol::{MatchId, PlayerId};

use crate::{MatchError, MatchPhase};

/// Participants per match. The whole protocol is head-to-head.
pub const MAX_PARTICIPANTS: usize = 2;

/// What kind of match a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Staked head-to-head match with a countdown.
    Competitive { time_remaining: u32 },
    /// One player visiting another's island. No stakes, no timer.
    FriendVisit,
}

/// One live match.
#[derive(Debug, Clone)]
pub struct Match {
    pub id: MatchId,
    participants: Vec<PlayerId>,
    pub kind: MatchKind,
    pub phase: MatchPhase,
    /// Generation number. A countdown bound to an older epoch never
    /// drives a newer match that reuses the id.
    pub epoch: u64,
}

impl Match {
    /// A competitive match created by its first ready participant.
    pub fn competitive(id: MatchId, first: PlayerId, time_remaining: u32, epoch: u64) -> Self {
        Self {
            id,
            participants: vec![first],
            kind: MatchKind::Competitive { time_remaining },
            phase: MatchPhase::AwaitingReady,
            epoch,
        }
    }

    /// A friend visit; both sides are present from the start.
    pub fn friend_visit(id: MatchId, host: PlayerId, guest: PlayerId, epoch: u64) -> Self {
        Self {
            id,
            participants: vec![host, guest],
            kind: MatchKind::FriendVisit,
            phase: MatchPhase::Active,
            epoch,
        }
    }

    pub fn participants(&self) -> &[PlayerId] {
        &self.participants
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.participants.contains(&player)
    }

    /// The participant that is not `player`, if there is one.
    pub fn other(&self, player: PlayerId) -> Option<PlayerId> {
        self.participants.iter().copied().find(|p| *p != player)
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= MAX_PARTICIPANTS
    }

    pub fn is_competitive(&self) -> bool {
        matches!(self.kind, MatchKind::Competitive { .. })
    }

    pub fn time_remaining(&self) -> Option<u32> {
        match self.kind {
            MatchKind::Competitive { time_remaining } => Some(time_remaining),
            MatchKind::FriendVisit => None,
        }
    }

    /// Adds a participant. The second one activates the match.
    pub(crate) fn add_participant(&mut self, player: PlayerId) -> Result<(), MatchError> {
        if self.is_full() {
            return Err(MatchError::MatchFull(self.id.clone()));
        }
        self.participants.push(player);
        if self.is_full() {
            self.phase = MatchPhase::Active;
        }
        Ok(())
    }

    /// Takes `periods` off the countdown and returns the new value.
    ///
    /// `None` for friend visits.
    pub(crate) fn tick_down(&mut self, periods: u32) -> Option<u32> {
        match &mut self.kind {
            MatchKind::Competitive { time_remaining } => {
                *time_remaining = time_remaining.saturating_sub(periods);
                Some(*time_remaining)
            }
            MatchKind::FriendVisit => None,
        }
    }
}

/// All live matches plus the `player → match` index.
///
/// Every participant of every record is indexed, and nothing else is.
/// A player therefore appears in at most one match.
#[derive(Debug, Default)]
pub struct MatchTable {
    matches: HashMap<MatchId, Match>,
    playing: HashMap<PlayerId, MatchId>,
}

impl MatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &MatchId) -> Option<&Match> {
        self.matches.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &MatchId) -> Option<&mut Match> {
        self.matches.get_mut(id)
    }

    /// The match `player` is currently in.
    pub fn match_of(&self, player: PlayerId) -> Option<&MatchId> {
        self.playing.get(&player)
    }

    pub fn is_playing(&self, player: PlayerId) -> bool {
        self.playing.contains_key(&player)
    }

    /// Stores a new record and indexes its participants.
    ///
    /// # Errors
    /// [`MatchError::AlreadyPlaying`] if any participant is already
    /// indexed; the table is left unchanged.
    pub(crate) fn insert(&mut self, record: Match) -> Result<(), MatchError> {
        if let Some(busy) = record.participants().iter().find(|p| self.is_playing(**p)) {
            return Err(MatchError::AlreadyPlaying(*busy));
        }
        for player in record.participants() {
            self.playing.insert(*player, record.id.clone());
        }
        self.matches.insert(record.id.clone(), record);
        Ok(())
    }

    /// Adds `player` to an existing record and indexes them.
    pub(crate) fn join(&mut self, id: &MatchId, player: PlayerId) -> Result<&Match, MatchError> {
        if self.is_playing(player) {
            return Err(MatchError::AlreadyPlaying(player));
        }
        let record = self
            .matches
            .get_mut(id)
            .ok_or_else(|| MatchError::NotFound(id.clone()))?;
        record.add_participant(player)?;
        self.playing.insert(player, id.clone());
        Ok(record)
    }

    /// Deletes a record and un-indexes its participants.
    pub(crate) fn remove(&mut self, id: &MatchId) -> Option<Match> {
        let record = self.matches.remove(id)?;
        for player in record.participants() {
            if self.playing.get(player) == Some(id) {
                self.playing.remove(player);
            }
        }
        Some(record)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Number of players in the playing index.
    pub fn playing_count(&self) -> usize {
        self.playing.len()
    }
}
