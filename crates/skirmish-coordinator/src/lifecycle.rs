//! Match lifecycle: ready, start, countdown, end.
//!
//! ```text
//! player_ready ──→ [AwaitingReady] ──player_ready──→ [Active] ──→ end_match
//! island_visit accept ─────────────────────────────→ [Active] ──→ end_match / end_visit
//! ```
//!
//! Every end path goes through [`Coordinator::end_match`] or
//! [`Coordinator::end_visit`], which delete the record and clear the
//! playing index in one step.

use serde_json::Value;
use skirmish_protocol::{MatchId, Payload, PlayerId, ServerEvent, VisitAction};

use crate::forward::stamp_sender;
use crate::{Coordinator, Match, MatchError, MatchKind, Persistence, Settlement};

/// What `player_ready` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyOutcome {
    /// Recorded; the opponent has not reported yet.
    Waiting,
    /// The match just became active. `countdown` carries the epoch to bind
    /// a countdown to, for competitive matches.
    Started { countdown: Option<u64> },
}

/// Builds the `island_visit` notice sent when a visit ends.
pub(crate) fn visit_notice(request: &str) -> ServerEvent {
    let mut payload = Payload::new();
    payload.insert("request".into(), Value::from(request));
    ServerEvent::IslandVisit(payload)
}

impl<S: Persistence> Coordinator<S> {
    /// Records that `player_id` has loaded `match_id`.
    ///
    /// The first report creates a competitive record; the second starts
    /// the match and sends `match_start` to both participants.
    ///
    /// # Errors
    /// - [`MatchError::PlayerNotFound`] if the player has no session
    /// - [`MatchError::AlreadyPlaying`] if the player is in any match
    /// - [`MatchError::NotParticipant`] if the id does not name the player
    /// - [`MatchError::MatchFull`] if both slots are taken
    pub fn player_ready(
        &mut self,
        player_id: PlayerId,
        match_id: &MatchId,
    ) -> Result<ReadyOutcome, MatchError> {
        if !self.sessions.is_connected(player_id) {
            return Err(MatchError::PlayerNotFound(player_id));
        }
        if self.matches.is_playing(player_id) {
            return Err(MatchError::AlreadyPlaying(player_id));
        }
        if !match_id.names(player_id) {
            return Err(MatchError::NotParticipant(player_id, match_id.clone()));
        }

        if self.matches.get(match_id).is_none() {
            let epoch = self.next_epoch();
            let ticks = self.config.countdown_ticks();
            self.matches
                .insert(Match::competitive(match_id.clone(), player_id, ticks, epoch))?;
            tracing::info!(%match_id, %player_id, "player ready, waiting for opponent");
            return Ok(ReadyOutcome::Waiting);
        }

        let record = self.matches.join(match_id, player_id)?;
        if !record.phase.is_active() {
            return Ok(ReadyOutcome::Waiting);
        }
        let participants = record.participants().to_vec();
        let countdown = record.is_competitive().then_some(record.epoch);

        for participant in participants {
            self.send_to(participant, ServerEvent::MatchStart {});
        }
        tracing::info!(%match_id, %player_id, "match started");

        Ok(ReadyOutcome::Started { countdown })
    }

    /// Starts a friend visit between `sender` (who accepted) and `target`.
    ///
    /// `payload` is the client's `island_visit` data; it reaches `target`
    /// with `sender` attached.
    pub fn accept_friend_visit(
        &mut self,
        sender: PlayerId,
        target: PlayerId,
        payload: Payload,
    ) -> Result<MatchId, MatchError> {
        for player in [sender, target] {
            if !self.sessions.is_connected(player) {
                return Err(MatchError::PlayerNotFound(player));
            }
            if self.matches.is_playing(player) {
                return Err(MatchError::AlreadyPlaying(player));
            }
        }

        let match_id = MatchId::for_pair(sender, target);
        let epoch = self.next_epoch();
        self.matches
            .insert(Match::friend_visit(match_id.clone(), sender, target, epoch))?;
        tracing::info!(%match_id, %sender, %target, "friend visit started");

        self.send_to(target, ServerEvent::IslandVisit(stamp_sender(payload, sender)));
        Ok(match_id)
    }

    /// Ends a match. Unknown ids are a no-op, so ending twice is safe.
    ///
    /// Competitive: stakes are settled first; if the ledger fails the
    /// record stays and the error is returned. Then every participant
    /// gets `match_end {winner_id}`.
    ///
    /// Friend visit: `winner` is the participant told to leave the island.
    pub fn end_match(
        &mut self,
        match_id: &MatchId,
        winner: Option<PlayerId>,
    ) -> Result<(), MatchError> {
        let Some(record) = self.matches.get(match_id) else {
            tracing::debug!(%match_id, "end_match on unknown match, ignoring");
            return Ok(());
        };

        if let MatchKind::Competitive { .. } = record.kind {
            let settlement = Settlement {
                match_id: match_id.clone(),
                participants: record.participants().to_vec(),
                winner,
            };
            self.store.settle(&settlement)?;
        }

        let Some(record) = self.matches.remove(match_id) else {
            return Ok(());
        };

        match record.kind {
            MatchKind::Competitive { .. } => {
                for participant in record.participants() {
                    self.send_to(*participant, ServerEvent::MatchEnd { winner_id: winner });
                }
                tracing::info!(
                    %match_id,
                    winner = ?winner.map(|w| w.0),
                    "match ended"
                );
            }
            MatchKind::FriendVisit => {
                if let Some(leaving) = winner.filter(|w| record.contains(*w)) {
                    self.send_to(leaving, visit_notice(VisitAction::Leave.as_str()));
                }
                tracing::info!(%match_id, "friend visit ended");
            }
        }
        Ok(())
    }

    /// Ends a friend visit because `initiator` left or kicked the other
    /// side. Only the other participant is told, with the same literal.
    pub fn end_visit(
        &mut self,
        match_id: &MatchId,
        initiator: PlayerId,
        request: &VisitAction,
    ) -> Result<(), MatchError> {
        let record = self
            .matches
            .get(match_id)
            .ok_or_else(|| MatchError::NotFound(match_id.clone()))?;
        if !record.contains(initiator) {
            return Err(MatchError::NotParticipant(initiator, match_id.clone()));
        }
        if record.is_competitive() {
            return Err(MatchError::InvalidState(format!(
                "{} cannot end competitive match {match_id}",
                request.as_str()
            )));
        }

        if let Some(record) = self.matches.remove(match_id) {
            for participant in record.participants().iter().filter(|p| **p != initiator) {
                self.send_to(*participant, visit_notice(request.as_str()));
            }
        }
        tracing::info!(%match_id, %initiator, request = request.as_str(), "friend visit ended");
        Ok(())
    }

    /// Ends the player's match because their connection is gone.
    ///
    /// The other participant wins (or, in a visit, is told to leave).
    /// A lone participant still waiting for an opponent ends as a draw.
    pub fn player_disconnected(&mut self, player_id: PlayerId) -> Result<(), MatchError> {
        let Some(match_id) = self.matches.match_of(player_id).cloned() else {
            return Ok(());
        };
        let other = self
            .matches
            .get(&match_id)
            .and_then(|record| record.other(player_id));
        tracing::info!(%match_id, %player_id, "participant gone, ending match");
        self.end_match(&match_id, other)
    }

    /// Forfeits the player's current match without dropping the session.
    pub fn player_leaving(&mut self, player_id: PlayerId) -> Result<(), MatchError> {
        if !self.matches.is_playing(player_id) {
            return Err(MatchError::InvalidState(format!(
                "player {player_id} is not in a match"
            )));
        }
        self.player_disconnected(player_id)
    }

    /// `reporter` destroyed the opposing altar and wins.
    ///
    /// Only honoured for an active competitive match the reporter is in.
    pub fn win_condition_reached(
        &mut self,
        match_id: &MatchId,
        reporter: PlayerId,
    ) -> Result<(), MatchError> {
        let record = self
            .matches
            .get(match_id)
            .ok_or_else(|| MatchError::NotFound(match_id.clone()))?;
        if !record.contains(reporter) {
            return Err(MatchError::NotParticipant(reporter, match_id.clone()));
        }
        if !record.is_competitive() || !record.phase.is_active() {
            return Err(MatchError::InvalidState(format!(
                "match {match_id} is not an active competitive match"
            )));
        }
        self.end_match(match_id, Some(reporter))
    }

    /// `periods` countdown periods elapsed for `(match_id, epoch)`; more
    /// than one after the countdown task overran.
    ///
    /// Decrements the timer and sends `match_timer` to both participants;
    /// reaching zero ends the match as a draw. Returns whether the
    /// countdown should keep running: `false` once the match is gone or
    /// was replaced by a newer one with the same id. A failed settlement
    /// at zero keeps it running so the next period retries.
    pub fn countdown_tick(&mut self, match_id: &MatchId, epoch: u64, periods: u32) -> bool {
        let Some(record) = self.matches.get_mut(match_id) else {
            return false;
        };
        if record.epoch != epoch || !record.phase.is_active() {
            return false;
        }
        let Some(remaining) = record.time_remaining() else {
            return false;
        };

        let time_left = if remaining > 0 {
            let time_left = record.tick_down(periods.max(1)).unwrap_or(0);
            let participants = record.participants().to_vec();
            for participant in participants {
                self.send_to(participant, ServerEvent::MatchTimer { time_left });
            }
            time_left
        } else {
            0
        };

        if time_left > 0 {
            return true;
        }

        tracing::info!(%match_id, "match timed out");
        match self.end_match(match_id, None) {
            Ok(()) => false,
            Err(e) => {
                tracing::error!(%match_id, error = %e, "could not end timed-out match, retrying");
                true
            }
        }
    }
}
