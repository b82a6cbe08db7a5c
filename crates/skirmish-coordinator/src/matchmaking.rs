//! Bridge between the matchmaking queue and connected clients.

use skirmish_protocol::{MatchId, MatchmakingReply, PlayerId, ServerEvent};

use crate::{Coordinator, MatchError, Persistence};

impl<S: Persistence> Coordinator<S> {
    /// Tells two paired players about each other.
    ///
    /// No record is created; the match exists once someone reports ready.
    /// A side without a session is skipped. Both queue entries are
    /// dropped.
    ///
    /// # Errors
    /// [`MatchError::AlreadyPlaying`] if either player is in a match;
    /// nothing is sent in that case.
    pub fn notify_match_found(
        &mut self,
        player1: PlayerId,
        player2: PlayerId,
    ) -> Result<MatchId, MatchError> {
        if let Some(busy) = [player1, player2]
            .into_iter()
            .find(|p| self.matches.is_playing(*p))
        {
            tracing::warn!(%player1, %player2, %busy, "pairing dropped, player already in a match");
            return Err(MatchError::AlreadyPlaying(busy));
        }

        let match_id = MatchId::for_pair(player1, player2);
        let event = ServerEvent::MatchFound {
            match_id: match_id.clone(),
            player1,
            player2,
        };
        for player in [player2, player1] {
            if !self.sessions.send(player, event.clone()) {
                tracing::warn!(%match_id, %player, "match_found undeliverable");
            }
        }

        for player in [player1, player2] {
            if let Err(e) = self.store.dequeue(player) {
                tracing::error!(%player, error = %e, "could not clear queue entry");
            }
        }

        tracing::info!(%match_id, "match found");
        Ok(match_id)
    }

    /// Joins (`join = true`) or leaves the matchmaking queue.
    ///
    /// Joining pairs immediately with the longest-waiting player whose
    /// level is within the configured range; otherwise the player waits
    /// in the queue.
    pub fn request_matchmaking(
        &mut self,
        player: PlayerId,
        join: bool,
    ) -> Result<MatchmakingReply, MatchError> {
        let level = self
            .store
            .player_level(player)?
            .ok_or(MatchError::PlayerNotFound(player))?;

        if !join {
            if !self.store.dequeue(player)? {
                return Err(MatchError::NotQueued(player));
            }
            tracing::info!(%player, "left matchmaking queue");
            return Ok(MatchmakingReply::Left);
        }

        if self.store.is_queued(player)? {
            return Err(MatchError::AlreadyQueued(player));
        }
        if self.matches.is_playing(player) {
            return Err(MatchError::AlreadyPlaying(player));
        }

        // Queued players who entered a match since queueing keep their
        // entry but are passed over.
        let mut busy = Vec::new();
        let opponent = loop {
            match self
                .store
                .find_opponent(player, level, self.config.level_range, &busy)?
            {
                Some(candidate) if self.matches.is_playing(candidate) => busy.push(candidate),
                found => break found,
            }
        };

        if let Some(opponent) = opponent {
            match self.notify_match_found(player, opponent) {
                Ok(_) => return Ok(MatchmakingReply::Paired { opponent }),
                Err(e) => tracing::warn!(%player, %opponent, error = %e, "pairing refused"),
            }
        }

        self.store.enqueue(player)?;
        tracing::info!(%player, level, "added to matchmaking queue");
        Ok(MatchmakingReply::Queued)
    }
}
