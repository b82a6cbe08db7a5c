//! The synchronous coordinator core.
//!
//! [`Coordinator`] owns the registry, the match table and the
//! persistence collaborator. Every public operation runs to completion
//! without awaiting, which is what lets the actor in `actor.rs` process
//! commands strictly one at a time. Operations are split across
//! `lifecycle.rs`, `forward.rs`, `matchmaking.rs` and `chat.rs`.

use skirmish_protocol::{PlayerId, ServerEvent};
use skirmish_session::{Outbox, SessionError, SessionRegistry};
use skirmish_transport::ConnectionId;

use crate::{MatchConfig, MatchTable, Persistence};

/// All coordinator state.
pub struct Coordinator<S> {
    pub(crate) sessions: SessionRegistry,
    pub(crate) matches: MatchTable,
    pub(crate) store: S,
    pub(crate) config: MatchConfig,
    next_epoch: u64,
}

impl<S: Persistence> Coordinator<S> {
    pub fn new(store: S, config: MatchConfig) -> Self {
        Self {
            sessions: SessionRegistry::new(),
            matches: MatchTable::new(),
            store,
            config,
            next_epoch: 0,
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn matches(&self) -> &MatchTable {
        &self.matches
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Registers an authenticated client.
    ///
    /// # Errors
    /// [`SessionError::AlreadyConnected`] if the identity already has a
    /// session. The caller tells the client and closes the connection.
    pub fn connect(
        &mut self,
        player_id: PlayerId,
        connection_id: ConnectionId,
        outbox: Outbox,
    ) -> Result<(), SessionError> {
        self.sessions.register(player_id, connection_id, outbox)
    }

    /// Tears down everything bound to a closed connection.
    ///
    /// Order: end the player's match (the session is still registered
    /// so the forfeit is attributed), drop any queue entry, then remove
    /// the session. Idempotent; returns the player that was removed.
    pub fn disconnect(&mut self, connection_id: ConnectionId) -> Option<PlayerId> {
        let player_id = self.sessions.resolve(connection_id)?;

        if let Err(e) = self.player_disconnected(player_id) {
            tracing::error!(%player_id, error = %e, "match teardown on disconnect failed");
        }
        match self.store.dequeue(player_id) {
            Ok(true) => tracing::debug!(%player_id, "removed from matchmaking queue"),
            Ok(false) => {}
            Err(e) => tracing::error!(%player_id, error = %e, "queue cleanup failed"),
        }

        self.sessions.unregister(connection_id)
    }

    pub(crate) fn next_epoch(&mut self) -> u64 {
        let epoch = self.next_epoch;
        self.next_epoch += 1;
        epoch
    }

    /// Best-effort send; undeliverable events are dropped.
    pub(crate) fn send_to(&self, player_id: PlayerId, event: ServerEvent) {
        self.sessions.send(player_id, event);
    }
}
