//! The connection registry: who is connected, and on which connection.
//!
//! Two maps kept in lockstep so both directions are O(1): the handler
//! only knows its [`ConnectionId`] when the socket closes, while the
//! coordinator addresses clients by [`PlayerId`].
//!
//! Not thread-safe on its own. The coordinator actor owns the single
//! instance and is the only writer.

use std::collections::HashMap;

use skirmish_protocol::{PlayerId, ServerEvent};
use skirmish_transport::ConnectionId;

use crate::{Outbox, Session, SessionError};

/// Maps authenticated identities to live connections.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<PlayerId, Session>,
    owners: HashMap<ConnectionId, PlayerId>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `player_id` to a connection.
    ///
    /// # Errors
    /// [`SessionError::AlreadyConnected`] if the identity already has a
    /// session. The existing session is kept.
    pub fn register(
        &mut self,
        player_id: PlayerId,
        connection_id: ConnectionId,
        outbox: Outbox,
    ) -> Result<(), SessionError> {
        if self.sessions.contains_key(&player_id) {
            return Err(SessionError::AlreadyConnected(player_id));
        }

        self.owners.insert(connection_id, player_id);
        self.sessions
            .insert(player_id, Session::new(player_id, connection_id, outbox));

        tracing::info!(%player_id, %connection_id, "session registered");
        Ok(())
    }

    /// Removes whatever session is bound to `connection_id`.
    ///
    /// Idempotent: unknown or already-removed connections return `None`.
    /// A connection that was refused at registration never owned a
    /// session, so closing it cannot evict the rightful owner.
    pub fn unregister(&mut self, connection_id: ConnectionId) -> Option<PlayerId> {
        let player_id = self.owners.remove(&connection_id)?;
        self.sessions.remove(&player_id);
        tracing::info!(%player_id, %connection_id, "session removed");
        Some(player_id)
    }

    pub fn lookup(&self, player_id: PlayerId) -> Option<&Session> {
        self.sessions.get(&player_id)
    }

    pub fn resolve(&self, connection_id: ConnectionId) -> Option<PlayerId> {
        self.owners.get(&connection_id).copied()
    }

    pub fn is_connected(&self, player_id: PlayerId) -> bool {
        self.sessions.contains_key(&player_id)
    }

    /// Best-effort delivery to one player.
    ///
    /// Returns `false` when the player has no session or its writer is
    /// gone.
    pub fn send(&self, player_id: PlayerId, event: ServerEvent) -> bool {
        match self.sessions.get(&player_id) {
            Some(session) => session.send(event),
            None => {
                tracing::debug!(%player_id, "no session, event dropped");
                false
            }
        }
    }

    /// Sends a copy of `event` to every live session.
    pub fn broadcast(&self, event: &ServerEvent) {
        for session in self.sessions.values() {
            session.send(event.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
