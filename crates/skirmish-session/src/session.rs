//! A single registered client.

use skirmish_protocol::{PlayerId, ServerEvent};
use skirmish_transport::ConnectionId;
use tokio::sync::mpsc;

/// Outbound event queue of one client.
///
/// The connection handler owns the receiving half and writes each event
/// to the socket. Unbounded so a slow reader never blocks the coordinator.
pub type Outbox = mpsc::UnboundedSender<ServerEvent>;

/// An authenticated player bound to exactly one live connection.
#[derive(Debug, Clone)]
pub struct Session {
    pub player_id: PlayerId,
    pub connection_id: ConnectionId,
    pub outbox: Outbox,
}

impl Session {
    pub fn new(player_id: PlayerId, connection_id: ConnectionId, outbox: Outbox) -> Self {
        Self {
            player_id,
            connection_id,
            outbox,
        }
    }

    /// Queues an event for this client.
    ///
    /// Returns `false` if the connection's writer is already gone; the
    /// event is dropped in that case.
    pub fn send(&self, event: ServerEvent) -> bool {
        self.outbox.send(event).is_ok()
    }
}
