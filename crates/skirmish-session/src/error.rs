//! Error types for the session layer.

use skirmish_protocol::PlayerId;

/// Errors raised while admitting or addressing a client.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The [`Authenticator`](crate::Authenticator) rejected the token.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The identity already has a live session. The newer connection is
    /// refused; the existing one is left untouched.
    #[error("player {0} already has an active session")]
    AlreadyConnected(PlayerId),

    /// No live session for this player.
    #[error("session not found for player {0}")]
    NotFound(PlayerId),
}
