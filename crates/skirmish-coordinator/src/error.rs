//! Error types for the coordinator layer.

use skirmish_protocol::{MatchId, PlayerId, ProtocolError};
use skirmish_session::SessionError;

/// Errors from match, forwarding and matchmaking operations.
///
/// The coordinator actor logs these and carries on; they only reach a
/// caller through the synchronous API or a handle's reply.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// No match record with this id.
    #[error("match {0} not found")]
    NotFound(MatchId),

    /// The player is already in the playing index.
    #[error("player {0} is already in a match")]
    AlreadyPlaying(PlayerId),

    /// The player is not (and cannot become) part of this match.
    #[error("player {0} is not a participant of match {1}")]
    NotParticipant(PlayerId, MatchId),

    /// Both participant slots are taken.
    #[error("match {0} is full")]
    MatchFull(MatchId),

    /// The operation needs a live session, or the player directory does
    /// not know the identity.
    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),

    #[error("player {0} is already in the matchmaking queue")]
    AlreadyQueued(PlayerId),

    #[error("player {0} is not in the matchmaking queue")]
    NotQueued(PlayerId),

    /// The match is in a phase or kind that does not allow the operation.
    #[error("invalid match state: {0}")]
    InvalidState(String),

    /// A client payload broke a protocol rule (missing `target`, ...).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Registering the connection failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A persistence collaborator failed.
    #[error("store failure: {0}")]
    Store(#[from] StoreError),

    /// The coordinator task has stopped or its channel is closed.
    #[error("coordinator is unavailable")]
    Unavailable,
}

/// Failure reported by a persistence collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not complete the operation.
    #[error("backend error: {0}")]
    Backend(String),
}
