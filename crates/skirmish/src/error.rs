//! Unified error type for the Skirmish server.

use skirmish_coordinator::MatchError;
use skirmish_protocol::ProtocolError;
use skirmish_session::SessionError;
use skirmish_transport::TransportError;

/// Top-level error that wraps every layer's error.
///
/// The `#[from]` conversions let `?` lift sub-crate errors directly.
#[derive(Debug, thiserror::Error)]
pub enum SkirmishError {
    /// Connection, send or receive failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Encode, decode or protocol rule failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Authentication or registration failure.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Match coordination failure, including a stopped coordinator.
    #[error(transparent)]
    Match(#[from] MatchError),
}
