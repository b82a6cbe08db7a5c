//! Wire protocol for Skirmish.
//!
//! - **Types** ([`PlayerId`], [`MatchId`], [`ServerEvent`], [`ClientEvent`])
//!   — identities and the events that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — events to/from frames.
//! - **Errors** ([`ProtocolError`]).
//!
//! The protocol layer knows nothing about connections or matches; it only
//! names things and serializes them.
//!
//! ```text
//! Transport (frames) → Protocol (events) → Session / Coordinator
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    ClientEvent, MatchId, MatchmakingReply, Payload, PlayerId, Presence,
    ServerEvent, VisitAction, payload_target,
};
