//! Error types for the protocol layer.
//!
//! Each crate in Skirmish defines its own error enum. A `ProtocolError`
//! always means a frame could not be turned into (or out of) an event;
//! networking and match rules report through their own types.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing an event failed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// A frame was not valid JSON or did not match any known event.
    ///
    /// Common causes: unknown `event` name, missing `data` fields, or
    /// fields of the wrong type.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The frame decoded but breaks a protocol rule, e.g. a forwarded
    /// payload without a usable `target`.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
