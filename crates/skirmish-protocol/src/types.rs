//! Identity types and the events that travel on the wire.
//!
//! Every frame is a JSON object `{"event": <name>, "data": {...}}`, the
//! same shape a Socket.IO client emits, so browser clients map one event
//! name to one handler.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::ProtocolError;

/// Opaque JSON object carried by `forward` and `island_visit`.
///
/// The coordinator never interprets it beyond reading `target` and
/// `request` and stamping `sender` onto it.
pub type Payload = Map<String, Value>;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Stable player identity, owned by the external player store.
///
/// Serialized as a plain number: `PlayerId(42)` is `42` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl PlayerId {
    /// Reads an identity from a loosely typed JSON value.
    ///
    /// Clients send ids both as numbers and as numeric strings
    /// (`"target": "7"`), so both are accepted.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(PlayerId),
            Value::String(s) => s.trim().parse().ok().map(PlayerId),
            _ => None,
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// Identifier of a match: `"{idA}-{idB}"` built from the two participants.
///
/// Deterministic, so both clients can name the match without a server
/// round-trip. Unique only while the match is alive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    /// Builds the id for a pairing; order matters (`1-2` is not `2-1`).
    pub fn for_pair(first: PlayerId, second: PlayerId) -> Self {
        Self(format!("{}-{}", first.0, second.0))
    }

    /// Splits the id back into the two identities it was built from.
    ///
    /// Returns `None` for ids that do not follow the `"{a}-{b}"` scheme.
    pub fn participants(&self) -> Option<(PlayerId, PlayerId)> {
        let (a, b) = self.0.split_once('-')?;
        Some((PlayerId(a.parse().ok()?), PlayerId(b.parse().ok()?)))
    }

    /// Returns `true` if `player` is one of the two identities in the id.
    pub fn names(&self, player: PlayerId) -> bool {
        self.participants()
            .is_some_and(|(a, b)| a == player || b == player)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MatchId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for MatchId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Small vocabularies
// ---------------------------------------------------------------------------

/// Answer to an online-status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    /// No live session.
    Offline,
    /// Connected, not in a match.
    Online,
    /// Connected and in the playing index.
    InMatch,
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Offline => "offline",
            Self::Online => "online",
            Self::InMatch => "in_match",
        })
    }
}

/// The `request` field of an `island_visit` event.
///
/// Only `accept`, `leave` and `kick` change coordinator state; anything
/// else (invitations, declines) is relayed to the target untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitAction {
    Accept,
    Leave,
    Kick,
    Other(String),
}

impl VisitAction {
    pub fn parse(request: &str) -> Self {
        match request {
            "accept" => Self::Accept,
            "leave" => Self::Leave,
            "kick" => Self::Kick,
            other => Self::Other(other.to_owned()),
        }
    }

    /// The literal sent on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Accept => "accept",
            Self::Leave => "leave",
            Self::Kick => "kick",
            Self::Other(s) => s,
        }
    }
}

/// Outcome of a matchmaking queue request, sent back to the requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchmakingReply {
    /// Waiting in the queue for an opponent in level range.
    Queued,
    /// An opponent was found; `match_found` follows.
    Paired { opponent: PlayerId },
    /// Removed from the queue.
    Left,
    /// The request was refused (already queued, not queued, ...).
    Rejected { reason: String },
}

// ---------------------------------------------------------------------------
// ServerEvent — coordinator → client
// ---------------------------------------------------------------------------

/// Every event the server emits.
///
/// Variants without fields are written as `Name {}` so they serialize
/// with an empty `data` object instead of omitting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// The handshake succeeded and the session is registered.
    HandshakeAck { player_id: PlayerId },

    /// This identity already has a live session; the new connection is
    /// refused.
    AlreadyConnected {},

    HeartbeatAck { client_time: u64, server_time: u64 },

    /// Two queued players were paired. Both must answer `player_ready`.
    MatchFound {
        match_id: MatchId,
        player1: PlayerId,
        player2: PlayerId,
    },

    /// Both participants are ready.
    MatchStart {},

    /// Seconds left in a competitive match.
    MatchTimer { time_left: u32 },

    /// Last event of a match. `winner_id` is `null` on timeout/draw.
    MatchEnd { winner_id: Option<PlayerId> },

    /// Friend-visit traffic: accept, leave, kick, or a relayed request.
    IslandVisit(Payload),

    /// Gameplay payload from the other participant, with `sender` added.
    Forwarded(Payload),

    OnlineStatus { target: PlayerId, status: Presence },

    Matchmaking(MatchmakingReply),

    Chat {
        username: String,
        message: String,
        time_stamp: String,
    },

    /// Handshake failures only; in-session problems are dropped silently.
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// ClientEvent — client → coordinator
// ---------------------------------------------------------------------------

/// Every event a client may send. The first one must be `Handshake`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    Handshake { version: u32, token: Option<String> },

    Heartbeat { client_time: u64 },

    /// Relay `data` to `data.target`.
    Forward(Payload),

    /// "I have loaded the match"; the second ready starts it.
    PlayerReady { match_id: MatchId },

    /// Forfeit the current match.
    PlayerLeaving {},

    /// Friend-visit request addressed to `data.target`.
    IslandVisit(Payload),

    CheckOnlineStatus {
        #[serde(deserialize_with = "lenient_player_id")]
        target: PlayerId,
    },

    /// Win condition: the sender destroyed the opposing altar.
    AltarDestroyed { match_id: MatchId },

    /// Join (`true`) or leave (`false`) the matchmaking queue.
    Matchmake { matchmake: bool },

    ChatMessage { username: String, message: String },

    Disconnect {},
}

/// Reads the mandatory `target` field of a forward/visit payload.
///
/// # Errors
/// [`ProtocolError::InvalidMessage`] when the field is missing or not an id.
pub fn payload_target(payload: &Payload) -> Result<PlayerId, ProtocolError> {
    let raw = payload
        .get("target")
        .ok_or_else(|| ProtocolError::InvalidMessage("missing target".into()))?;
    PlayerId::from_json(raw).ok_or_else(|| {
        ProtocolError::InvalidMessage(format!("target is not a player id: {raw}"))
    })
}

fn lenient_player_id<'de, D>(deserializer: D) -> Result<PlayerId, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    PlayerId::from_json(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("not a player id: {value}")))
}
