//! # Skirmish
//!
//! Real-time session coordinator for head-to-head browser games.
//!
//! Clients connect over WebSocket, authenticate once, and are then
//! paired, readied, timed and settled by a single coordinator task.
//! Gameplay payloads are relayed between the two participants of a
//! match without interpretation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use skirmish::prelude::*;
//!
//! struct TokenAuth;
//!
//! impl Authenticator for TokenAuth {
//!     async fn authenticate(&self, token: &str) -> Result<PlayerId, SessionError> {
//!         token
//!             .parse()
//!             .map(PlayerId)
//!             .map_err(|_| SessionError::AuthFailed("bad token".into()))
//!     }
//! }
//!
//! # async fn start() -> Result<(), SkirmishError> {
//! let server = SkirmishServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .build(TokenAuth, MemoryStore::new())
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::SkirmishError;
pub use server::{PROTOCOL_VERSION, ServerConfig, SkirmishServer, SkirmishServerBuilder};

pub use skirmish_coordinator as coordinator;
pub use skirmish_protocol as protocol;
pub use skirmish_session as session;
pub use skirmish_transport as transport;

/// Everything needed to run a server and talk to it.
pub mod prelude {
    pub use crate::{
        PROTOCOL_VERSION, ServerConfig, SkirmishError, SkirmishServer, SkirmishServerBuilder,
    };
    pub use skirmish_coordinator::{
        ChatLog, CoordinatorHandle, MatchConfig, MatchError, MemoryStore, Persistence,
        PlayerDirectory, QueueStore, Settlement, StakeLedger, StoreError,
    };
    pub use skirmish_protocol::{
        ClientEvent, MatchId, MatchmakingReply, Payload, PlayerId, Presence, ServerEvent,
    };
    pub use skirmish_session::{Authenticator, SessionError};
}
