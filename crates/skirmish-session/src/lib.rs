//! Connection registry for Skirmish.
//!
//! 1. **Authentication** — turning a handshake token into a player
//!    identity ([`Authenticator`] trait)
//! 2. **Registry** — one live connection per identity, addressable both
//!    by player and by connection ([`SessionRegistry`])
//!
//! ```text
//! Coordinator (above)  ← sends events to players through the registry
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Protocol / Transport (below)  ← PlayerId, ServerEvent, ConnectionId
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod error;
mod registry;
mod session;

pub use auth::Authenticator;
pub use error::SessionError;
pub use registry::SessionRegistry;
pub use session::{Outbox, Session};
