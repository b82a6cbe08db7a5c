//! Match coordination for Skirmish.
//!
//! One actor task owns every piece of shared state: the connection
//! registry, the live match records and the playing index. Connection
//! handlers, countdown tasks and the queue owner talk to it through a
//! [`CoordinatorHandle`].
//!
//! # Key types
//!
//! - [`Coordinator`] — the synchronous core; each operation runs to
//!   completion
//! - [`CoordinatorHandle`] / [`spawn_coordinator`] — the actor front door
//! - [`Match`], [`MatchTable`] — records and the playing index
//! - [`Persistence`] — player levels, queue, stakes, chat history
//! - [`MatchConfig`] — match length, tick period, level range

mod actor;
mod chat;
mod config;
mod coordinator;
mod countdown;
mod error;
mod forward;
mod lifecycle;
mod matchmaking;
mod record;
mod store;

pub use actor::{CoordinatorHandle, CoordinatorInfo, spawn_coordinator};
pub use chat::format_time_stamp;
pub use config::{MatchConfig, MatchPhase};
pub use coordinator::Coordinator;
pub use error::{MatchError, StoreError};
pub use lifecycle::ReadyOutcome;
pub use record::{MAX_PARTICIPANTS, Match, MatchKind, MatchTable};
pub use store::{
    ChatLog, ChatRecord, Gem, MemoryStore, Persistence, PlayerDirectory, QueueStore,
    Settlement, StakeLedger,
};
