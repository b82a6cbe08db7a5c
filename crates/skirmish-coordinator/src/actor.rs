//! Coordinator actor: one Tokio task that owns a [`Coordinator`].
//!
//! Everything that touches coordinator state arrives as a [`Command`] on
//! a bounded channel and is handled to completion before the next one.
//! [`CoordinatorHandle`] is the cloneable front door used by connection
//! handlers, countdown tasks and the REST layer.

use std::time::Duration;

use skirmish_protocol::{
    MatchId, MatchmakingReply, Payload, PlayerId, Presence, ServerEvent, payload_target,
};
use skirmish_session::Outbox;
use skirmish_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::{Coordinator, MatchConfig, MatchError, Persistence, ReadyOutcome, countdown};

type Reply<T> = oneshot::Sender<Result<T, MatchError>>;

/// Commands sent to the coordinator actor.
pub(crate) enum Command {
    Connect {
        player_id: PlayerId,
        connection_id: ConnectionId,
        outbox: Outbox,
        reply: Reply<()>,
    },
    Disconnect {
        connection_id: ConnectionId,
        reply: oneshot::Sender<Option<PlayerId>>,
    },
    PlayerReady {
        player_id: PlayerId,
        match_id: MatchId,
        reply: Reply<()>,
    },
    PlayerLeaving {
        player_id: PlayerId,
        reply: Reply<()>,
    },
    Forward {
        sender: PlayerId,
        payload: Payload,
        reply: Reply<()>,
    },
    IslandVisit {
        sender: PlayerId,
        payload: Payload,
        reply: Reply<()>,
    },
    CheckPresence {
        requester: PlayerId,
        target: PlayerId,
        reply: oneshot::Sender<Presence>,
    },
    AltarDestroyed {
        reporter: PlayerId,
        match_id: MatchId,
        reply: Reply<()>,
    },
    Matchmake {
        player_id: PlayerId,
        join: bool,
        reply: Reply<MatchmakingReply>,
    },
    Chat {
        sender: PlayerId,
        username: String,
        message: String,
    },
    MatchFound {
        player1: PlayerId,
        player2: PlayerId,
        reply: Reply<MatchId>,
    },
    EndMatch {
        match_id: MatchId,
        winner: Option<PlayerId>,
        reply: Reply<()>,
    },
    Countdown {
        match_id: MatchId,
        epoch: u64,
        periods: u32,
        reply: oneshot::Sender<bool>,
    },
    GetInfo {
        reply: oneshot::Sender<CoordinatorInfo>,
    },
    Shutdown,
}

/// A snapshot of coordinator counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorInfo {
    /// Live sessions.
    pub connected: usize,
    /// Live match records, waiting or active.
    pub matches: usize,
    /// Players in the playing index.
    pub playing: usize,
}

/// Handle to the running coordinator.
///
/// Cheap to clone. Every method waits for the coordinator to process the
/// request, so effects are visible to the caller's next request.
#[derive(Clone)]
pub struct CoordinatorHandle {
    sender: mpsc::Sender<Command>,
}

impl CoordinatorHandle {
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, MatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| MatchError::Unavailable)?;
        reply_rx.await.map_err(|_| MatchError::Unavailable)
    }

    /// Registers an authenticated client.
    ///
    /// # Errors
    /// [`MatchError::Session`] wrapping `AlreadyConnected` for a duplicate
    /// identity.
    pub async fn connect(
        &self,
        player_id: PlayerId,
        connection_id: ConnectionId,
        outbox: Outbox,
    ) -> Result<(), MatchError> {
        self.request(|reply| Command::Connect {
            player_id,
            connection_id,
            outbox,
            reply,
        })
        .await?
    }

    /// Tears down a closed connection. Returns the player it belonged to.
    pub async fn disconnect(
        &self,
        connection_id: ConnectionId,
    ) -> Result<Option<PlayerId>, MatchError> {
        self.request(|reply| Command::Disconnect {
            connection_id,
            reply,
        })
        .await
    }

    pub async fn player_ready(
        &self,
        player_id: PlayerId,
        match_id: MatchId,
    ) -> Result<(), MatchError> {
        self.request(|reply| Command::PlayerReady {
            player_id,
            match_id,
            reply,
        })
        .await?
    }

    pub async fn player_leaving(&self, player_id: PlayerId) -> Result<(), MatchError> {
        self.request(|reply| Command::PlayerLeaving { player_id, reply })
            .await?
    }

    /// Relays a payload to the player named by its `target` field.
    pub async fn forward(&self, sender: PlayerId, payload: Payload) -> Result<(), MatchError> {
        self.request(|reply| Command::Forward {
            sender,
            payload,
            reply,
        })
        .await?
    }

    pub async fn island_visit(
        &self,
        sender: PlayerId,
        payload: Payload,
    ) -> Result<(), MatchError> {
        self.request(|reply| Command::IslandVisit {
            sender,
            payload,
            reply,
        })
        .await?
    }

    /// Sends `online_status` to `requester` and returns the answer.
    pub async fn check_online_status(
        &self,
        requester: PlayerId,
        target: PlayerId,
    ) -> Result<Presence, MatchError> {
        self.request(|reply| Command::CheckPresence {
            requester,
            target,
            reply,
        })
        .await
    }

    pub async fn altar_destroyed(
        &self,
        reporter: PlayerId,
        match_id: MatchId,
    ) -> Result<(), MatchError> {
        self.request(|reply| Command::AltarDestroyed {
            reporter,
            match_id,
            reply,
        })
        .await?
    }

    /// Joins or leaves the matchmaking queue. The requester also receives
    /// the outcome as a `matchmaking` event.
    pub async fn matchmake(
        &self,
        player_id: PlayerId,
        join: bool,
    ) -> Result<MatchmakingReply, MatchError> {
        self.request(|reply| Command::Matchmake {
            player_id,
            join,
            reply,
        })
        .await?
    }

    /// Broadcasts a chat line (fire-and-forget).
    pub async fn chat(
        &self,
        sender: PlayerId,
        username: String,
        message: String,
    ) -> Result<(), MatchError> {
        self.sender
            .send(Command::Chat {
                sender,
                username,
                message,
            })
            .await
            .map_err(|_| MatchError::Unavailable)
    }

    /// Hook for the queue owner: two players were paired.
    pub async fn notify_match_found(
        &self,
        player1: PlayerId,
        player2: PlayerId,
    ) -> Result<MatchId, MatchError> {
        self.request(|reply| Command::MatchFound {
            player1,
            player2,
            reply,
        })
        .await?
    }

    /// Ends a match from outside (administration, tests).
    pub async fn end_match(
        &self,
        match_id: MatchId,
        winner: Option<PlayerId>,
    ) -> Result<(), MatchError> {
        self.request(|reply| Command::EndMatch {
            match_id,
            winner,
            reply,
        })
        .await?
    }

    pub async fn info(&self) -> Result<CoordinatorInfo, MatchError> {
        self.request(|reply| Command::GetInfo { reply }).await
    }

    /// Stops the actor. Pending countdowns exit on their next period.
    pub async fn shutdown(&self) -> Result<(), MatchError> {
        self.sender
            .send(Command::Shutdown)
            .await
            .map_err(|_| MatchError::Unavailable)
    }
}

/// The actor task state.
struct CoordinatorActor<S> {
    core: Coordinator<S>,
    receiver: mpsc::Receiver<Command>,
    /// Handed to countdown tasks; weak so they never keep the channel open.
    commands: mpsc::WeakSender<Command>,
    tick_period: Duration,
}

impl<S: Persistence> CoordinatorActor<S> {
    async fn run(mut self) {
        tracing::info!("coordinator started");

        while let Some(cmd) = self.receiver.recv().await {
            if matches!(cmd, Command::Shutdown) {
                tracing::info!("coordinator shutting down");
                break;
            }
            self.handle(cmd);
        }

        tracing::info!("coordinator stopped");
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Connect {
                player_id,
                connection_id,
                outbox,
                reply,
            } => {
                let result = self
                    .core
                    .connect(player_id, connection_id, outbox)
                    .map_err(MatchError::from);
                let _ = reply.send(logged("connect", player_id, result));
            }
            Command::Disconnect {
                connection_id,
                reply,
            } => {
                let _ = reply.send(self.core.disconnect(connection_id));
            }
            Command::PlayerReady {
                player_id,
                match_id,
                reply,
            } => {
                let result = self.core.player_ready(player_id, &match_id).map(|outcome| {
                    if let ReadyOutcome::Started {
                        countdown: Some(epoch),
                    } = outcome
                    {
                        self.start_countdown(match_id, epoch);
                    }
                });
                let _ = reply.send(logged("player_ready", player_id, result));
            }
            Command::PlayerLeaving { player_id, reply } => {
                let result = self.core.player_leaving(player_id);
                let _ = reply.send(logged("player_leaving", player_id, result));
            }
            Command::Forward {
                sender,
                payload,
                reply,
            } => {
                let result = payload_target(&payload)
                    .map_err(MatchError::from)
                    .and_then(|target| self.core.forward(sender, target, payload));
                let _ = reply.send(logged("forward", sender, result));
            }
            Command::IslandVisit {
                sender,
                payload,
                reply,
            } => {
                let result = self.core.island_visit(sender, payload);
                let _ = reply.send(logged("island_visit", sender, result));
            }
            Command::CheckPresence {
                requester,
                target,
                reply,
            } => {
                let _ = reply.send(self.core.check_presence(requester, target));
            }
            Command::AltarDestroyed {
                reporter,
                match_id,
                reply,
            } => {
                let result = self.core.win_condition_reached(&match_id, reporter);
                let _ = reply.send(logged("altar_destroyed", reporter, result));
            }
            Command::Matchmake {
                player_id,
                join,
                reply,
            } => {
                let result = self.core.request_matchmaking(player_id, join);
                let event = match &result {
                    Ok(status) => status.clone(),
                    Err(e) => MatchmakingReply::Rejected {
                        reason: e.to_string(),
                    },
                };
                self.core.send_to(player_id, ServerEvent::Matchmaking(event));
                let _ = reply.send(logged("matchmake", player_id, result));
            }
            Command::Chat {
                sender,
                username,
                message,
            } => {
                self.core.chat(sender, username, message);
            }
            Command::MatchFound {
                player1,
                player2,
                reply,
            } => {
                let _ = reply.send(self.core.notify_match_found(player1, player2));
            }
            Command::EndMatch {
                match_id,
                winner,
                reply,
            } => {
                let result = self.core.end_match(&match_id, winner);
                if let Err(e) = &result {
                    tracing::error!(%match_id, error = %e, "could not end match");
                }
                let _ = reply.send(result);
            }
            Command::Countdown {
                match_id,
                epoch,
                periods,
                reply,
            } => {
                let _ = reply.send(self.core.countdown_tick(&match_id, epoch, periods));
            }
            Command::GetInfo { reply } => {
                let _ = reply.send(CoordinatorInfo {
                    connected: self.core.sessions().len(),
                    matches: self.core.matches().len(),
                    playing: self.core.matches().playing_count(),
                });
            }
            Command::Shutdown => {}
        }
    }

    fn start_countdown(&self, match_id: MatchId, epoch: u64) {
        tokio::spawn(countdown::run(
            self.commands.clone(),
            match_id,
            epoch,
            self.tick_period,
        ));
    }
}

/// Logs a rejected request and passes the result through.
fn logged<T>(
    op: &'static str,
    player_id: PlayerId,
    result: Result<T, MatchError>,
) -> Result<T, MatchError> {
    if let Err(e) = &result {
        tracing::warn!(op, %player_id, error = %e, "request rejected");
    }
    result
}

/// Spawns the coordinator task and returns a handle to it.
///
/// The task stops when every handle is dropped or on
/// [`CoordinatorHandle::shutdown`].
pub fn spawn_coordinator<S: Persistence>(store: S, config: MatchConfig) -> CoordinatorHandle {
    let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
    let tick_period = config.tick_period;

    let actor = CoordinatorActor {
        core: Coordinator::new(store, config),
        receiver: rx,
        commands: tx.downgrade(),
        tick_period,
    };

    tokio::spawn(actor.run());

    CoordinatorHandle { sender: tx }
}
