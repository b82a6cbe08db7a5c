//! Per-connection handler: handshake, registration and event routing.
//!
//! Each accepted connection gets its own Tokio task running this handler:
//!   1. Receive `handshake` → check version → authenticate
//!   2. Register with the coordinator (refused for a duplicate identity)
//!   3. Spawn a writer that drains the session outbox onto the socket
//!   4. Loop: decode client events and hand them to the coordinator

use std::sync::Arc;
use std::time::{Duration, Instant};

use skirmish_coordinator::{CoordinatorHandle, MatchError};
use skirmish_protocol::{ClientEvent, Codec, PlayerId, ProtocolError, ServerEvent};
use skirmish_session::{Authenticator, Outbox, SessionError};
use skirmish_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::SkirmishError;
use crate::server::{PROTOCOL_VERSION, ServerState};

/// Drop guard that tells the coordinator the connection is gone.
///
/// Runs on every exit path, panics included. `Drop` is synchronous, so
/// the request is sent from a spawned task.
struct ConnectionGuard {
    connection_id: ConnectionId,
    coordinator: CoordinatorHandle,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let connection_id = self.connection_id;
        let coordinator = self.coordinator.clone();
        tokio::spawn(async move {
            if let Err(e) = coordinator.disconnect(connection_id).await {
                tracing::debug!(%connection_id, error = %e, "disconnect not delivered");
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<A, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<A, C>>,
) -> Result<(), SkirmishError>
where
    A: Authenticator,
    C: Codec + Clone,
{
    let conn = Arc::new(conn);
    let connection_id = conn.id();
    let start = Instant::now();
    tracing::debug!(%connection_id, peer = %conn.peer_addr(), "handling new connection");

    // --- Step 1: Handshake ---
    let player_id = perform_handshake(&conn, &state).await?;
    tracing::info!(%connection_id, %player_id, "player authenticated");

    // --- Step 2: Registration ---
    // The ack is queued before registering so it is the first event the
    // writer sees, ahead of anything the coordinator sends.
    let (outbox, events) = mpsc::unbounded_channel();
    let _ = outbox.send(ServerEvent::HandshakeAck { player_id });

    match state
        .coordinator
        .connect(player_id, connection_id, outbox.clone())
        .await
    {
        Ok(()) => {}
        Err(MatchError::Session(SessionError::AlreadyConnected(_))) => {
            tracing::warn!(%connection_id, %player_id, "already connected, refusing");
            send_event(&conn, &state.codec, &ServerEvent::AlreadyConnected {}).await?;
            let _ = conn.close().await;
            return Err(SessionError::AlreadyConnected(player_id).into());
        }
        Err(e) => return Err(e.into()),
    }
    let _guard = ConnectionGuard {
        connection_id,
        coordinator: state.coordinator.clone(),
    };

    // --- Step 3: Writer ---
    tokio::spawn(write_events(Arc::clone(&conn), state.codec.clone(), events));

    // --- Step 4: Event loop ---
    loop {
        let data = match tokio::time::timeout(state.config.idle_timeout, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%player_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%player_id, "connection timed out");
                break;
            }
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "failed to decode event");
                continue;
            }
        };

        if dispatch(&state.coordinator, player_id, &outbox, event, &start).await? {
            break;
        }
    }

    // _guard drops here → coordinator disconnect fires. The writer ends
    // once the registry drops its copy of the outbox.
    Ok(())
}

/// Receives the handshake, checks the version and authenticates.
async fn perform_handshake<A, C>(
    conn: &WebSocketConnection,
    state: &ServerState<A, C>,
) -> Result<PlayerId, SkirmishError>
where
    A: Authenticator,
    C: Codec,
{
    let data = match tokio::time::timeout(state.config.handshake_timeout, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidMessage(
                "connection closed before handshake".into(),
            )
            .into());
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            return Err(ProtocolError::InvalidMessage("handshake timed out".into()).into());
        }
    };

    let (version, token) = match state.codec.decode(&data) {
        Ok(ClientEvent::Handshake { version, token }) => (version, token),
        Ok(_) | Err(_) => {
            send_error(conn, &state.codec, 400, "expected handshake").await?;
            return Err(ProtocolError::InvalidMessage(
                "first event must be handshake".into(),
            )
            .into());
        }
    };

    if version != PROTOCOL_VERSION {
        send_error(
            conn,
            &state.codec,
            400,
            &format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}"),
        )
        .await?;
        return Err(ProtocolError::InvalidMessage("protocol version mismatch".into()).into());
    }

    let token = token.as_deref().unwrap_or("");
    match state.auth.authenticate(token).await {
        Ok(player_id) => Ok(player_id),
        Err(e) => {
            send_error(conn, &state.codec, 401, "unauthorized").await?;
            Err(e.into())
        }
    }
}

/// Routes one client event. Returns `true` if the connection should close.
///
/// Rejections are logged by the coordinator and dropped here; only a
/// stopped coordinator ends the connection with an error.
async fn dispatch(
    coordinator: &CoordinatorHandle,
    player_id: PlayerId,
    outbox: &Outbox,
    event: ClientEvent,
    start: &Instant,
) -> Result<bool, SkirmishError> {
    let result = match event {
        ClientEvent::Handshake { .. } => {
            tracing::debug!(%player_id, "ignoring repeated handshake");
            Ok(())
        }
        ClientEvent::Heartbeat { client_time } => {
            let _ = outbox.send(ServerEvent::HeartbeatAck {
                client_time,
                server_time: millis(start.elapsed()),
            });
            Ok(())
        }
        ClientEvent::Forward(payload) => coordinator.forward(player_id, payload).await,
        ClientEvent::PlayerReady { match_id } => {
            coordinator.player_ready(player_id, match_id).await
        }
        ClientEvent::PlayerLeaving {} => coordinator.player_leaving(player_id).await,
        ClientEvent::IslandVisit(payload) => coordinator.island_visit(player_id, payload).await,
        ClientEvent::CheckOnlineStatus { target } => coordinator
            .check_online_status(player_id, target)
            .await
            .map(|_| ()),
        ClientEvent::AltarDestroyed { match_id } => {
            coordinator.altar_destroyed(player_id, match_id).await
        }
        ClientEvent::Matchmake { matchmake } => {
            coordinator.matchmake(player_id, matchmake).await.map(|_| ())
        }
        ClientEvent::ChatMessage { username, message } => {
            coordinator.chat(player_id, username, message).await
        }
        ClientEvent::Disconnect {} => {
            tracing::info!(%player_id, "client disconnected");
            return Ok(true);
        }
    };

    match result {
        Err(MatchError::Unavailable) => Err(MatchError::Unavailable.into()),
        Ok(()) | Err(_) => Ok(false),
    }
}

/// Drains a session's outbox onto the socket.
async fn write_events<C: Codec>(
    conn: Arc<WebSocketConnection>,
    codec: C,
    mut events: mpsc::UnboundedReceiver<ServerEvent>,
) {
    while let Some(event) = events.recv().await {
        let bytes = match codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(connection_id = %conn.id(), error = %e, "write failed");
            break;
        }
    }
}

/// Writes one event straight to the socket, bypassing the outbox.
async fn send_event(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    event: &ServerEvent,
) -> Result<(), SkirmishError> {
    let bytes = codec.encode(event)?;
    conn.send(&bytes).await?;
    Ok(())
}

async fn send_error(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    code: u16,
    message: &str,
) -> Result<(), SkirmishError> {
    send_event(
        conn,
        codec,
        &ServerEvent::Error {
            code,
            message: message.to_string(),
        },
    )
    .await
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
