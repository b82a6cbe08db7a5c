//! `SkirmishServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → session →
//! coordinator. The coordinator runs as its own task; the server only
//! holds a handle to it, which it also exposes for the queue owner.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use skirmish_coordinator::{CoordinatorHandle, MatchConfig, Persistence, spawn_coordinator};
use skirmish_protocol::{Codec, JsonCodec};
use skirmish_session::Authenticator;
use skirmish_transport::{Transport, WebSocketTransport};

use crate::SkirmishError;
use crate::handler::handle_connection;

/// The protocol version clients must send in their handshake.
pub const PROTOCOL_VERSION: u32 = 1;

/// Network-facing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// How long a new connection has to send its handshake.
    pub handshake_timeout: Duration,
    /// A connection silent for this long is dropped. Clients keep it
    /// alive with `heartbeat`.
    pub idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            handshake_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
        }
    }
}

/// Shared state handed to each connection task.
pub(crate) struct ServerState<A: Authenticator, C: Codec> {
    pub(crate) coordinator: CoordinatorHandle,
    pub(crate) auth: A,
    pub(crate) codec: C,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting a Skirmish server.
///
/// ```rust,ignore
/// use skirmish::prelude::*;
///
/// let server = SkirmishServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build(my_auth, MemoryStore::new())
///     .await?;
/// server.run().await
/// ```
pub struct SkirmishServerBuilder {
    config: ServerConfig,
    match_config: MatchConfig,
}

impl SkirmishServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            match_config: MatchConfig::default(),
        }
    }

    /// Sets the listen address. Port `0` picks a free port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    pub fn match_config(mut self, config: MatchConfig) -> Self {
        self.match_config = config;
        self
    }

    /// Binds the listener and starts the coordinator.
    ///
    /// Uses `JsonCodec` over `WebSocketTransport`.
    pub async fn build<A, S>(
        self,
        auth: A,
        store: S,
    ) -> Result<SkirmishServer<A, JsonCodec>, SkirmishError>
    where
        A: Authenticator,
        S: Persistence,
    {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;
        let coordinator = spawn_coordinator(store, self.match_config);

        let state = Arc::new(ServerState {
            coordinator,
            auth,
            codec: JsonCodec,
            config: self.config,
        });

        Ok(SkirmishServer { transport, state })
    }
}

impl Default for SkirmishServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Skirmish server. Call [`run()`](Self::run) to accept clients.
pub struct SkirmishServer<A: Authenticator, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<A, C>>,
}

impl<A, C> SkirmishServer<A, C>
where
    A: Authenticator,
    C: Codec + Clone,
{
    pub fn local_addr(&self) -> Result<SocketAddr, SkirmishError> {
        Ok(self.transport.local_addr()?)
    }

    /// Handle to the coordinator, for the queue owner's
    /// `notify_match_found` and other out-of-band calls.
    pub fn coordinator(&self) -> CoordinatorHandle {
        self.state.coordinator.clone()
    }

    /// Accepts connections until the process ends, one task each.
    pub async fn run(mut self) -> Result<(), SkirmishError> {
        tracing::info!("Skirmish server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
