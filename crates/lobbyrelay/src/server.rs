//! `RelayServer` builder and server loop.
//!
//! This is the entry point for running the relay. It ties together all
//! the layers: transport → protocol → session handling → room registry,
//! plus the cleanup sweeper and the diagnostic HTTP listener.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lobbyrelay_protocol::{ClientEvent, JsonCodec, PlayerId, ServerEvent};
use lobbyrelay_room::{RoomConfig, RoomRegistry, spawn_sweeper};
use lobbyrelay_transport::{OriginPolicy, TransportError, WebSocketTransport};
use tokio::net::TcpListener;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc};

use crate::handler::handle_connection;
use crate::session::{Delivery, handle_disconnect, handle_event};
use crate::{RelayConfig, RelayError, status};

/// Events that may wait for one connection's writer before new ones are
/// dropped. A client that stops reading falls behind by at most this much.
pub(crate) const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Outbound queue of one connection, drained by its writer task.
pub(crate) type PeerSender = mpsc::Sender<ServerEvent>;

/// Shared server state passed to each connection handler task.
///
/// Lock order is always `registry` then `peers`. Deliveries are enqueued
/// while the registry lock is still held, so two events for the same room
/// can never be handed to the writers out of order.
pub(crate) struct ServerState {
    pub(crate) registry: Arc<Mutex<RoomRegistry>>,
    pub(crate) peers: Mutex<HashMap<PlayerId, PeerSender>>,
    pub(crate) codec: JsonCodec,
}

impl ServerState {
    pub(crate) fn new(registry: Arc<Mutex<RoomRegistry>>) -> Self {
        Self {
            registry,
            peers: Mutex::new(HashMap::new()),
            codec: JsonCodec,
        }
    }

    /// Runs one client event against the registry and enqueues the results.
    pub(crate) async fn process(&self, sender: PlayerId, event: ClientEvent) {
        let mut registry = self.registry.lock().await;
        let deliveries = handle_event(&mut registry, sender, event);
        self.dispatch(deliveries).await;
    }

    /// Unregisters `player` and runs the leave path on their behalf.
    pub(crate) async fn disconnect(&self, player: PlayerId) {
        let mut registry = self.registry.lock().await;
        self.peers.lock().await.remove(&player);
        let deliveries = handle_disconnect(&mut registry, player);
        self.dispatch(deliveries).await;
    }

    async fn dispatch(&self, deliveries: Vec<Delivery>) {
        if deliveries.is_empty() {
            return;
        }
        let peers = self.peers.lock().await;
        for Delivery { to, event } in deliveries {
            let name = event.name();
            match peers.get(&to) {
                Some(tx) => match tx.try_send(event) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(player = %to, event = name, "outbound queue full, event dropped");
                    }
                    Err(TrySendError::Closed(_)) => {
                        tracing::debug!(player = %to, event = name, "writer gone, event dropped");
                    }
                },
                None => {
                    tracing::debug!(player = %to, event = name, "no connection for player");
                }
            }
        }
    }
}

/// Builder for configuring and starting a relay server.
///
/// # Example
///
/// ```rust,no_run
/// # async fn run() -> Result<(), lobbyrelay::RelayError> {
/// use lobbyrelay::RelayServer;
///
/// let server = RelayServer::builder()
///     .bind("0.0.0.0:3001")
///     .status_bind("0.0.0.0:3002")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct RelayServerBuilder {
    config: RelayConfig,
}

impl RelayServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: RelayConfig::default(),
        }
    }

    /// Starts from a complete configuration.
    pub fn from_config(config: RelayConfig) -> Self {
        Self { config }
    }

    /// Sets the address of the WebSocket listener.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Enables the diagnostic HTTP listener on `addr`.
    pub fn status_bind(mut self, addr: &str) -> Self {
        self.config.status_addr = Some(addr.to_string());
        self
    }

    /// Sets which browser origins may connect.
    pub fn origins(mut self, origins: OriginPolicy) -> Self {
        self.config.origins = origins;
        self
    }

    /// Sets the configuration stamped onto every new room.
    pub fn room_config(mut self, room: RoomConfig) -> Self {
        self.config.room = room;
        self
    }

    /// Sets how long a client may take to complete the WebSocket upgrade.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    /// Sets how often leaked empty rooms are swept.
    pub fn sweep_interval(mut self, every: Duration) -> Self {
        self.config.sweep_interval = every;
        self
    }

    /// Binds the listeners. Nothing is accepted until [`RelayServer::run`].
    pub async fn build(self) -> Result<RelayServer, RelayError> {
        let RelayConfig {
            bind_addr,
            status_addr,
            origins,
            room,
            sweep_interval,
            handshake_timeout,
        } = self.config;

        let transport = WebSocketTransport::bind_with_origins(&bind_addr, origins.clone())
            .await?
            .with_handshake_timeout(handshake_timeout);

        let status_listener = match status_addr {
            Some(addr) => {
                let listener = TcpListener::bind(&addr).await?;
                tracing::info!(addr = %listener.local_addr()?, "status listener bound");
                Some(listener)
            }
            None => None,
        };

        let registry = Arc::new(Mutex::new(RoomRegistry::new(room)));
        let state = Arc::new(ServerState::new(Arc::clone(&registry)));

        Ok(RelayServer {
            transport,
            status_listener,
            origins,
            sweep_interval,
            registry,
            state,
        })
    }
}

impl Default for RelayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound relay server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct RelayServer {
    transport: WebSocketTransport,
    status_listener: Option<TcpListener>,
    origins: OriginPolicy,
    sweep_interval: Duration,
    registry: Arc<Mutex<RoomRegistry>>,
    state: Arc<ServerState>,
}

impl RelayServer {
    /// Creates a new builder.
    pub fn builder() -> RelayServerBuilder {
        RelayServerBuilder::new()
    }

    /// Returns the address of the WebSocket listener.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns the address of the diagnostic HTTP listener, if enabled.
    pub fn status_addr(&self) -> Option<SocketAddr> {
        self.status_listener
            .as_ref()
            .and_then(|l| l.local_addr().ok())
    }

    /// The registry shared by every connection, the sweeper and the
    /// status endpoints.
    pub fn registry(&self) -> Arc<Mutex<RoomRegistry>> {
        Arc::clone(&self.registry)
    }

    /// Runs the server accept loop.
    ///
    /// Starts the sweeper and the status listener, then accepts incoming
    /// connections and spawns a task for each that performs the upgrade
    /// and runs the handler. Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), RelayError> {
        let _sweeper = spawn_sweeper(Arc::clone(&self.registry), self.sweep_interval);

        if let Some(listener) = self.status_listener.take() {
            let app = status::router(Arc::clone(&self.registry), &self.origins, Instant::now());
            tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, app).await {
                    tracing::error!(error = %e, "status server stopped");
                }
            });
        }

        tracing::info!(addr = ?self.local_addr().ok(), "lobbyrelay running");

        loop {
            match self.transport.accept_incoming().await {
                Ok(incoming) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        match incoming.handshake().await {
                            Ok(conn) => handle_connection(conn, state).await,
                            // Already logged by the transport.
                            Err(
                                TransportError::OriginRejected(_)
                                | TransportError::HandshakeTimeout(_),
                            ) => {}
                            Err(e) => {
                                tracing::debug!(error = %e, "handshake failed");
                            }
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
