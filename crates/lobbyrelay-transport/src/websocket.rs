//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! Accepting is two steps. [`WebSocketTransport::accept_incoming`] only
//! takes the TCP stream off the listener; the upgrade handshake runs in
//! [`Incoming::handshake`], which the caller drives from its own task so a
//! client that never finishes the upgrade cannot hold up the listener.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{
    ErrorResponse, Request, Response,
};
use tokio_tungstenite::tungstenite::http::StatusCode;

use crate::{Connection, ConnectionId, OriginPolicy, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// How long a client gets to complete the upgrade unless configured
/// otherwise.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

type WsStream = tokio_tungstenite::WebSocketStream<TcpStream>;

/// A WebSocket-based [`Transport`] that listens for incoming connections.
pub struct WebSocketTransport {
    listener: TcpListener,
    origins: Arc<OriginPolicy>,
    handshake_timeout: Duration,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport that accepts any origin.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        Self::bind_with_origins(addr, OriginPolicy::Any).await
    }

    /// Binds a new WebSocket transport that enforces `origins` during
    /// the upgrade handshake.
    pub async fn bind_with_origins(
        addr: &str,
        origins: OriginPolicy,
    ) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, ?origins, "WebSocket transport listening");
        Ok(Self {
            listener,
            origins: Arc::new(origins),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        })
    }

    /// Sets how long a client may take to complete the upgrade.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Takes the next TCP connection off the listener without reading
    /// anything from it.
    pub async fn accept_incoming(&mut self) -> Result<Incoming, TransportError> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;
        Ok(Incoming {
            stream,
            addr,
            origins: Arc::clone(&self.origins),
            timeout: self.handshake_timeout,
        })
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    /// Accepts and upgrades in one go. Servers should prefer
    /// [`accept_incoming`](WebSocketTransport::accept_incoming) and run the
    /// handshake off the accept loop.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        self.accept_incoming().await?.handshake().await
    }
}

/// A TCP connection that has not been upgraded yet.
pub struct Incoming {
    stream: TcpStream,
    addr: SocketAddr,
    origins: Arc<OriginPolicy>,
    timeout: Duration,
}

impl Incoming {
    pub fn peer_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Runs the WebSocket upgrade, checking the `Origin` header.
    ///
    /// Fails with [`TransportError::HandshakeTimeout`] if the client has
    /// not completed the upgrade within the transport's timeout.
    pub async fn handshake(self) -> Result<WebSocketConnection, TransportError> {
        let Self {
            stream,
            addr,
            origins,
            timeout,
        } = self;

        let mut rejected: Option<String> = None;
        let check_origin = |req: &Request, resp: Response| {
            let origin = req
                .headers()
                .get("origin")
                .and_then(|value| value.to_str().ok());
            if origins.allows(origin) {
                Ok(resp)
            } else {
                rejected = Some(origin.unwrap_or("<none>").to_string());
                let mut refusal =
                    ErrorResponse::new(Some("origin not allowed".into()));
                *refusal.status_mut() = StatusCode::FORBIDDEN;
                Err(refusal)
            }
        };

        let handshake = tokio::time::timeout(
            timeout,
            tokio_tungstenite::accept_hdr_async(stream, check_origin),
        )
        .await;
        let Ok(handshake) = handshake else {
            tracing::debug!(%addr, ?timeout, "WebSocket handshake timed out");
            return Err(TransportError::HandshakeTimeout(timeout));
        };
        if let Some(origin) = rejected {
            tracing::warn!(%addr, %origin, "rejected WebSocket handshake");
            return Err(TransportError::OriginRejected(origin));
        }
        let ws = handshake.map_err(|e| {
            TransportError::AcceptFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                e,
            ))
        })?;

        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        tracing::debug!(%id, %addr, "accepted WebSocket connection");

        let (sink, stream) = ws.split();
        Ok(WebSocketConnection {
            id,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        })
    }
}

/// A single WebSocket connection.
///
/// The socket is split so that a writer task can push broadcasts while
/// the reader is parked in [`Connection::recv`].
pub struct WebSocketConnection {
    id: ConnectionId,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, text: &str) -> Result<(), Self::Error> {
        self.sink
            .lock()
            .await
            .send(Message::text(text.to_owned()))
            .await
            .map_err(|e| {
                TransportError::SendFailed(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    e,
                ))
            })
    }

    async fn recv(&self) -> Result<Option<String>, Self::Error> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_str().to_owned()));
                }
                // The frame is consumed either way, so the connection
                // stays usable after an InvalidFrame.
                Some(Ok(Message::Binary(data))) => {
                    return String::from_utf8(data.to_vec())
                        .map(Some)
                        .map_err(|e| TransportError::InvalidFrame(e.to_string()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // ping/pong/raw frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            e,
                        ),
                    ));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.sink.lock().await.close().await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
