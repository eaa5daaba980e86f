/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection was closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding or accepting connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// The client did not complete the WebSocket upgrade in time.
    #[error("handshake timed out after {0:?}")]
    HandshakeTimeout(std::time::Duration),

    /// A frame arrived that cannot be read as text. The connection
    /// itself is still usable.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// The WebSocket handshake was refused because the client's
    /// `Origin` header is not on the allow-list.
    #[error("origin rejected: {0}")]
    OriginRejected(String),
}
