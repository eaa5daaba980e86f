//! Unified error type for the relay server.

use lobbyrelay_protocol::ProtocolError;
use lobbyrelay_room::RoomError;
use lobbyrelay_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (full, not found, not host...).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Binding or serving the diagnostic HTTP listener failed.
    #[error("status server: {0}")]
    Io(#[from] std::io::Error),
}
