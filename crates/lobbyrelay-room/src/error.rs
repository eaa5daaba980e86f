//! Error types for the room layer.

use lobbyrelay_protocol::{PlayerId, RoomCode};

/// Errors that can occur during room and registry operations.
///
/// Every variant except [`RoomError::CodeSpaceExhausted`] is a client
/// request error: it is reported to the requester only and is raised
/// before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The room is full — no more player slots available.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// The room has left the lobby and no longer accepts players.
    #[error("room {0} has already started")]
    GameAlreadyStarted(RoomCode),

    /// Only the host may start the game.
    #[error("player {0} is not the host of room {1}")]
    NotHost(PlayerId, RoomCode),

    /// The room is not in a startable state.
    #[error("room {0} cannot be started")]
    CannotStart(RoomCode),

    /// The player is already a member of a room.
    #[error("player {0} already in room {1}")]
    AlreadyInRoom(PlayerId, RoomCode),

    /// The player is not a member of any room.
    #[error("player {0} is not in any room")]
    NotInRoom(PlayerId),

    /// Every generated room code collided with a live room.
    #[error("no free room code after {0} attempts")]
    CodeSpaceExhausted(usize),
}

impl RoomError {
    /// The message sent to the client in a `roomError` event.
    pub fn client_message(&self) -> &'static str {
        match self {
            Self::NotFound(_) | Self::NotInRoom(_) => "Room not found",
            Self::RoomFull(_) => "Room is full",
            Self::GameAlreadyStarted(_) => "Game already started",
            Self::NotHost(..) => "Only the host can start the game",
            Self::CannotStart(_) => "Game cannot be started",
            Self::AlreadyInRoom(..) => "Already in a room",
            Self::CodeSpaceExhausted(_) => "Internal server error",
        }
    }

    /// Returns `true` for errors caused by the request itself, as opposed
    /// to failures inside the relay.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::CodeSpaceExhausted(_))
    }
}
