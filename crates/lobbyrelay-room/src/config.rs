//! Room configuration and state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration stamped onto every room the registry creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Maximum players allowed in the room. Fixed at creation.
    pub max_players: usize,
}

impl RoomConfig {
    /// Default capacity of a room.
    pub const DEFAULT_MAX_PLAYERS: usize = 4;

    /// Creates a config with the given capacity, clamped to at least one
    /// so the creator always fits.
    pub fn with_max_players(max_players: usize) -> Self {
        Self {
            max_players: max_players.max(1),
        }
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_players: Self::DEFAULT_MAX_PLAYERS,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// Lobby → InProgress → (removed from the registry)
/// ```
///
/// - **Lobby**: accepting joins; the host may start the game.
/// - **InProgress**: the game is running; no one else can join. A room
///   never goes back to the lobby.
///
/// There is no explicit "dissolved" variant: a dissolved room is simply
/// no longer in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoomState {
    Lobby,
    InProgress,
}

impl RoomState {
    /// Returns `true` if the room is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Lobby)
    }

    /// Returns `true` once the game has been started.
    pub fn is_started(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    /// The only state this one may move to, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Lobby => Some(Self::InProgress),
            Self::InProgress => None,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl fmt::Display for RoomState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::InProgress => write!(f, "InProgress"),
        }
    }
}
