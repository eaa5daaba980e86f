//! Identity and summary types shared by every layer.
//!
//! These are the values that appear inside event payloads: who a player
//! is, which room they are in, and the read-only views of rooms the
//! relay sends to clients.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// One player per live connection: the relay derives this 1:1 from the
/// transport's connection id, so it is stable for exactly as long as the
/// socket stays open. Serializes as a plain JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A short, human-shareable room code such as `"K7QX2M"`.
///
/// Codes are case-insensitive: anything that comes in from the wire is
/// trimmed and upper-cased, so a player typing `k7qx2m` lands in the
/// same room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Creates a room code, normalizing case and surrounding whitespace.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_ascii_uppercase())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RoomCode {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

impl From<&str> for RoomCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient — who should receive an event?
// ---------------------------------------------------------------------------

/// Specifies which members of a room receive an outbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every member of the room, including the sender.
    All,

    /// One specific player.
    Player(PlayerId),

    /// Every member except the given player. This is the default for
    /// relayed events: a sender never hears its own broadcast.
    AllExcept(PlayerId),
}

// ---------------------------------------------------------------------------
// Room views
// ---------------------------------------------------------------------------

/// One roster entry as sent to clients.
///
/// `data` is whatever the client supplied when creating or joining
/// (display name, colour, avatar...). The relay never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub data: Value,
    /// Unix epoch milliseconds.
    pub joined_at: i64,
}

/// A summary of a room returned in room listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: RoomCode,
    /// Number of players currently in the room.
    pub player_count: usize,
    /// Maximum players allowed.
    pub max_players: usize,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}
