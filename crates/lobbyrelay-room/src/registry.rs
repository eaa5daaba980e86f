//! Room registry: creates, tracks, and routes players to rooms.

use std::collections::HashMap;

use lobbyrelay_protocol::{ObjectData, PlayerId, RoomCode, RoomSummary};
use serde_json::Value;

use crate::code::{CodeSource, thread_rng_source, unique_code};
use crate::{Room, RoomConfig, RoomError};

/// What happened to a room when a player left it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    /// The room the player was in.
    pub room_code: RoomCode,
    /// Members still in the room, in join order.
    pub remaining: Vec<PlayerId>,
    /// Set only when the departure handed the host role to someone else.
    pub new_host: Option<PlayerId>,
    /// `true` if the room was removed because it became empty.
    pub dissolved: bool,
}

/// Every live room, plus an index from player to room.
///
/// A player is in at most ONE room at a time, and the index always agrees
/// with the rosters: every id on some roster has exactly one index entry
/// pointing at that room, and every index entry points at a live room
/// whose roster contains the id.
///
/// The registry has no locking of its own. Callers share it behind a
/// single `tokio::sync::Mutex`, which serializes every mutation.
///
/// Rooms are only handed out by shared reference; rosters change through
/// the registry operations so the index can follow.
///
/// ```compile_fail
/// use lobbyrelay_protocol::RoomCode;
/// use lobbyrelay_room::RoomRegistry;
///
/// let mut registry = RoomRegistry::default();
/// let _ = registry.room_mut(&RoomCode::new("ABCDEF"));
/// ```
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, Room>,
    player_index: HashMap<PlayerId, RoomCode>,
    config: RoomConfig,
    code_source: CodeSource,
}

impl RoomRegistry {
    /// Creates an empty registry stamping `config` onto every new room.
    pub fn new(config: RoomConfig) -> Self {
        Self::with_code_source(config, thread_rng_source())
    }

    /// Like [`new`](Self::new), with a custom source of room codes.
    pub fn with_code_source(config: RoomConfig, code_source: CodeSource) -> Self {
        Self {
            rooms: HashMap::new(),
            player_index: HashMap::new(),
            config,
            code_source,
        }
    }

    pub fn config(&self) -> RoomConfig {
        self.config
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Creates a room with `host` as its first player and host.
    ///
    /// # Errors
    /// - [`RoomError::AlreadyInRoom`] if `host` is already in a room
    /// - [`RoomError::CodeSpaceExhausted`] if no free code turned up
    pub fn create_room(
        &mut self,
        host: PlayerId,
        host_data: Value,
    ) -> Result<&Room, RoomError> {
        if let Some(current) = self.player_index.get(&host) {
            return Err(RoomError::AlreadyInRoom(host, current.clone()));
        }

        let rooms = &self.rooms;
        let code = unique_code(&mut self.code_source, |c| rooms.contains_key(c))?;

        let mut room = Room::new(code.clone(), self.config);
        room.add_player(host, host_data)?;

        self.player_index.insert(host, code.clone());
        tracing::info!(room = %code, %host, "room created");
        Ok(&*self.rooms.entry(code).or_insert(room))
    }

    /// Adds `player` to the room with the given code.
    ///
    /// Checks run in this order and nothing is mutated on failure:
    /// already in a room, room exists, still in the lobby, has space.
    pub fn join_room(
        &mut self,
        code: &RoomCode,
        player: PlayerId,
        data: Value,
    ) -> Result<&Room, RoomError> {
        if let Some(current) = self.player_index.get(&player) {
            return Err(RoomError::AlreadyInRoom(player, current.clone()));
        }

        let room = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        if room.is_started() {
            return Err(RoomError::GameAlreadyStarted(code.clone()));
        }
        room.add_player(player, data)?;

        self.player_index.insert(player, code.clone());
        tracing::info!(room = %code, %player, players = room.player_count(), "player joined");
        Ok(&*room)
    }

    /// Starts the game in `player`'s room on their behalf.
    pub fn start_game(&mut self, player: PlayerId) -> Result<&Room, RoomError> {
        let room = self
            .room_of_mut(player)
            .ok_or(RoomError::NotInRoom(player))?;
        room.start(player)?;
        Ok(&*room)
    }

    /// Applies a world-object update to `player`'s room.
    ///
    /// Returns `None` if the player is not in a room; otherwise the room
    /// and whether the update was reflected in its game state.
    pub fn apply_object_update(
        &mut self,
        player: PlayerId,
        object: &ObjectData,
    ) -> Option<(&Room, bool)> {
        let room = self.room_of_mut(player)?;
        let stored = room.apply_object_update(player, object);
        Some((&*room, stored))
    }

    /// Removes `player` from whatever room they are in.
    ///
    /// The index entry, the roster entry and (if the roster is now empty)
    /// the room itself all go in this one call. Returns `None` if the
    /// player was not in a room.
    pub fn leave(&mut self, player: PlayerId) -> Option<Departure> {
        let code = self.player_index.remove(&player)?;
        let Some(room) = self.rooms.get_mut(&code) else {
            tracing::warn!(room = %code, %player, "index pointed at a missing room");
            return None;
        };

        let old_host = room.host_id();
        room.remove_player(player);
        let new_host = room.host_id().filter(|h| Some(*h) != old_host);
        let remaining: Vec<PlayerId> = room.member_ids().collect();

        let dissolved = remaining.is_empty();
        if dissolved {
            self.rooms.remove(&code);
            tracing::info!(room = %code, %player, "last player left, room removed");
        } else {
            tracing::info!(room = %code, %player, players = remaining.len(), "player left");
        }

        Some(Departure {
            room_code: code,
            remaining,
            new_host,
            dissolved,
        })
    }

    /// Removes every empty room and any index entry that points at a room
    /// that no longer exists. Returns the codes of the removed rooms.
    ///
    /// Under normal operation this finds nothing: [`leave`](Self::leave)
    /// removes rooms as soon as they empty.
    pub fn sweep_empty(&mut self) -> Vec<RoomCode> {
        let mut removed: Vec<RoomCode> = self
            .rooms
            .iter()
            .filter(|(_, room)| room.is_empty())
            .map(|(code, _)| code.clone())
            .collect();
        removed.sort();

        for code in &removed {
            self.rooms.remove(code);
        }

        let rooms = &self.rooms;
        self.player_index.retain(|player, code| {
            let live = rooms.get(code).is_some_and(|room| room.contains(*player));
            if !live {
                tracing::warn!(%player, room = %code, "pruned stale index entry");
            }
            live
        });

        removed
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Rooms a new player could join right now: in the lobby and below
    /// capacity. Sorted by creation time, then code.
    pub fn list_joinable(&self) -> Vec<RoomSummary> {
        let mut list: Vec<RoomSummary> = self
            .rooms
            .values()
            .filter(|room| room.state().is_joinable() && !room.is_full())
            .map(Room::summary)
            .collect();
        sort_summaries(&mut list);
        list
    }

    /// Every room regardless of joinability, in the same order as
    /// [`list_joinable`](Self::list_joinable).
    pub fn list_all(&self) -> Vec<RoomSummary> {
        let mut list: Vec<RoomSummary> = self.rooms.values().map(Room::summary).collect();
        sort_summaries(&mut list);
        list
    }

    /// Every room, in creation order.
    pub fn rooms(&self) -> Vec<&Room> {
        let mut rooms: Vec<&Room> = self.rooms.values().collect();
        rooms.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.code().cmp(b.code()))
        });
        rooms
    }

    pub fn room(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    #[cfg(test)]
    pub(crate) fn room_mut(&mut self, code: &RoomCode) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    /// The room `player` is in, if any.
    pub fn room_of(&self, player: PlayerId) -> Option<&Room> {
        self.player_index
            .get(&player)
            .and_then(|code| self.rooms.get(code))
    }

    fn room_of_mut(&mut self, player: PlayerId) -> Option<&mut Room> {
        let code = self.player_index.get(&player)?;
        self.rooms.get_mut(code)
    }

    /// The code of the room `player` is in, if any.
    pub fn player_room(&self, player: PlayerId) -> Option<&RoomCode> {
        self.player_index.get(&player)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Players currently in some room.
    pub fn player_count(&self) -> usize {
        self.rooms.values().map(Room::player_count).sum()
    }

    /// Returns `true` if the player index and the rosters agree exactly.
    pub fn verify_index(&self) -> bool {
        let indexed_ok = self.player_index.iter().all(|(player, code)| {
            self.rooms
                .get(code)
                .is_some_and(|room| room.contains(*player))
        });
        let rostered_ok = self.rooms.iter().all(|(code, room)| {
            room.member_ids()
                .all(|player| self.player_index.get(&player) == Some(code))
        });
        indexed_ok && rostered_ok && self.player_index.len() == self.player_count()
    }

    /// Detaches `player` from the index without touching any roster.
    #[cfg(test)]
    pub(crate) fn forget_player(&mut self, player: PlayerId) {
        self.player_index.remove(&player);
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}

fn sort_summaries(list: &mut [RoomSummary]) {
    list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}
