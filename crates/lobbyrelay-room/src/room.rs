//! A single room: roster, host pointer, lifecycle flag, and world state.
//!
//! `Room` is plain data with no locking of its own. It is only ever
//! reached through the [`RoomRegistry`](crate::RoomRegistry), which keeps
//! the player index in step with every roster change.

use lobbyrelay_protocol::{
    ObjectData, PlayerId, PlayerRecord, Recipient, RoomCode, RoomSummary,
    now_millis,
};
use serde_json::Value;

use crate::{GameState, RoomConfig, RoomError, RoomState};

/// One lobby/session.
#[derive(Debug, Clone)]
pub struct Room {
    code: RoomCode,
    config: RoomConfig,
    /// `None` only before the first player is added.
    host: Option<PlayerId>,
    /// Join order is preserved; the front is the oldest member.
    players: Vec<PlayerRecord>,
    state: RoomState,
    game_state: GameState,
    created_at: i64,
}

impl Room {
    /// Creates an empty room in the lobby.
    pub fn new(code: RoomCode, config: RoomConfig) -> Self {
        Self {
            code,
            config,
            host: None,
            players: Vec::with_capacity(config.max_players),
            state: RoomState::Lobby,
            game_state: GameState::default(),
            created_at: now_millis(),
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn host_id(&self) -> Option<PlayerId> {
        self.host
    }

    pub fn state(&self) -> RoomState {
        self.state
    }

    pub fn is_started(&self) -> bool {
        self.state.is_started()
    }

    pub fn max_players(&self) -> usize {
        self.config.max_players
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.config.max_players
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    /// Adds a player, stamped with the current time.
    ///
    /// The first player added becomes host.
    ///
    /// # Errors
    /// - [`RoomError::RoomFull`] at capacity
    /// - [`RoomError::AlreadyInRoom`] if the id is already on the roster
    pub fn add_player(
        &mut self,
        player_id: PlayerId,
        data: Value,
    ) -> Result<(), RoomError> {
        if self.is_full() {
            return Err(RoomError::RoomFull(self.code.clone()));
        }
        if self.contains(player_id) {
            return Err(RoomError::AlreadyInRoom(player_id, self.code.clone()));
        }

        self.players.push(PlayerRecord {
            id: player_id,
            data,
            joined_at: now_millis(),
        });
        if self.host.is_none() {
            self.host = Some(player_id);
        }
        Ok(())
    }

    /// Removes a player; a no-op if they are not on the roster.
    ///
    /// If the host leaves and anyone remains, the host role passes to the
    /// oldest remaining member. Returns the removed record.
    pub fn remove_player(&mut self, player_id: PlayerId) -> Option<PlayerRecord> {
        let idx = self.players.iter().position(|p| p.id == player_id)?;
        let removed = self.players.remove(idx);

        if self.host == Some(player_id) {
            self.host = self.players.first().map(|p| p.id);
            if let Some(new_host) = self.host {
                tracing::info!(
                    room = %self.code,
                    old_host = %player_id,
                    %new_host,
                    "host reassigned"
                );
            }
        }
        Some(removed)
    }

    /// `true` iff someone is in the room and the game has not started.
    ///
    /// A lone player may start: there is no minimum party size.
    pub fn can_start(&self) -> bool {
        !self.players.is_empty() && !self.state.is_started()
    }

    /// Moves the room from the lobby to in-progress on behalf of `by`.
    ///
    /// # Errors
    /// - [`RoomError::NotHost`] unless `by` is the current host
    /// - [`RoomError::CannotStart`] if [`can_start`](Self::can_start) is false
    pub fn start(&mut self, by: PlayerId) -> Result<(), RoomError> {
        if self.host != Some(by) {
            return Err(RoomError::NotHost(by, self.code.clone()));
        }
        if !self.can_start() || !self.state.can_transition_to(RoomState::InProgress) {
            return Err(RoomError::CannotStart(self.code.clone()));
        }
        self.state = RoomState::InProgress;
        tracing::info!(room = %self.code, players = self.players.len(), "game started");
        Ok(())
    }

    /// Applies a world-object update made by `by`. See [`GameState::apply`].
    pub fn apply_object_update(&mut self, by: PlayerId, object: &ObjectData) -> bool {
        self.game_state.apply(by, object)
    }

    /// Read-only copy of the roster, in join order.
    pub fn snapshot(&self) -> Vec<PlayerRecord> {
        self.players.clone()
    }

    /// Member ids in join order.
    pub fn member_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players.iter().map(|p| p.id)
    }

    /// Resolves a [`Recipient`] against the current roster.
    pub fn recipients(&self, recipient: Recipient) -> Vec<PlayerId> {
        match recipient {
            Recipient::All => self.member_ids().collect(),
            Recipient::Player(pid) => {
                if self.contains(pid) {
                    vec![pid]
                } else {
                    Vec::new()
                }
            }
            Recipient::AllExcept(excluded) => {
                self.member_ids().filter(|pid| *pid != excluded).collect()
            }
        }
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.code.clone(),
            player_count: self.players.len(),
            max_players: self.config.max_players,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn room(max: usize) -> Room {
        Room::new(RoomCode::new("ROOM01"), RoomConfig::with_max_players(max))
    }

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    #[test]
    fn test_first_player_becomes_host() {
        let mut room = room(4);
        assert_eq!(room.host_id(), None);
        room.add_player(pid(1), json!({ "name": "a" })).unwrap();
        room.add_player(pid(2), json!({})).unwrap();
        assert_eq!(room.host_id(), Some(pid(1)));
        assert_eq!(room.player_count(), 2);
    }

    #[test]
    fn test_add_player_full_does_not_mutate() {
        let mut room = room(2);
        room.add_player(pid(1), json!({})).unwrap();
        room.add_player(pid(2), json!({})).unwrap();

        let before = room.snapshot();
        let err = room.add_player(pid(3), json!({})).unwrap_err();
        assert!(matches!(err, RoomError::RoomFull(_)));
        assert_eq!(room.snapshot(), before);
    }

    #[test]
    fn test_add_player_rejects_duplicate() {
        let mut room = room(4);
        room.add_player(pid(1), json!({})).unwrap();
        let err = room.add_player(pid(1), json!({})).unwrap_err();
        assert!(matches!(err, RoomError::AlreadyInRoom(..)));
        assert_eq!(room.player_count(), 1);
    }

    #[test]
    fn test_host_passes_to_oldest_remaining_member() {
        let mut room = room(4);
        for id in [10, 20, 30, 40] {
            room.add_player(pid(id), json!({})).unwrap();
        }
        room.remove_player(pid(10));
        assert_eq!(room.host_id(), Some(pid(20)));

        // Removing a non-host leaves the host alone.
        room.remove_player(pid(30));
        assert_eq!(room.host_id(), Some(pid(20)));

        room.remove_player(pid(20));
        assert_eq!(room.host_id(), Some(pid(40)));
    }

    #[test]
    fn test_host_reassignment_is_reproducible() {
        for _ in 0..20 {
            let mut room = room(4);
            for id in [5, 3, 9, 1] {
                room.add_player(pid(id), json!({})).unwrap();
            }
            room.remove_player(pid(5));
            assert_eq!(room.host_id(), Some(pid(3)));
        }
    }

    #[test]
    fn test_remove_absent_player_is_noop() {
        let mut room = room(4);
        room.add_player(pid(1), json!({})).unwrap();
        assert!(room.remove_player(pid(99)).is_none());
        assert_eq!(room.player_count(), 1);
        assert_eq!(room.host_id(), Some(pid(1)));
    }

    #[test]
    fn test_last_player_leaving_empties_room() {
        let mut room = room(4);
        room.add_player(pid(1), json!({})).unwrap();
        room.remove_player(pid(1));
        assert!(room.is_empty());
        assert_eq!(room.host_id(), None);
    }

    #[test]
    fn test_can_start_alone_and_only_once() {
        let mut room = room(4);
        assert!(!room.can_start());
        room.add_player(pid(1), json!({})).unwrap();
        assert!(room.can_start());

        room.start(pid(1)).unwrap();
        assert!(room.is_started());
        assert!(!room.can_start());
        assert!(matches!(room.start(pid(1)), Err(RoomError::CannotStart(_))));
        assert_eq!(room.state(), RoomState::InProgress);
    }

    #[test]
    fn test_only_host_may_start() {
        let mut room = room(4);
        room.add_player(pid(1), json!({})).unwrap();
        room.add_player(pid(2), json!({})).unwrap();
        assert!(matches!(room.start(pid(2)), Err(RoomError::NotHost(..))));
        assert_eq!(room.state(), RoomState::Lobby);
    }

    #[test]
    fn test_recipients_resolution() {
        let mut room = room(4);
        for id in [1, 2, 3] {
            room.add_player(pid(id), json!({})).unwrap();
        }
        assert_eq!(room.recipients(Recipient::All), vec![pid(1), pid(2), pid(3)]);
        assert_eq!(room.recipients(Recipient::AllExcept(pid(2))), vec![pid(1), pid(3)]);
        assert_eq!(room.recipients(Recipient::Player(pid(3))), vec![pid(3)]);
        assert!(room.recipients(Recipient::Player(pid(9))).is_empty());
    }

    #[test]
    fn test_snapshot_preserves_join_order_and_data() {
        let mut room = room(4);
        room.add_player(pid(2), json!({ "name": "b" })).unwrap();
        room.add_player(pid(1), json!({ "name": "a" })).unwrap();
        let snapshot = room.snapshot();
        assert_eq!(snapshot[0].id, pid(2));
        assert_eq!(snapshot[1].data["name"], "a");
        assert!(snapshot[0].joined_at <= snapshot[1].joined_at);
    }

    #[test]
    fn test_summary() {
        let mut room = room(3);
        room.add_player(pid(1), json!({})).unwrap();
        let summary = room.summary();
        assert_eq!(summary.id.as_str(), "ROOM01");
        assert_eq!(summary.player_count, 1);
        assert_eq!(summary.max_players, 3);
        assert_eq!(summary.created_at, room.created_at());
    }
}
