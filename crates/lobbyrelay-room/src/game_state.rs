//! Shared world-object bookkeeping for a room.

use std::collections::BTreeMap;

use lobbyrelay_protocol::{ObjectData, PlayerId, WorldChange};
use serde::Serialize;
use serde_json::Value;

/// Who collected a coin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoinState {
    pub collected: bool,
    pub by: PlayerId,
}

/// World objects every member of a room must agree on.
///
/// Updates are last-writer-wins in server-arrival order; there is no
/// validation that a coin was really reachable or a block really placed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GameState {
    pub coins: BTreeMap<String, CoinState>,
    pub blocks: BTreeMap<String, ObjectData>,
    /// Reserved; nothing writes here yet.
    pub enemies: BTreeMap<String, Value>,
}

impl GameState {
    /// Applies one object update on behalf of `by`.
    ///
    /// Returns `false` for kinds the relay does not track. Those are still
    /// relayed to the room by the caller, they just leave no trace here.
    pub fn apply(&mut self, by: PlayerId, object: &ObjectData) -> bool {
        match object.change() {
            WorldChange::CoinCollected { id } => {
                self.coins
                    .insert(id.into_owned(), CoinState { collected: true, by });
                true
            }
            WorldChange::BlockCreated { id } => {
                self.blocks.insert(id.into_owned(), object.clone());
                true
            }
            WorldChange::BlockDestroyed { id } => {
                self.blocks.remove(id.as_ref());
                true
            }
            WorldChange::Unrecognized => false,
        }
    }
}
