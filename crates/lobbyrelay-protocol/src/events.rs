//! Inbound and outbound events.
//!
//! Every frame on the wire is an adjacently tagged object:
//!
//! ```text
//! { "event": "joinRoom", "data": { "roomId": "K7QX2M", "playerData": { ... } } }
//! ```
//!
//! `data` may be left out (or `null`) for events without a payload, so
//! `{"event":"startGame"}` is a complete frame.
//!
//! Field names are camelCase to match what browser clients send. Payloads
//! the relay only forwards (player data, inputs, action data, update
//! bodies) stay as opaque `serde_json::Value` blobs; the only payload the
//! relay reads is [`ObjectData`], whose required fields are validated at
//! decode time.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use serde_json::{Map, Number, Value};

use crate::{PlayerId, PlayerRecord, RoomCode, RoomSummary};

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Events a client may send.
///
/// A dropped connection is not a wire event; the connection loop turns
/// it into the same cleanup as [`ClientEvent::LeaveRoom`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    remote = "Self",
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Open a new room with the sender as host.
    CreateRoom {
        #[serde(default)]
        player_data: Value,
    },

    /// Join an existing room by code.
    JoinRoom {
        room_id: RoomCode,
        #[serde(default)]
        player_data: Value,
    },

    /// Ask for rooms that can currently be joined.
    GetRoomList {},

    /// Host only: move the room from lobby to in-progress.
    StartGame {},

    /// Raw input, relayed with the client's own timestamp.
    PlayerInput {
        #[serde(default)]
        input: Value,
        #[serde(default)]
        timestamp: Option<Number>,
    },

    /// Arbitrary client-computed state, relayed with a server timestamp.
    PlayerUpdate(Value),

    /// A named action, relayed with a server timestamp.
    PlayerAction {
        action: String,
        #[serde(default)]
        action_data: Value,
    },

    /// A change to shared world objects (coins, blocks...).
    GameObjectUpdate {
        object_data: ObjectData,
        #[serde(default)]
        timestamp: Option<Number>,
    },

    /// Leave the current room.
    LeaveRoom {},
}

impl ClientEvent {
    /// The wire name of the event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "createRoom",
            Self::JoinRoom { .. } => "joinRoom",
            Self::GetRoomList {} => "getRoomList",
            Self::StartGame {} => "startGame",
            Self::PlayerInput { .. } => "playerInput",
            Self::PlayerUpdate(_) => "playerUpdate",
            Self::PlayerAction { .. } => "playerAction",
            Self::GameObjectUpdate { .. } => "gameObjectUpdate",
            Self::LeaveRoom {} => "leaveRoom",
        }
    }
}

impl Serialize for ClientEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ClientEvent::serialize(self, serializer)
    }
}

impl<'de> Deserialize<'de> for ClientEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut frame = Map::<String, Value>::deserialize(deserializer)?;
        if matches!(frame.get("data"), None | Some(Value::Null)) {
            frame.insert("data".into(), Value::Object(Map::new()));
        }
        ClientEvent::deserialize(Value::Object(frame)).map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// World objects
// ---------------------------------------------------------------------------

/// Identifier of a world object.
///
/// Clients use strings or numbers. The id goes back out on the wire
/// exactly as it came in; bookkeeping keys it by its text form, so `7`
/// and `"7"` name the same object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObjectId {
    Text(String),
    Number(Number),
}

impl ObjectId {
    /// The key this object is stored under.
    pub fn key(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Number(n) => Cow::Owned(n.to_string()),
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl From<&str> for ObjectId {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for ObjectId {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<u64> for ObjectId {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

/// Payload of a `gameObjectUpdate`.
///
/// `id`, `type` and `action` are required; everything else the client
/// put in the object (position, colour, owner...) is kept verbatim in
/// `extra` and relayed unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectData {
    pub id: ObjectId,
    #[serde(rename = "type")]
    pub kind: String,
    pub action: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// How an [`ObjectData`] update affects the room's world bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldChange<'a> {
    CoinCollected { id: Cow<'a, str> },
    BlockCreated { id: Cow<'a, str> },
    BlockDestroyed { id: Cow<'a, str> },
    /// Relayed to the room but not reflected in world state.
    Unrecognized,
}

impl ObjectData {
    /// Classifies this update by its `(type, action)` pair.
    pub fn change(&self) -> WorldChange<'_> {
        let id = self.id.key();
        match (self.kind.as_str(), self.action.as_str()) {
            ("coin", "collected") => WorldChange::CoinCollected { id },
            ("block", "created") => WorldChange::BlockCreated { id },
            ("block", "destroyed") => WorldChange::BlockDestroyed { id },
            _ => WorldChange::Unrecognized,
        }
    }
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Events the relay sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Reply to `createRoom`.
    RoomCreated {
        room_id: RoomCode,
        players: Vec<PlayerRecord>,
        is_host: bool,
    },

    /// Reply to `joinRoom`.
    RoomJoined {
        room_id: RoomCode,
        players: Vec<PlayerRecord>,
        is_host: bool,
    },

    /// A request failed. Only ever sent to the requester.
    RoomError { error: String },

    /// Reply to `getRoomList`.
    RoomList(Vec<RoomSummary>),

    PlayerJoined {
        player_id: PlayerId,
        player_data: Value,
    },

    /// Sent to every member, the host included.
    GameStarted {
        room_id: RoomCode,
        players: Vec<PlayerRecord>,
    },

    /// `timestamp` is the client's, passed through untouched.
    PlayerInput {
        player_id: PlayerId,
        input: Value,
        timestamp: Option<Number>,
    },

    /// `timestamp` is server time (epoch ms).
    PlayerUpdate {
        player_id: PlayerId,
        state: Value,
        timestamp: i64,
    },

    /// `timestamp` is server time (epoch ms).
    PlayerAction {
        player_id: PlayerId,
        action: String,
        action_data: Value,
        timestamp: i64,
    },

    /// `timestamp` is the client's, passed through untouched.
    GameObjectUpdate {
        player_id: PlayerId,
        object_data: ObjectData,
        timestamp: Option<Number>,
    },

    /// `host_id` is present only when this departure moved the host role.
    PlayerLeft {
        player_id: PlayerId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        host_id: Option<PlayerId>,
    },
}

impl ServerEvent {
    /// Builds a `roomError` event.
    pub fn error(message: impl Into<String>) -> Self {
        Self::RoomError {
            error: message.into(),
        }
    }

    /// The wire name of the event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoomCreated { .. } => "roomCreated",
            Self::RoomJoined { .. } => "roomJoined",
            Self::RoomError { .. } => "roomError",
            Self::RoomList(_) => "roomList",
            Self::PlayerJoined { .. } => "playerJoined",
            Self::GameStarted { .. } => "gameStarted",
            Self::PlayerInput { .. } => "playerInput",
            Self::PlayerUpdate { .. } => "playerUpdate",
            Self::PlayerAction { .. } => "playerAction",
            Self::GameObjectUpdate { .. } => "gameObjectUpdate",
            Self::PlayerLeft { .. } => "playerLeft",
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The exact JSON shapes matter here: browser clients match on the
    //! `event` string and read camelCase fields out of `data`.

    use serde_json::json;

    use super::*;

    fn decode(value: Value) -> ClientEvent {
        serde_json::from_value(value).expect("should decode")
    }

    #[test]
    fn test_create_room_decodes_player_data() {
        let event = decode(json!({
            "event": "createRoom",
            "data": { "playerData": { "name": "Ada", "color": "red" } }
        }));
        match event {
            ClientEvent::CreateRoom { player_data } => {
                assert_eq!(player_data["name"], "Ada");
            }
            other => panic!("expected CreateRoom, got {other:?}"),
        }
    }

    #[test]
    fn test_join_room_uses_camel_case_and_normalizes_code() {
        let event = decode(json!({
            "event": "joinRoom",
            "data": { "roomId": "abcdef", "playerData": {} }
        }));
        assert_eq!(
            event,
            ClientEvent::JoinRoom {
                room_id: RoomCode::new("ABCDEF"),
                player_data: json!({}),
            }
        );
    }

    #[test]
    fn test_join_room_without_room_id_fails() {
        let result: Result<ClientEvent, _> = serde_json::from_value(json!({
            "event": "joinRoom",
            "data": { "playerData": {} }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_payload_events() {
        assert_eq!(
            decode(json!({ "event": "startGame", "data": {} })),
            ClientEvent::StartGame {}
        );
        assert_eq!(
            decode(json!({ "event": "leaveRoom", "data": {} })),
            ClientEvent::LeaveRoom {}
        );
        assert_eq!(
            decode(json!({ "event": "getRoomList", "data": {} })),
            ClientEvent::GetRoomList {}
        );
    }

    #[test]
    fn test_empty_payload_events_without_data() {
        assert_eq!(decode(json!({ "event": "startGame" })), ClientEvent::StartGame {});
        assert_eq!(decode(json!({ "event": "leaveRoom" })), ClientEvent::LeaveRoom {});
        assert_eq!(
            decode(json!({ "event": "getRoomList", "data": null })),
            ClientEvent::GetRoomList {}
        );
    }

    #[test]
    fn test_missing_data_still_requires_mandatory_fields() {
        let join: Result<ClientEvent, _> =
            serde_json::from_value(json!({ "event": "joinRoom" }));
        assert!(join.is_err());

        let unknown: Result<ClientEvent, _> =
            serde_json::from_value(json!({ "event": "teleport" }));
        assert!(unknown.is_err());

        assert_eq!(
            decode(json!({ "event": "createRoom" })),
            ClientEvent::CreateRoom { player_data: Value::Null }
        );
    }

    #[test]
    fn test_client_event_serializes_with_data() {
        let json = serde_json::to_value(ClientEvent::StartGame {}).unwrap();
        assert_eq!(json, json!({ "event": "startGame", "data": {} }));
    }

    #[test]
    fn test_player_update_keeps_arbitrary_body() {
        let event = decode(json!({
            "event": "playerUpdate",
            "data": { "x": 1.5, "y": -2, "anim": "run" }
        }));
        match event {
            ClientEvent::PlayerUpdate(state) => {
                assert_eq!(state["anim"], "run");
                assert_eq!(state["x"], 1.5);
            }
            other => panic!("expected PlayerUpdate, got {other:?}"),
        }
    }

    #[test]
    fn test_player_input_timestamp_is_optional() {
        let event = decode(json!({
            "event": "playerInput",
            "data": { "input": { "left": true } }
        }));
        assert!(matches!(
            event,
            ClientEvent::PlayerInput { timestamp: None, .. }
        ));
    }

    #[test]
    fn test_object_data_requires_id_type_and_action() {
        let missing_action: Result<ClientEvent, _> =
            serde_json::from_value(json!({
                "event": "gameObjectUpdate",
                "data": { "objectData": { "id": "c1", "type": "coin" } }
            }));
        assert!(missing_action.is_err());

        let missing_id: Result<ClientEvent, _> =
            serde_json::from_value(json!({
                "event": "gameObjectUpdate",
                "data": { "objectData": { "type": "coin", "action": "collected" } }
            }));
        assert!(missing_id.is_err());
    }

    #[test]
    fn test_object_data_keeps_extra_fields_on_the_wire() {
        let object: ObjectData = serde_json::from_value(json!({
            "id": "b1",
            "type": "block",
            "action": "created",
            "x": 3,
            "material": "stone"
        }))
        .unwrap();
        assert_eq!(object.extra["material"], "stone");

        let back = serde_json::to_value(&object).unwrap();
        assert_eq!(back["type"], "block");
        assert_eq!(back["x"], 3);
    }

    #[test]
    fn test_numeric_object_id_is_accepted_and_kept_as_a_number() {
        let event = decode(json!({
            "event": "gameObjectUpdate",
            "data": { "objectData": { "id": 7, "type": "coin", "action": "collected" } }
        }));
        let ClientEvent::GameObjectUpdate { object_data, .. } = event else {
            panic!("expected GameObjectUpdate");
        };
        assert_eq!(object_data.id, ObjectId::from(7));
        assert_eq!(
            object_data.change(),
            WorldChange::CoinCollected { id: "7".into() }
        );

        let back = serde_json::to_value(&object_data).unwrap();
        assert_eq!(back["id"], 7);
    }

    #[test]
    fn test_object_id_rejects_non_scalar_values() {
        let result: Result<ObjectData, _> = serde_json::from_value(json!({
            "id": { "nested": true },
            "type": "block",
            "action": "created"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_object_data_change_classification() {
        let object = |kind: &str, action: &str| ObjectData {
            id: "o1".into(),
            kind: kind.into(),
            action: action.into(),
            extra: Map::new(),
        };
        assert_eq!(
            object("coin", "collected").change(),
            WorldChange::CoinCollected { id: "o1".into() }
        );
        assert_eq!(
            object("block", "created").change(),
            WorldChange::BlockCreated { id: "o1".into() }
        );
        assert_eq!(
            object("block", "destroyed").change(),
            WorldChange::BlockDestroyed { id: "o1".into() }
        );
        assert_eq!(object("enemy", "spawned").change(), WorldChange::Unrecognized);
        assert_eq!(object("coin", "dropped").change(), WorldChange::Unrecognized);
    }

    #[test]
    fn test_room_created_json_shape() {
        let event = ServerEvent::RoomCreated {
            room_id: RoomCode::new("ABCDEF"),
            players: vec![PlayerRecord {
                id: PlayerId(1),
                data: json!({ "name": "Ada" }),
                joined_at: 10,
            }],
            is_host: true,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "roomCreated");
        assert_eq!(json["data"]["roomId"], "ABCDEF");
        assert_eq!(json["data"]["isHost"], true);
        assert_eq!(json["data"]["players"][0]["joinedAt"], 10);
    }

    #[test]
    fn test_room_list_data_is_an_array() {
        let json = serde_json::to_value(ServerEvent::RoomList(vec![])).unwrap();
        assert_eq!(json, json!({ "event": "roomList", "data": [] }));
    }

    #[test]
    fn test_player_left_omits_host_id_unless_reassigned() {
        let plain = serde_json::to_value(ServerEvent::PlayerLeft {
            player_id: PlayerId(2),
            host_id: None,
        })
        .unwrap();
        assert!(plain["data"].get("hostId").is_none());

        let handover = serde_json::to_value(ServerEvent::PlayerLeft {
            player_id: PlayerId(2),
            host_id: Some(PlayerId(5)),
        })
        .unwrap();
        assert_eq!(handover["data"]["hostId"], 5);
    }

    #[test]
    fn test_player_input_passes_client_timestamp_through() {
        let inbound = decode(json!({
            "event": "playerInput",
            "data": { "input": { "jump": true }, "timestamp": 123.5 }
        }));
        let ClientEvent::PlayerInput { input, timestamp } = inbound else {
            panic!("expected PlayerInput");
        };
        let outbound = serde_json::to_value(ServerEvent::PlayerInput {
            player_id: PlayerId(9),
            input,
            timestamp,
        })
        .unwrap();
        assert_eq!(outbound["data"]["timestamp"], 123.5);
        assert_eq!(outbound["data"]["input"]["jump"], true);
        assert_eq!(outbound["data"]["playerId"], 9);
    }

    #[test]
    fn test_error_helper_and_names() {
        let event = ServerEvent::error("Room is full");
        assert_eq!(event.name(), "roomError");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["data"]["error"], "Room is full");
        assert_eq!(ClientEvent::StartGame {}.name(), "startGame");
    }
}
