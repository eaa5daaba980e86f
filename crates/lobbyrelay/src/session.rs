//! Session protocol handling: one client event in, a list of deliveries out.
//!
//! Nothing here touches a socket. The caller holds the registry lock,
//! calls [`handle_event`], and enqueues the returned deliveries before
//! releasing it. That keeps every room's events in server-arrival order
//! and lets the whole protocol be tested without a transport.

use lobbyrelay_protocol::{
    ClientEvent, PlayerId, Recipient, ServerEvent, now_millis,
};
use lobbyrelay_room::{Room, RoomError, RoomRegistry};

/// Reply sent for a frame that could not be decoded into a [`ClientEvent`].
pub const MALFORMED_REQUEST: &str = "Malformed request";

/// One event addressed to one player.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub to: PlayerId,
    pub event: ServerEvent,
}

impl Delivery {
    pub fn new(to: PlayerId, event: ServerEvent) -> Self {
        Self { to, event }
    }
}

/// Applies `event` from `sender` to the registry.
///
/// Request errors become a `roomError` delivery to the sender only.
/// Relay events from a sender who is not in a room are dropped without
/// a reply.
pub fn handle_event(
    registry: &mut RoomRegistry,
    sender: PlayerId,
    event: ClientEvent,
) -> Vec<Delivery> {
    match event {
        ClientEvent::CreateRoom { player_data } => {
            match registry.create_room(sender, player_data) {
                Ok(room) => vec![Delivery::new(
                    sender,
                    ServerEvent::RoomCreated {
                        room_id: room.code().clone(),
                        players: room.snapshot(),
                        is_host: room.host_id() == Some(sender),
                    },
                )],
                Err(e) => reject(sender, "createRoom", e),
            }
        }

        ClientEvent::JoinRoom {
            room_id,
            player_data,
        } => match registry.join_room(&room_id, sender, player_data.clone()) {
            Ok(room) => {
                let mut out = vec![Delivery::new(
                    sender,
                    ServerEvent::RoomJoined {
                        room_id: room.code().clone(),
                        players: room.snapshot(),
                        is_host: room.host_id() == Some(sender),
                    },
                )];
                out.extend(fan_out(
                    room,
                    Recipient::AllExcept(sender),
                    ServerEvent::PlayerJoined {
                        player_id: sender,
                        player_data,
                    },
                ));
                out
            }
            Err(e) => reject(sender, "joinRoom", e),
        },

        ClientEvent::GetRoomList {} => {
            vec![Delivery::new(
                sender,
                ServerEvent::RoomList(registry.list_joinable()),
            )]
        }

        ClientEvent::StartGame {} => match registry.start_game(sender) {
            Ok(room) => fan_out(
                room,
                Recipient::All,
                ServerEvent::GameStarted {
                    room_id: room.code().clone(),
                    players: room.snapshot(),
                },
            ),
            Err(e) => reject(sender, "startGame", e),
        },

        ClientEvent::PlayerInput { input, timestamp } => relay(
            registry,
            sender,
            ServerEvent::PlayerInput {
                player_id: sender,
                input,
                timestamp,
            },
        ),

        ClientEvent::PlayerUpdate(state) => relay(
            registry,
            sender,
            ServerEvent::PlayerUpdate {
                player_id: sender,
                state,
                timestamp: now_millis(),
            },
        ),

        ClientEvent::PlayerAction {
            action,
            action_data,
        } => relay(
            registry,
            sender,
            ServerEvent::PlayerAction {
                player_id: sender,
                action,
                action_data,
                timestamp: now_millis(),
            },
        ),

        ClientEvent::GameObjectUpdate {
            object_data,
            timestamp,
        } => {
            let Some((room, stored)) = registry.apply_object_update(sender, &object_data)
            else {
                tracing::debug!(%sender, "gameObjectUpdate outside a room, dropped");
                return Vec::new();
            };
            if !stored {
                tracing::debug!(
                    room = %room.code(),
                    kind = %object_data.kind,
                    action = %object_data.action,
                    "unrecognized object update, relayed without bookkeeping"
                );
            }
            fan_out(
                room,
                Recipient::AllExcept(sender),
                ServerEvent::GameObjectUpdate {
                    player_id: sender,
                    object_data,
                    timestamp,
                },
            )
        }

        ClientEvent::LeaveRoom {} => handle_disconnect(registry, sender),
    }
}

/// Removes `sender` from their room and tells whoever is left.
///
/// Used for both an explicit `leaveRoom` and a dropped connection. A
/// player who is not in a room produces nothing.
pub fn handle_disconnect(registry: &mut RoomRegistry, sender: PlayerId) -> Vec<Delivery> {
    let Some(departure) = registry.leave(sender) else {
        return Vec::new();
    };
    let event = ServerEvent::PlayerLeft {
        player_id: sender,
        host_id: departure.new_host,
    };
    departure
        .remaining
        .into_iter()
        .map(|to| Delivery::new(to, event.clone()))
        .collect()
}

fn fan_out(room: &Room, recipient: Recipient, event: ServerEvent) -> Vec<Delivery> {
    room.recipients(recipient)
        .into_iter()
        .map(|to| Delivery::new(to, event.clone()))
        .collect()
}

/// Broadcasts `event` to everyone else in the sender's room.
fn relay(registry: &RoomRegistry, sender: PlayerId, event: ServerEvent) -> Vec<Delivery> {
    match registry.room_of(sender) {
        Some(room) => fan_out(room, Recipient::AllExcept(sender), event),
        None => {
            tracing::debug!(%sender, event = event.name(), "relay outside a room, dropped");
            Vec::new()
        }
    }
}

fn reject(sender: PlayerId, request: &'static str, error: RoomError) -> Vec<Delivery> {
    if error.is_client_error() {
        tracing::debug!(%sender, request, %error, "request rejected");
    } else {
        tracing::error!(%sender, request, %error, "request failed");
    }
    vec![Delivery::new(sender, ServerEvent::error(error.client_message()))]
}
