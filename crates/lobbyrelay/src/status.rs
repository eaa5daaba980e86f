//! Read-only diagnostic HTTP endpoints.
//!
//! Served on their own listener next to the WebSocket one:
//!
//! - `GET /status`: aggregate room and player counts
//! - `GET /rooms`: every room, joinable or not
//! - `GET /rooms/{id}`: one room with its roster and world state
//!
//! Handlers lock the registry, copy what they need into a DTO, and
//! release the lock before serializing. Nothing here mutates it.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderValue, Method, StatusCode},
    routing::get,
};
use lobbyrelay_protocol::{PlayerId, PlayerRecord, RoomCode};
use lobbyrelay_room::{GameState, Room, RoomRegistry};
use lobbyrelay_transport::OriginPolicy;
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
struct StatusState {
    registry: Arc<Mutex<RoomRegistry>>,
    started: Instant,
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDto {
    pub status: &'static str,
    pub rooms: usize,
    pub players: usize,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDto {
    pub id: RoomCode,
    pub player_count: usize,
    pub max_players: usize,
    pub started: bool,
    pub host_id: Option<PlayerId>,
    pub created_at: i64,
}

impl From<&Room> for RoomDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.code().clone(),
            player_count: room.player_count(),
            max_players: room.max_players(),
            started: room.is_started(),
            host_id: room.host_id(),
            created_at: room.created_at(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailDto {
    #[serde(flatten)]
    pub room: RoomDto,
    pub players: Vec<PlayerRecord>,
    pub game_state: GameState,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Builds the diagnostic router.
///
/// CORS follows the same allow-list as the WebSocket handshake.
pub fn router(
    registry: Arc<Mutex<RoomRegistry>>,
    origins: &OriginPolicy,
    started: Instant,
) -> Router {
    let allow_origin = match origins.origins() {
        None => AllowOrigin::any(),
        Some(list) => AllowOrigin::list(
            list.iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        ),
    };
    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/status", get(status))
        .route("/rooms", get(list_rooms))
        .route("/rooms/{id}", get(room_detail))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(StatusState { registry, started })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn status(State(state): State<StatusState>) -> Json<StatusDto> {
    let (rooms, players) = {
        let registry = state.registry.lock().await;
        (registry.room_count(), registry.player_count())
    };
    Json(StatusDto {
        status: "ok",
        rooms,
        players,
        uptime_secs: state.started.elapsed().as_secs(),
    })
}

async fn list_rooms(State(state): State<StatusState>) -> Json<Vec<RoomDto>> {
    let rooms: Vec<RoomDto> = {
        let registry = state.registry.lock().await;
        registry.rooms().into_iter().map(RoomDto::from).collect()
    };
    Json(rooms)
}

async fn room_detail(
    State(state): State<StatusState>,
    Path(id): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    let code = RoomCode::new(id);
    let registry = state.registry.lock().await;
    let room = registry.room(&code).ok_or(StatusCode::NOT_FOUND)?;
    let detail = RoomDetailDto {
        room: RoomDto::from(room),
        players: room.snapshot(),
        game_state: room.game_state().clone(),
    };
    drop(registry);
    Ok(Json(detail))
}
