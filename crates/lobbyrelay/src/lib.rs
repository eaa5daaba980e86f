//! # lobbyrelay
//!
//! A WebSocket relay for small multiplayer browser games.
//!
//! Clients create or join short-coded rooms, the host starts the game,
//! and from then on the relay forwards every member's input, state and
//! actions to the rest of the room. It keeps just enough shared world
//! state (collected coins, placed blocks) for late readers of the
//! diagnostic endpoints; it never simulates the game.
//!
//! ```text
//! Transport (WebSocket text frames)
//!   → Protocol (ClientEvent / ServerEvent)
//!   → Session handling (handle_event → deliveries)
//!   → Room registry (rooms, player index, sweeper)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lobbyrelay::RelayServer;
//!
//! # async fn run() -> Result<(), lobbyrelay::RelayError> {
//! let server = RelayServer::builder()
//!     .bind("0.0.0.0:3001")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod logging;
mod server;
pub mod session;
pub mod status;

pub use config::{Cli, DEFAULT_ALLOWED_ORIGINS, RelayConfig};
pub use error::RelayError;
pub use logging::{default_filter, init_tracing};
pub use server::{RelayServer, RelayServerBuilder};

/// Commonly used types, re-exported from every layer.
pub mod prelude {
    pub use crate::{RelayConfig, RelayError, RelayServer, RelayServerBuilder};
    pub use lobbyrelay_protocol::{
        ClientEvent, Codec, JsonCodec, ObjectData, ObjectId, PlayerId, PlayerRecord,
        RoomCode, RoomSummary, ServerEvent,
    };
    pub use lobbyrelay_room::{
        GameState, Room, RoomConfig, RoomError, RoomRegistry, RoomState,
    };
    pub use lobbyrelay_transport::OriginPolicy;
}
