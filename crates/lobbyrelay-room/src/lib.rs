//! Rooms and the registry that owns them.
//!
//! Everything here is plain synchronous data. The server shares one
//! [`RoomRegistry`] behind a `tokio::sync::Mutex`; every protocol event
//! and every sweep runs against it one at a time.
//!
//! # Key types
//!
//! - [`Room`]: roster, host, lobby/in-progress flag, world state
//! - [`RoomRegistry`]: creates and removes rooms, keeps the player index
//! - [`GameState`]: last-writer-wins coin and block bookkeeping
//! - [`RoomState`]: lifecycle state machine
//! - [`RoomConfig`]: room settings (player limit)
//! - [`spawn_sweeper`]: background task that removes leaked empty rooms

mod code;
mod config;
mod error;
mod game_state;
mod registry;
mod room;
mod sweeper;

pub use code::{
    CODE_ALPHABET, CODE_LENGTH, CodeSource, MAX_CODE_ATTEMPTS, random_code,
    thread_rng_source,
};
pub use config::{RoomConfig, RoomState};
pub use error::RoomError;
pub use game_state::{CoinState, GameState};
pub use registry::{Departure, RoomRegistry};
pub use room::Room;
pub use sweeper::{DEFAULT_SWEEP_INTERVAL, spawn_sweeper};
