//! Wire protocol for lobbyrelay.
//!
//! This crate defines the "language" that clients and the relay speak:
//!
//! - **Identity and summary types** ([`PlayerId`], [`RoomCode`],
//!   [`PlayerRecord`], [`RoomSummary`], [`Recipient`]).
//! - **Events** ([`ClientEvent`], [`ServerEvent`], [`ObjectData`]) —
//!   every frame is `{"event": <name>, "data": <payload>}`.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how events are
//!   converted to and from text frames.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (text frames) → Protocol (events) → Room registry / handler
//! ```

mod codec;
mod error;
mod events;
mod time;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use events::{ClientEvent, ObjectData, ObjectId, ServerEvent, WorldChange};
pub use time::now_millis;
pub use types::{PlayerId, PlayerRecord, Recipient, RoomCode, RoomSummary};
