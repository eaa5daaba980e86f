//! Room code generation.
//!
//! Codes are 6 symbols from a 32-symbol alphabet with the easily
//! confused glyphs (`0`/`O`, `1`/`I`) removed, for 32^6 ≈ 1.07 billion
//! possible codes. Collisions with live rooms are retried a bounded
//! number of times; running out of attempts is reported as an error
//! instead of overwriting a room.

use lobbyrelay_protocol::RoomCode;
use rand::Rng;

use crate::RoomError;

/// Symbols a room code is drawn from.
pub const CODE_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Number of symbols in a room code.
pub const CODE_LENGTH: usize = 6;

/// How many fresh codes are tried before giving up.
pub const MAX_CODE_ATTEMPTS: usize = 8;

/// A source of candidate room codes. Boxed so tests can inject a
/// deterministic sequence.
pub type CodeSource = Box<dyn FnMut() -> RoomCode + Send>;

/// Draws one random room code.
pub fn random_code<R: Rng + ?Sized>(rng: &mut R) -> RoomCode {
    let code: String = (0..CODE_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..CODE_ALPHABET.len());
            char::from(CODE_ALPHABET[idx])
        })
        .collect();
    RoomCode::new(code)
}

/// The default [`CodeSource`], backed by the thread-local RNG.
pub fn thread_rng_source() -> CodeSource {
    Box::new(|| random_code(&mut rand::rng()))
}

/// Pulls codes from `source` until one is not `taken`.
pub(crate) fn unique_code(
    source: &mut CodeSource,
    mut taken: impl FnMut(&RoomCode) -> bool,
) -> Result<RoomCode, RoomError> {
    for attempt in 1..=MAX_CODE_ATTEMPTS {
        let code = source();
        if !taken(&code) {
            return Ok(code);
        }
        tracing::debug!(%code, attempt, "room code collision, retrying");
    }
    Err(RoomError::CodeSpaceExhausted(MAX_CODE_ATTEMPTS))
}
