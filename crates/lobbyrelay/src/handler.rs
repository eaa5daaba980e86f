//! Per-connection handler: writer task, read loop, and cleanup.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register an outbound queue and spawn the writer that drains it
//!   2. Loop: receive frames → decode → run against the registry
//!   3. On exit (clean close, error, or panic) the guard runs the leave path
//!
//! Frames that cannot be read or decoded get a `Malformed request` reply;
//! only a transport failure or a close ends the loop.

use std::sync::Arc;

use lobbyrelay_protocol::{ClientEvent, Codec, PlayerId, ServerEvent};
use lobbyrelay_transport::{Connection, TransportError, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::{OUTBOUND_QUEUE_CAPACITY, ServerState};
use crate::session::MALFORMED_REQUEST;

/// Drop guard that removes a player from their room when the handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async locks.
struct DisconnectGuard {
    player_id: PlayerId,
    state: Arc<ServerState>,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    state.disconnect(player_id).await;
                });
            }
            Err(_) => {
                tracing::debug!(%player_id, "runtime gone, skipping disconnect cleanup");
            }
        }
    }
}

/// Handles a single upgraded connection until it closes.
pub(crate) async fn handle_connection(conn: WebSocketConnection, state: Arc<ServerState>) {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    let player_id = PlayerId(conn_id.into_inner());
    tracing::info!(%conn_id, %player_id, "player connected");

    // --- Step 1: outbound queue + writer ---
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(OUTBOUND_QUEUE_CAPACITY);
    state.peers.lock().await.insert(player_id, tx.clone());
    let _guard = DisconnectGuard {
        player_id,
        state: Arc::clone(&state),
    };

    let writer_conn = Arc::clone(&conn);
    let codec = state.codec;
    tokio::spawn(async move {
        // Ends once every sender is gone: the peer entry is removed by
        // the guard and the handler's own clone drops with it.
        while let Some(event) = rx.recv().await {
            let frame = match codec.encode(&event) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!(%player_id, event = event.name(), error = %e, "encode failed");
                    continue;
                }
            };
            if let Err(e) = writer_conn.send(&frame).await {
                tracing::debug!(%player_id, error = %e, "send failed, stopping writer");
                break;
            }
        }
    });

    // --- Step 2: read loop ---
    loop {
        let frame = match conn.recv().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::info!(%player_id, "connection closed cleanly");
                break;
            }
            Err(TransportError::InvalidFrame(reason)) => {
                tracing::debug!(%player_id, %reason, "unreadable frame");
                let _ = tx.try_send(ServerEvent::error(MALFORMED_REQUEST));
                continue;
            }
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
        };

        let event: ClientEvent = match state.codec.decode(&frame) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "failed to decode frame");
                let _ = tx.try_send(ServerEvent::error(MALFORMED_REQUEST));
                continue;
            }
        };

        tracing::debug!(%player_id, event = event.name(), "event received");
        state.process(player_id, event).await;
    }

    // _guard drops here → leave path fires.
}
