//! Periodic cleanup of empty rooms.
//!
//! [`RoomRegistry::leave`] already removes a room the moment its last
//! player goes, so a sweep that finds anything means some path skipped
//! that. Hits are logged at `warn` for that reason.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::RoomRegistry;

/// How often the sweeper runs unless configured otherwise.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Spawns a task that calls [`RoomRegistry::sweep_empty`] every `every`.
///
/// The sweep takes the same lock as protocol handling, so it can never
/// interleave with a half-finished join or leave. The task runs until
/// the returned handle is aborted.
pub fn spawn_sweeper(
    registry: Arc<Mutex<RoomRegistry>>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;
            let removed = registry.lock().await.sweep_empty();
            for code in &removed {
                tracing::warn!(room = %code, "sweeper removed empty room");
            }
            if removed.is_empty() {
                tracing::trace!("sweep found nothing");
            }
        }
    })
}
