//! Command-line and environment configuration.

use std::time::Duration;

use clap::Parser;
use lobbyrelay_room::{DEFAULT_SWEEP_INTERVAL, RoomConfig};
use lobbyrelay_transport::{DEFAULT_HANDSHAKE_TIMEOUT, OriginPolicy};

/// Origins allowed when none are configured: the usual local dev servers.
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

/// Everything needed to build a [`RelayServer`](crate::RelayServer).
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address of the WebSocket listener.
    pub bind_addr: String,
    /// Address of the diagnostic HTTP listener. `None` disables it.
    pub status_addr: Option<String>,
    pub origins: OriginPolicy,
    pub room: RoomConfig,
    pub sweep_interval: Duration,
    /// How long a client may take to complete the WebSocket upgrade.
    pub handshake_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3001".to_string(),
            status_addr: None,
            origins: OriginPolicy::Any,
            room: RoomConfig::default(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}

/// Multiplayer room relay.
///
/// Every flag can also be set through the environment variable named in
/// its help text.
#[derive(Parser, Debug)]
#[command(name = "lobbyrelay")]
#[command(about = "WebSocket room/lobby relay for small multiplayer games", long_about = None)]
pub struct Cli {
    /// Host address to bind both listeners to
    #[arg(short = 'H', long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port of the WebSocket listener
    #[arg(short = 'p', long, env = "PORT", default_value_t = 3001)]
    pub port: u16,

    /// Port of the diagnostic HTTP listener
    #[arg(long, env = "STATUS_PORT", default_value_t = 3002)]
    pub status_port: u16,

    /// Comma-separated browser origins allowed to connect; `*` allows any
    #[arg(
        long,
        env = "ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_value = DEFAULT_ALLOWED_ORIGINS
    )]
    pub allowed_origins: Vec<String>,

    /// Maximum players per room
    #[arg(long, env = "MAX_PLAYERS", default_value_t = RoomConfig::DEFAULT_MAX_PLAYERS)]
    pub max_players: usize,

    /// Seconds between sweeps for leaked empty rooms
    #[arg(long, env = "SWEEP_INTERVAL_SECS", default_value_t = DEFAULT_SWEEP_INTERVAL.as_secs())]
    pub sweep_interval_secs: u64,

    /// Seconds a client may take to complete the WebSocket upgrade
    #[arg(
        long,
        env = "HANDSHAKE_TIMEOUT_SECS",
        default_value_t = DEFAULT_HANDSHAKE_TIMEOUT.as_secs()
    )]
    pub handshake_timeout_secs: u64,
}

impl Cli {
    pub fn into_config(self) -> RelayConfig {
        RelayConfig {
            bind_addr: format!("{}:{}", self.host, self.port),
            status_addr: Some(format!("{}:{}", self.host, self.status_port)),
            origins: OriginPolicy::from_origins(&self.allowed_origins),
            room: RoomConfig::with_max_players(self.max_players),
            sweep_interval: Duration::from_secs(self.sweep_interval_secs.max(1)),
            handshake_timeout: Duration::from_secs(self.handshake_timeout_secs.max(1)),
        }
    }
}
