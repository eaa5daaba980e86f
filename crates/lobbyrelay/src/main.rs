//! lobbyrelay server binary.
//!
//! Run with:
//! ```not_rust
//! cargo run -p lobbyrelay
//! cargo run -p lobbyrelay -- --port 3001 --allowed-origins '*'
//! PORT=4000 ALLOWED_ORIGINS=https://game.example cargo run -p lobbyrelay
//! ```

use clap::Parser;
use lobbyrelay::{Cli, RelayServerBuilder, init_tracing};

#[tokio::main]
async fn main() {
    init_tracing(env!("CARGO_BIN_NAME"), "info");

    let config = Cli::parse().into_config();
    tracing::info!(
        bind = %config.bind_addr,
        status = ?config.status_addr,
        origins = ?config.origins,
        max_players = config.room.max_players,
        "starting"
    );

    let server = match RelayServerBuilder::from_config(config).build().await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
