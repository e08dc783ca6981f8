//! The Brainfreeze coordination server.

use std::time::Duration;

use brainfreeze::prelude::*;
use brainfreeze::init_logging;
use clap::Parser;

/// Lobby and session coordination for Brainfreeze multiplayer games.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on, "IP:PORT".
    #[arg(short, long, default_value = "127.0.0.1:8070")]
    bind: String,

    /// Players a lobby needs before its countdown starts (at least 2).
    #[arg(long, default_value_t = 2)]
    min_players: usize,

    /// Length of the lobby start countdown.
    #[arg(long, default_value_t = 10)]
    countdown_secs: u32,

    /// Resolve a session this long after its last result. 0 waits forever.
    #[arg(long, default_value_t = 300)]
    result_timeout_secs: u64,

    /// Close connections silent for this long. Off when omitted.
    #[arg(long)]
    idle_timeout_secs: Option<u64>,

    /// Username to register in the in-memory record store. Repeatable.
    #[arg(long = "user")]
    users: Vec<String>,

    /// Enable debug logging (`RUST_LOG` takes precedence).
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: self.bind.clone(),
            idle_timeout: self.idle_timeout_secs.map(Duration::from_secs),
            lobby: LobbyConfig {
                min_players: self.min_players,
                countdown_secs: self.countdown_secs,
                ..LobbyConfig::default()
            },
            session: SessionConfig {
                result_timeout: (self.result_timeout_secs > 0)
                    .then(|| Duration::from_secs(self.result_timeout_secs)),
                ..SessionConfig::default()
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), BrainfreezeError> {
    let args = Args::parse();
    init_logging(if args.debug { "debug" } else { "info" });

    let store = MemoryStore::new();
    for name in &args.users {
        let user = store.add_user(name).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "user registered");
    }

    let server = BrainfreezeServer::builder()
        .config(args.server_config())
        .build(store)
        .await?;
    tracing::info!(addr = %server.local_addr()?, "listening");

    server.run().await
}
