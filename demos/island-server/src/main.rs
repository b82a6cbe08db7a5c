use std::time::Duration;

use clap::Parser;
use skirmish::prelude::*;
use tracing_subscriber::EnvFilter;

/// Island battle coordinator: pairs players, times matches, relays moves.
#[derive(Parser, Debug)]
#[command(name = "island-server", version, about)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// Length of a competitive match in seconds
    #[arg(long, default_value_t = 600)]
    match_secs: u64,

    /// Maximum level gap between two queued players
    #[arg(long, default_value_t = 1)]
    level_range: u32,

    /// Drop clients silent for this many seconds
    #[arg(long, default_value_t = 60)]
    idle_secs: u64,

    /// Seed players 1..=N (level 1, one gem each) into the in-memory store
    #[arg(long, default_value_t = 0)]
    demo_players: u64,
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Treats the token as the numeric player id. Stand-in for a real
/// session lookup.
struct TokenAuth;

impl Authenticator for TokenAuth {
    async fn authenticate(&self, token: &str) -> Result<PlayerId, SessionError> {
        let id: u64 = token
            .parse()
            .map_err(|_| SessionError::AuthFailed("token must be a number".into()))?;
        Ok(PlayerId(id))
    }
}

fn seed(store: &MemoryStore, players: u64) {
    for n in 1..=players {
        store.add_player(PlayerId(n), 1);
        store.add_gem(PlayerId(n), false);
    }
}

fn match_config(args: &Args) -> MatchConfig {
    MatchConfig {
        match_duration: Duration::from_secs(args.match_secs),
        level_range: args.level_range,
        ..MatchConfig::default()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("island_server=info,skirmish=info")),
        )
        .init();

    let args = Args::parse();
    let store = MemoryStore::new();
    seed(&store, args.demo_players);

    let server = SkirmishServerBuilder::new()
        .bind(&args.bind)
        .idle_timeout(Duration::from_secs(args.idle_secs))
        .match_config(match_config(&args))
        .build(TokenAuth, store)
        .await?;
    let coordinator = server.coordinator();

    tracing::info!(addr = %server.local_addr()?, "island server listening");

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            coordinator.shutdown().await?;
        }
    }
    Ok(())
}
