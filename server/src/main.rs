use clap::Parser;
use log::{error, info};
use server::config::ServerConfig;
use server::network::Server;
use shared::{DEFAULT_GAME_PORT, DEFAULT_PROBE_PORT, STARTING_HAND_SIZE, STARTING_LIFE};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Card duel session server", long_about = None)]
struct Args {
    /// Host to bind both listeners to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,
    /// Game (TCP) port
    #[arg(short, long, default_value_t = DEFAULT_GAME_PORT)]
    port: u16,
    /// Latency probe (UDP) port
    #[arg(long, default_value_t = DEFAULT_PROBE_PORT)]
    probe_port: u16,
    /// Maximum number of connected players
    #[arg(long, default_value = "1024")]
    max_players: usize,
    /// Capacity of the matchmaking queue
    #[arg(long, default_value = "100")]
    queue_capacity: usize,
    /// Booster packs generated at startup
    #[arg(long, default_value = "50")]
    boosters: usize,
    /// Seconds a lone queued player waits before being re-queued
    #[arg(long, default_value = "30")]
    pairing_timeout_secs: u64,
    /// Per-player buffer for chat and status lines
    #[arg(long, default_value = "10")]
    outbound_capacity: usize,
    /// In-match heartbeat period in seconds, 0 disables it
    #[arg(long, default_value = "30")]
    heartbeat_secs: u64,
    #[arg(long, default_value_t = STARTING_LIFE)]
    starting_life: u32,
    #[arg(long, default_value_t = STARTING_HAND_SIZE)]
    hand_size: usize,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig {
            host: args.host,
            port: args.port,
            probe_port: args.probe_port,
            max_players: args.max_players,
            queue_capacity: args.queue_capacity,
            boosters: args.boosters,
            pairing_timeout: Duration::from_secs(args.pairing_timeout_secs),
            outbound_capacity: args.outbound_capacity,
            heartbeat_interval: (args.heartbeat_secs > 0)
                .then(|| Duration::from_secs(args.heartbeat_secs)),
            starting_life: args.starting_life,
            hand_size: args.hand_size,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = ServerConfig::from(Args::parse());
    info!("Starting server with {:?}", config);

    let server = Server::bind(config).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
