use clap::Parser;
use client::network::Client;
use log::info;
use shared::{DEFAULT_GAME_PORT, DEFAULT_PROBE_PORT};
use tokio::io::BufReader;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value_t = format!("127.0.0.1:{}", DEFAULT_GAME_PORT))]
    server: String,

    /// Latency probe address
    #[arg(long, default_value_t = format!("127.0.0.1:{}", DEFAULT_PROBE_PORT))]
    probe: String,

    /// Display name; asked for interactively when omitted
    #[arg(short = 'n', long)]
    name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    info!("Connecting to: {}", args.server);
    info!("Local commands: /exit to quit, /latencia to measure latency");

    let client = Client::connect(&args.server, &args.probe).await?;
    client
        .run(args.name, BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;

    Ok(())
}
