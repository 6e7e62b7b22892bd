use clap::Parser;
use log::{error, info};
use server::config::ServerConfig;
use server::lifecycle::ServerLifecycle;
use server::questions::TriviaBank;
use shared::{DEFAULT_DISCOVERY_PORT, DEFAULT_SERVER_PORT};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind the game port to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// TCP port players connect to
    #[arg(short, long, default_value_t = DEFAULT_SERVER_PORT)]
    port: u16,

    /// UDP port clients listen on for offers
    #[arg(short, long, default_value_t = DEFAULT_DISCOVERY_PORT)]
    discovery_port: u16,

    /// Destination address for discovery offers
    #[arg(short, long, default_value = "255.255.255.255")]
    broadcast: IpAddr,

    /// Seconds without a new player before recruitment closes
    #[arg(short, long, default_value = "10")]
    quiet_period: u64,

    /// Seconds players have to answer each question
    #[arg(short, long, default_value = "10")]
    answer_timeout: u64,

    /// Seconds a new connection has to send its name
    #[arg(short, long, default_value = "3")]
    name_timeout: u64,

    /// Question file with one `T|question` or `F|question` per line
    #[arg(long)]
    questions: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let bank = match &args.questions {
        Some(path) => TriviaBank::from_file(path)?,
        None => TriviaBank::builtin(),
    };

    let config = ServerConfig {
        host: args.host,
        server_port: args.port,
        discovery_port: args.discovery_port,
        broadcast_addr: args.broadcast,
        quiet_period: Duration::from_secs(args.quiet_period),
        answer_timeout: Duration::from_secs(args.answer_timeout),
        name_timeout: Duration::from_secs(args.name_timeout),
        ..ServerConfig::default()
    };

    let mut server = match ServerLifecycle::bind(config, Box::new(bank)).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server initialization failed: {}", e);
            return Err(e.into());
        }
    };

    tokio::select! {
        _ = server.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
