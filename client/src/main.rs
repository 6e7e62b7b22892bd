use clap::Parser;
use client::network::Client;
use log::info;
use rand::seq::SliceRandom;
use shared::DEFAULT_DISCOVERY_PORT;

const FIRST_NAMES: &[&str] = &[
    "Alex", "Jordan", "Taylor", "Jamie", "Casey", "Morgan", "Riley", "Cameron", "Avery", "Quinn",
    "Sam", "Dakota", "Parker", "Peyton", "Skylar", "Drew", "Blake", "Charlie", "Bailey", "Reese",
];

const FAMILY_NAMES: &[&str] = &[
    "Anderson", "Bennett", "Carter", "Davidson", "Edwards", "Foster", "Graham", "Harris", "Irwin",
    "Jones", "Kingston", "Lambert", "Murray", "Norton", "Owens", "Patterson", "Richardson",
    "Smith", "Underwood", "Wallace",
];

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Display name sent to the server (random if omitted)
    #[arg(short, long)]
    name: Option<String>,

    /// UDP port to listen on for server offers
    #[arg(short, long, default_value_t = DEFAULT_DISCOVERY_PORT)]
    discovery_port: u16,
}

fn random_name() -> String {
    let mut rng = rand::thread_rng();
    let first = FIRST_NAMES.choose(&mut rng).unwrap_or(&"Player");
    let last = FAMILY_NAMES.choose(&mut rng).unwrap_or(&"One");
    format!("{} {}", first, last)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let name = args.name.unwrap_or_else(random_name);

    info!("Playing as {}", name);
    info!("Answer with 1/t/y for true or 0/f/n for false, then press Enter");

    let client = Client::new(name, args.discovery_port);
    client.run().await?;

    Ok(())
}
