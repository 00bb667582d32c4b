use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use muster::{
    MusterServer, ServerConfig, WAIT_NOTICE_PERIOD, load_inventory_file, spawn_operator_tasks,
};
use muster_lobby::{DeliveryMode, LobbyConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DeliveryArg {
    /// Workers fan chat out to lobby peers themselves.
    Direct,
    /// Chat funnels through a single coordinator task.
    Relay,
}

impl From<DeliveryArg> for DeliveryMode {
    fn from(arg: DeliveryArg) -> Self {
        match arg {
            DeliveryArg::Direct => DeliveryMode::Direct,
            DeliveryArg::Relay => DeliveryMode::Relay,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "muster-server", version)]
#[command(about = "Lobby matchmaking and chat server")]
struct Args {
    /// Players per lobby (at most 16)
    #[arg(short = 'p', long = "players")]
    players: usize,

    /// Path to the inventory template file
    #[arg(short = 'i', long = "inventory")]
    inventory: PathBuf,

    /// Maximum total resource units one player may request
    #[arg(short = 'q', long = "quota")]
    quota: u64,

    /// Socket path to listen on
    #[arg(long, default_value = "server")]
    socket: PathBuf,

    /// Chat delivery backend
    #[arg(long, value_enum, default_value_t = DeliveryArg::Direct)]
    delivery: DeliveryArg,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    let template = load_inventory_file(&args.inventory)?;
    let server = MusterServer::bind(ServerConfig {
        socket: args.socket,
        lobby: LobbyConfig {
            capacity: args.players,
            quota: args.quota,
            template,
        },
        delivery: args.delivery.into(),
        wait_notice_period: WAIT_NOTICE_PERIOD,
    })?;

    tracing::info!(
        socket = %server.local_path().display(),
        players = args.players,
        quota = args.quota,
        "muster server started"
    );
    tracing::info!("SIGUSR1 dumps lobby status, Ctrl-C stops the server");

    spawn_operator_tasks(server.engine(), server.shutdown_handle());
    server.run().await?;
    Ok(())
}
