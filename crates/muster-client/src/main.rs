//! Command-line client: registers with a muster server, waits for the
//! lobby to start, then bridges stdin and the chat stream.

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use muster_protocol::wire;
use muster_transport::{Connection, MAX_FRAME, UnixConnection};

#[derive(Parser, Debug)]
#[command(name = "muster-client", version)]
#[command(about = "Joins a muster lobby and chats with its players")]
struct Args {
    /// Player name; must match the first line of the request file
    #[arg(short = 'n', long = "name")]
    name: String,

    /// Path to the resource request file
    #[arg(short = 'i', long = "inventory")]
    inventory: PathBuf,

    /// Server socket path
    server: PathBuf,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,
}

/// The request file must open with the player's own name; anything
/// else means the wrong file was passed.
fn request_matches_name(name: &str, blob: &str) -> bool {
    blob.lines().next().map(str::trim) == Some(name)
}

fn print_frame(data: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(String::from_utf8_lossy(data).as_bytes())?;
    stdout.flush()
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

    let blob = std::fs::read_to_string(&args.inventory)?;
    if !request_matches_name(&args.name, &blob) {
        eprintln!("Wrong inventory");
        std::process::exit(1);
    }
    if blob.len() > MAX_FRAME {
        eprintln!("request file exceeds {MAX_FRAME} bytes");
        std::process::exit(1);
    }

    let conn = UnixConnection::connect(&args.server).await?;
    println!("{} connected to server", args.name);
    conn.send(blob.as_bytes()).await?;

    let Some(reply) = conn.recv().await? else {
        println!("Server closed..");
        std::process::exit(1);
    };
    print_frame(&reply)?;
    let reply = String::from_utf8_lossy(&reply).into_owned();
    if !reply.starts_with(wire::OK_LINE.trim_end()) {
        std::process::exit(1);
    }

    // Wait phase: periodic notices, then the start signal. A fast
    // lobby may coalesce START into the admission reply.
    let mut started = reply.contains(wire::START_LINE.trim_end());
    while !started {
        match conn.recv().await? {
            Some(data) => {
                print_frame(&data)?;
                started = String::from_utf8_lossy(&data)
                    .contains(wire::START_LINE.trim_end());
            }
            None => {
                println!("Server closed..");
                return Ok(());
            }
        }
    }

    // Chat phase: stdin lines go out, peer lines come in.
    let mut stdin = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = stdin.next_line() => match line? {
                Some(text) => {
                    let text = text.trim();
                    if text.is_empty() {
                        continue;
                    }
                    conn.send(format!("{text}\n").as_bytes()).await?;
                }
                None => break,
            },
            received = conn.recv() => match received? {
                Some(data) => print_frame(&data)?,
                None => {
                    println!("Server closed..");
                    break;
                }
            },
        }
    }
    Ok(())
}
