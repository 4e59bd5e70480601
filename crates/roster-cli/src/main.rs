//! roster-cli - one-shot client for the roster service.
//!
//! Sends a single command (with optional arguments and an optional person
//! payload read from a JSON file) and prints the response. The interactive
//! shell that feeds `Response::script` lines back is intentionally not part
//! of this binary.

use anyhow::{Context, Result};
use clap::Parser;
use roster_cli::{ClientOptions, RosterClient};
use roster_core::protocol::{Credentials, PersonPayload, Request};
use tracing_subscriber::EnvFilter;

/// roster client - send one command to the roster server
#[derive(Parser, Debug)]
#[command(name = "roster-cli")]
#[command(version, about, long_about = None)]
struct Args {
    /// Server host
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Server port (falls back to the `port6` environment variable)
    #[arg(long, env = "port6", default_value_t = 8080)]
    port: u16,

    /// Account name
    #[arg(short, long)]
    username: String,

    /// Account password
    #[arg(short, long)]
    password: String,

    /// Path to a JSON-encoded person payload, for commands that need one
    #[arg(long)]
    person: Option<std::path::PathBuf>,

    /// The command to send
    command: String,

    /// Positional command arguments
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let persons = match &args.person {
        None => Vec::new(),
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let payload: PersonPayload =
                serde_json::from_str(&raw).context("failed to parse person JSON")?;
            vec![payload]
        }
    };

    let request = Request::new(
        args.command.clone(),
        args.args.clone(),
        persons,
        Some(Credentials {
            username: args.username.clone(),
            password: args.password.clone(),
        }),
    );

    let options = ClientOptions::new(args.host.clone(), args.port);
    let mut client = RosterClient::connect(&options)
        .await
        .context("could not reach the server")?;
    let response = client.send(&request).await.context("exchange failed")?;

    if !response.message.is_empty() {
        println!("{}", response.message);
    }
    for person in &response.persons {
        match person.to_person() {
            Ok(person) => println!("{person}"),
            Err(_) => println!("(unreadable person record)"),
        }
    }
    if !response.script.is_empty() {
        println!("--- script ---");
        print!("{}", response.script);
    }

    Ok(())
}
