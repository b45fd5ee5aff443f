use std::path::PathBuf;

use anyhow::{anyhow, Result};
use card_sync::{CardSyncClient, ClientEvent};
use clap::{Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod replay;

use config::{load_settings, Settings};

#[derive(Parser, Debug)]
#[command(name = "cardsync", about = "Keep a card list in step with add-remove-cards messages")]
struct Cli {
    /// TOML settings file (defaults to ./cardsync.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect to a push channel and print the page after every change.
    Listen {
        #[arg(long)]
        server_url: Option<String>,
        /// Exit after the first page update.
        #[arg(long)]
        once: bool,
    },
    /// Apply newline-delimited server events from a file and print the page.
    Replay { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Command::Listen { server_url, once } => listen(settings, server_url, once).await,
        Command::Replay { file } => {
            let client = CardSyncClient::new(settings.sync);
            let report = replay::replay_file(&client, &file)?;
            info!(
                applied = report.applied,
                unchanged = report.unchanged,
                failed = report.failed,
                card_count = client.card_count(),
                "replay finished"
            );
            println!("{}", client.snapshot().html);
            Ok(())
        }
    }
}

async fn listen(settings: Settings, server_url: Option<String>, once: bool) -> Result<()> {
    let server_url = server_url
        .or(settings.server_url)
        .ok_or_else(|| anyhow!("no server url: pass --server-url or set CARDSYNC_SERVER_URL"))?;

    let client = CardSyncClient::new(settings.sync);
    let mut events = client.subscribe_events();
    client.connect(&server_url).await?;
    println!("{}", client.snapshot().html);

    loop {
        let event = tokio::select! {
            event = events.recv() => event,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        };
        match event {
            Ok(ClientEvent::PageUpdated(snapshot)) => {
                println!("{}", snapshot.html);
                if once {
                    break;
                }
            }
            Ok(ClientEvent::ServerError(err)) => {
                warn!(code = ?err.code, message = %err.message, "server error");
            }
            Ok(ClientEvent::Error(err)) => {
                warn!(code = ?err.code, message = %err.message, "event not applied");
            }
            Ok(ClientEvent::Disconnected) | Err(RecvError::Closed) => break,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "page updates lagged, printing current page");
                println!("{}", client.snapshot().html);
            }
        }
    }

    client.disconnect();
    Ok(())
}
