//! matchcache - an offline-first cache of a paginated remote profile feed.
//!
//! The binary is a thin interactive shell over the sync engine: it fetches
//! pages, records accept/decline decisions, and simulates connectivity
//! transitions so queued decisions can be watched flushing.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use matchcache::api::ApiClient;
use matchcache::config::Config;
use matchcache::net::ConnectivityMonitor;
use matchcache::store::ProfileStore;
use matchcache::sync::{FeedEvent, SyncEngine};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    info!("matchcache starting");

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };

    let db_path = config.database_path()?;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Nothing can run without the store; opening it is the one failure
    // that terminates the process.
    let store = ProfileStore::open(&db_path)
        .await
        .with_context(|| format!("Failed to open profile store at {}", db_path.display()))?;

    let source = Arc::new(ApiClient::new()?);
    let connectivity = Arc::new(ConnectivityMonitor::new(true));
    let (engine, mut events) = SyncEngine::new(
        store,
        source,
        Arc::clone(&connectivity),
        config.page_size,
    );

    // Surface feed events on the log; the shell prints state on demand.
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                FeedEvent::ProfilesUpdated(cards) => {
                    info!(count = cards.len(), "Profiles updated")
                }
                FeedEvent::FetchFailed(message) => warn!(%message, "Fetch failed"),
                FeedEvent::PageExhausted => info!("No more pages"),
                FeedEvent::PendingFlushed(applied) => {
                    info!(applied, "Pending decisions flushed")
                }
            }
        }
    });

    engine.start().await;
    run_shell(engine, connectivity).await
}

async fn run_shell(engine: Arc<SyncEngine>, connectivity: Arc<ConnectivityMonitor>) -> Result<()> {
    println!("matchcache shell - list | more | accept <id> | decline <id> | pending | clear | offline | online | quit");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            return Ok(());
        }

        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("list"), _) => print_profiles(&engine),
            (Some("more"), _) => {
                let last_id = engine.snapshot().last().map(|card| card.id.clone());
                match last_id {
                    Some(id) => engine.fetch_next_page_if_needed(&id).await,
                    None => engine.fetch_page(1).await,
                }
                print_profiles(&engine);
            }
            (Some("accept"), Some(id)) => engine.accept(id).await,
            (Some("decline"), Some(id)) => engine.decline(id).await,
            (Some("pending"), _) => engine.flush_pending().await,
            (Some("clear"), _) => engine.clear_all().await,
            (Some("offline"), _) => {
                connectivity.set_connected(false);
                println!("connectivity: offline");
            }
            (Some("online"), _) => {
                connectivity.set_connected(true);
                println!("connectivity: online");
            }
            (Some("quit"), _) | (Some("exit"), _) => {
                info!("matchcache shutting down");
                return Ok(());
            }
            (Some(other), _) => println!("unknown command: {}", other),
            (None, _) => {}
        }
    }
}

fn print_profiles(engine: &SyncEngine) {
    let cards = engine.snapshot();
    if cards.is_empty() {
        println!("no cached profiles");
        return;
    }

    for card in &cards {
        println!(
            "{:<38} {:<24} {:>3}  {:<20} {}",
            card.id,
            card.display_name(),
            card.age,
            format!("{}, {}", card.city, card.country),
            card.status
        );
    }
    println!(
        "{} profiles, more pages: {}",
        cards.len(),
        engine.has_more_pages()
    );
}
