//! Replay a recorded feed through the replication engine.
//!
//! Reads one JSON `FeedMessage` per line from stdin and prints the top of
//! every book once the feed ends.
//!
//! ```bash
//! RUST_LOG=orderbook_replica=debug cargo run --example replay < feed.jsonl
//! ```
//!
//! Optional environment:
//! - `REPLAY_BUFFER`: buffer this many updates per instrument, sorted by id
//! - `REPLAY_MODE`: `by_price` (default) or `by_id`

use std::io::{self, BufRead};

use orderbook_replica::config::{ReconcileMode, SortKey};
use orderbook_replica::types::FeedMessage;
use orderbook_replica::{Config, OrderbookManager};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = Config::new().with_update_id_progression(true);
    if let Ok(limit) = std::env::var("REPLAY_BUFFER") {
        config = config.with_buffer(limit.parse()?).with_sort(SortKey::UpdateId);
    }
    if std::env::var("REPLAY_MODE").as_deref() == Ok("by_id") {
        config = config.with_mode(ReconcileMode::ById);
    }
    let manager = OrderbookManager::new(config)?;

    let mut messages = 0usize;
    let mut rejected = 0usize;
    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        messages += 1;

        let message: FeedMessage = match serde_json::from_str(&line) {
            Ok(message) => message,
            Err(e) => {
                warn!(line = messages, error = %e, "skipping malformed message");
                rejected += 1;
                continue;
            }
        };
        if let Err(e) = manager.process_message(message) {
            warn!(line = messages, error = %e, resync = e.needs_resync(), "message rejected");
            rejected += 1;
        }
    }
    info!(messages, rejected, books = manager.len(), "replay finished");

    for key in manager.instruments() {
        let book = manager.get(&key)?;
        let (bids, asks) = book.num_levels();
        println!("{key}  ({bids} bids / {asks} asks, last update {})", book.last_update_id());
        match (book.best_bid(), book.best_ask()) {
            (Some(bid), Some(ask)) => {
                println!("  bid {} @ {}", bid.amount, bid.price);
                println!("  ask {} @ {}", ask.amount, ask.price);
                if let Some(spread) = book.spread() {
                    println!("  spread {spread}");
                }
            }
            _ => println!("  one side empty"),
        }
    }

    let stale = manager.instruments_needing_resync();
    if !stale.is_empty() {
        println!("\nNeeds resync: {}", stale.len());
        for key in stale {
            println!("  {key}");
        }
    }
    Ok(())
}
