//! Orderbook replication engine.
//!
//! This module turns a feed of snapshots and incremental updates into
//! consistent, query-able books:
//!
//! - [`BookState`] - one instrument's sorted bid/ask sides plus reconciliation
//! - [`OrderbookManager`] - keyed store with per-instrument locking, buffering,
//!   sequence and checksum gates, and change notifications
//!
//! # Example
//!
//! ```rust
//! use orderbook_replica::config::{Config, SortKey};
//! use orderbook_replica::orderbook::{OrderbookManager, UpdateOutcome};
//! use orderbook_replica::types::{AssetClass, InstrumentKey, PriceLevel, Snapshot, Update};
//! use rust_decimal::Decimal;
//!
//! let config = Config::new().with_buffer(2).with_sort(SortKey::UpdateId);
//! let manager = OrderbookManager::new(config).unwrap();
//! let key = InstrumentKey::new("okx", "BTC-USDT", AssetClass::Spot);
//! let level = |p: i64, a: i64| PriceLevel::new(Decimal::from(p), Decimal::from(a));
//!
//! manager
//!     .load_snapshot(Snapshot::new(key.clone(), vec![level(100, 1)], vec![level(101, 1)]))
//!     .unwrap();
//!
//! // First update waits in the buffer, second completes the batch
//! let first = Update::new(key.clone(), vec![level(99, 2)], vec![]).with_update_id(2);
//! let second = Update::new(key.clone(), vec![level(98, 3)], vec![]).with_update_id(1);
//! assert!(matches!(manager.update(first).unwrap(), UpdateOutcome::Buffered { pending: 1 }));
//! assert!(matches!(manager.update(second).unwrap(), UpdateOutcome::Applied(_)));
//!
//! if let Some(bid) = manager.best_bid(&key) {
//!     println!("Best bid: {} @ {}", bid.amount, bid.price);
//! }
//! ```

pub mod book;
mod buffer;
mod gate;
pub mod manager;

pub use book::{BookState, Side};
pub use manager::{ApplyReport, OrderbookManager, SyncState, UpdateOutcome};
