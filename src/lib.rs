//! # orderbook-replica
//!
//! A local orderbook replication engine for streaming crypto market-data feeds.
//!
//! ## Features
//!
//! - **Snapshot + delta replication** - Price-keyed and order-id-keyed venues
//! - **Update buffering** - Coalesce bursts, optionally sorted by id or time
//! - **Consistency gates** - Monotonic update ids and venue CRC-32 checksums
//! - **Per-instrument locking** - Unrelated books never contend
//! - **Change notifications** - Broadcast channel of keys, consumers re-fetch
//!
//! ## Quick Start
//!
//! ```rust
//! use orderbook_replica::{Config, OrderbookManager};
//! use orderbook_replica::types::{AssetClass, InstrumentKey, PriceLevel, Snapshot, Update};
//! use rust_decimal::Decimal;
//!
//! fn main() -> Result<(), orderbook_replica::Error> {
//!     let manager = OrderbookManager::new(Config::new())?;
//!     let key = InstrumentKey::new("bitstamp", "BTC-USD", AssetClass::Spot);
//!     let level = |p: i64, a: i64| PriceLevel::new(Decimal::from(p), Decimal::from(a));
//!
//!     // Seed the book from the venue's snapshot
//!     manager.load_snapshot(Snapshot::new(
//!         key.clone(),
//!         vec![level(100, 2), level(99, 3)],
//!         vec![level(101, 1)],
//!     ))?;
//!
//!     // Delete 100, insert 98
//!     manager.update(Update::new(key.clone(), vec![level(100, 0), level(98, 5)], vec![]))?;
//!
//!     let book = manager.get(&key)?;
//!     assert_eq!(book.bids(), &[level(99, 3), level(98, 5)]);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`orderbook`] - Book state, reconciliation and the manager
//! - [`types`] - Instrument keys, feed messages and notifications
//! - [`checksum`] - Venue checksum trait and CRC-32 digests
//! - [`config`] - Engine configuration
//! - [`error`] - Error types for the crate
//!
//! ## Resynchronisation
//!
//! Nothing in this crate is fatal. A [`Error::BookNotFound`] or
//! [`Error::ChecksumMismatch`] means the caller should fetch a new snapshot;
//! on disconnect call [`OrderbookManager::flush`] before resuming.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod checksum;
pub mod config;
pub mod error;
pub mod orderbook;
pub mod types;

// Re-export main types at crate root for convenience
pub use config::Config;
pub use error::Error;
pub use orderbook::{BookState, OrderbookManager};

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;
