//! Orderbook manager for replicating many instruments from one feed.
//!
//! This module provides [`OrderbookManager`], a thread-safe store of books
//! keyed by [`InstrumentKey`] that consumes snapshots and updates from an
//! exchange client.
//!
//! # Design
//!
//! The store map sits behind a `parking_lot::RwLock`, and each book behind its
//! own `RwLock`. Applying an update only needs the map's read lock plus that
//! book's write lock, so instruments never contend with each other. The map's
//! write lock is taken for registration, removal and flush.
//!
//! # Resynchronisation
//!
//! A checksum mismatch marks the book as needing resync. The book keeps its
//! last state until the caller loads a fresh snapshot. After a disconnect,
//! call [`OrderbookManager::flush`] before resuming the feed.

use std::collections::hash_map::Entry;
use std::time::Instant;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::{Config, ReconcileMode};
use crate::error::Error;
use crate::types::messages::{BookEvent, DesyncReason, FeedMessage, PriceLevel, Snapshot, Update};
use crate::types::{InstrumentKey, Price, UpdateId};
use crate::Result;

use super::buffer::UpdateBuffer;
use super::{gate, BookState};

/// Synchronisation state of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Book is synchronized and receiving updates
    Synchronized,
    /// Book failed an integrity check and needs a fresh snapshot
    NeedsResync,
}

/// Result of handing an update to the manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Update was queued; the book is unchanged
    Buffered {
        /// Updates now waiting for this instrument
        pending: usize,
    },
    /// Update (or the batch it completed) was applied
    Applied(ApplyReport),
}

/// What happened to a batch of updates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Updates applied to the book
    pub applied: usize,
    /// Update ids skipped as stale
    pub stale: Vec<UpdateId>,
}

/// Entry in the orderbook manager
#[derive(Debug)]
struct BookEntry {
    book: BookState,
    buffer: UpdateBuffer,
    state: SyncState,
    last_published: Option<Instant>,
}

impl BookEntry {
    fn new(book: BookState) -> Self {
        Self {
            book,
            buffer: UpdateBuffer::default(),
            state: SyncState::Synchronized,
            last_published: None,
        }
    }

    /// Replace the book wholesale; queued deltas predate it and are dropped
    fn reset(&mut self, book: BookState) {
        self.book = book;
        self.buffer.clear();
        self.state = SyncState::Synchronized;
    }
}

/// Manager for many replicated orderbooks.
///
/// # Thread Safety
///
/// The manager is safe to share across threads via `Arc<OrderbookManager>`.
/// Producers for different instruments may call [`update`](Self::update)
/// concurrently; updates for one instrument are expected in feed order.
///
/// # Example
///
/// ```rust
/// use orderbook_replica::{Config, OrderbookManager};
/// use orderbook_replica::types::{AssetClass, InstrumentKey, PriceLevel, Snapshot, Update};
/// use rust_decimal::Decimal;
///
/// # fn example() -> orderbook_replica::Result<()> {
/// let manager = OrderbookManager::new(Config::new())?;
/// let key = InstrumentKey::new("kraken", "XBT/USD", AssetClass::Spot);
/// let level = |p: i64, a: i64| PriceLevel::new(Decimal::from(p), Decimal::from(a));
///
/// manager.load_snapshot(Snapshot::new(key.clone(), vec![level(100, 2)], vec![level(101, 1)]))?;
/// manager.update(Update::new(key.clone(), vec![level(100, 0), level(99, 4)], vec![]))?;
///
/// let book = manager.get(&key)?;
/// assert_eq!(book.best_bid(), Some(level(99, 4)));
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
#[derive(Debug)]
pub struct OrderbookManager {
    config: Config,
    /// Books by instrument
    books: RwLock<FxHashMap<InstrumentKey, RwLock<BookEntry>>>,
    events: broadcast::Sender<BookEvent>,
}

impl OrderbookManager {
    /// Create a new orderbook manager
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration fails validation.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: Config) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity());
        Self {
            config,
            books: RwLock::new(FxHashMap::default()),
            events,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Subscribe to change and desync notifications
    ///
    /// Events carry only the instrument key; re-fetch the book to read it.
    pub fn subscribe(&self) -> broadcast::Receiver<BookEvent> {
        self.events.subscribe()
    }

    /// Route a feed message to [`load_snapshot`](Self::load_snapshot) or
    /// [`update`](Self::update)
    ///
    /// Returns `None` for snapshots and the update outcome otherwise.
    pub fn process_message(&self, message: FeedMessage) -> Result<Option<UpdateOutcome>> {
        match message {
            FeedMessage::Snapshot(snapshot) => {
                self.load_snapshot(snapshot)?;
                Ok(None)
            }
            FeedMessage::Update(update) => self.update(update).map(Some),
        }
    }

    /// Load a snapshot, creating or wholesale-replacing the instrument's book
    ///
    /// Any updates still buffered for the instrument are discarded and the
    /// book returns to [`SyncState::Synchronized`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSnapshot`] if the snapshot fails validation;
    /// the stored book is left untouched.
    pub fn load_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        let mut book = BookState::from_snapshot(snapshot, self.config.mode())?;
        if let (Some(depth), ReconcileMode::ByPrice) = (self.config.max_depth(), self.config.mode()) {
            book.truncate(depth);
        }
        let key = book.key().clone();
        let (bid_levels, ask_levels) = book.num_levels();

        let books = self.books.read();
        if let Some(entry) = books.get(&key) {
            entry.write().reset(book);
        } else {
            drop(books);
            let mut books = self.books.write();
            // Another producer may have registered the key in between
            match books.entry(key.clone()) {
                Entry::Occupied(mut slot) => slot.get_mut().get_mut().reset(book),
                Entry::Vacant(slot) => {
                    slot.insert(RwLock::new(BookEntry::new(book)));
                }
            }
        }

        debug!(instrument = %key, bid_levels, ask_levels, "snapshot loaded");
        self.publish(BookEvent::Updated(key));
        Ok(())
    }

    /// Apply or buffer an incremental update
    ///
    /// Without buffering the update is applied immediately. With buffering it
    /// is queued until `buffer_limit` updates are pending, then the batch is
    /// sorted (if configured) and applied in order. Each update in a batch is
    /// gated on its own, so a stale update never blocks the rest.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyUpdate`] - no bid or ask deltas
    /// - [`Error::BookNotFound`] - no snapshot loaded for the instrument
    /// - [`Error::StaleUpdate`] - unbuffered update failed the id progression check
    /// - [`Error::ChecksumMismatch`] - book no longer matches the venue; the
    ///   update was applied and the book is marked [`SyncState::NeedsResync`]
    pub fn update(&self, update: Update) -> Result<UpdateOutcome> {
        if update.is_empty() {
            return Err(Error::EmptyUpdate { key: update.key });
        }

        let books = self.books.read();
        let Some(entry) = books.get(&update.key) else {
            return Err(Error::BookNotFound { key: update.key });
        };
        let mut entry = entry.write();
        let key = update.key.clone();

        if !self.config.buffer_enabled() {
            let report = self.apply_batch(&mut entry, &key, std::slice::from_ref(&update))?;
            if let Some(&got) = report.stale.first() {
                let last = entry.book.last_update_id();
                return Err(Error::from_desync(key, DesyncReason::StaleUpdate { last, got }));
            }
            return Ok(UpdateOutcome::Applied(report));
        }

        let limit = self.config.buffer_limit();
        match entry.buffer.push(update, limit, self.config.sort_key()) {
            None => Ok(UpdateOutcome::Buffered {
                pending: entry.buffer.len(),
            }),
            Some(batch) => {
                debug!(instrument = %key, updates = batch.len(), "flushing update buffer");
                self.apply_batch(&mut entry, &key, &batch)
                    .map(UpdateOutcome::Applied)
            }
        }
    }

    fn apply_batch(
        &self,
        entry: &mut BookEntry,
        key: &InstrumentKey,
        batch: &[Update],
    ) -> Result<ApplyReport> {
        let mut report = ApplyReport::default();
        let mut expected_checksum = None;

        for update in batch {
            if self.config.update_id_progression() {
                if let Err(reason) = gate::check_progression(&entry.book, update) {
                    warn!(instrument = %key, ?reason, "stale update rejected");
                    self.publish(BookEvent::Desync {
                        key: key.clone(),
                        reason,
                    });
                    report.stale.push(update.update_id);
                    continue;
                }
            }

            match self.config.mode() {
                ReconcileMode::ByPrice => entry.book.apply_by_price(update, self.config.max_depth()),
                ReconcileMode::ById => entry.book.apply_by_id(update),
            }
            entry.book.stamp(update.update_id, update.update_time);
            report.applied += 1;
            if update.checksum.is_some() {
                expected_checksum = update.checksum;
            }
        }

        if report.applied == 0 {
            return Ok(report);
        }

        if let (Some(checksum), Some(expected)) = (self.config.checksum(), expected_checksum) {
            if let Err(reason) = gate::verify_checksum(checksum.as_ref(), &entry.book, expected) {
                entry.state = SyncState::NeedsResync;
                warn!(instrument = %key, ?reason, "checksum mismatch, book needs resync");
                self.publish(BookEvent::Desync {
                    key: key.clone(),
                    reason,
                });
                return Err(Error::from_desync(key.clone(), reason));
            }
        }

        debug!(
            instrument = %key,
            applied = report.applied,
            last_update_id = entry.book.last_update_id(),
            "updates applied"
        );
        self.publish_updated(entry, key);
        Ok(report)
    }

    fn publish_updated(&self, entry: &mut BookEntry, key: &InstrumentKey) {
        if let Some(period) = self.config.publish_period() {
            let now = Instant::now();
            if entry
                .last_published
                .is_some_and(|at| now.duration_since(at) < period)
            {
                return;
            }
            entry.last_published = Some(now);
        }
        self.publish(BookEvent::Updated(key.clone()));
    }

    fn publish(&self, event: BookEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Get a copy of an instrument's book
    ///
    /// The copy does not follow later updates; fetch again after each
    /// notification.
    pub fn get(&self, key: &InstrumentKey) -> Result<BookState> {
        self.read(key, BookState::clone)
    }

    /// Run `f` against an instrument's book under its read lock
    ///
    /// Avoids cloning the book for short reads.
    pub fn read<R>(&self, key: &InstrumentKey, f: impl FnOnce(&BookState) -> R) -> Result<R> {
        let books = self.books.read();
        let entry = books
            .get(key)
            .ok_or_else(|| Error::BookNotFound { key: key.clone() })?;
        let entry = entry.read();
        Ok(f(&entry.book))
    }

    /// Get best bid for an instrument
    pub fn best_bid(&self, key: &InstrumentKey) -> Option<PriceLevel> {
        self.read(key, BookState::best_bid).ok().flatten()
    }

    /// Get best ask for an instrument
    pub fn best_ask(&self, key: &InstrumentKey) -> Option<PriceLevel> {
        self.read(key, BookState::best_ask).ok().flatten()
    }

    /// Get mid price for an instrument
    pub fn mid_price(&self, key: &InstrumentKey) -> Option<Price> {
        self.read(key, BookState::mid_price).ok().flatten()
    }

    /// Get spread for an instrument
    pub fn spread(&self, key: &InstrumentKey) -> Option<Price> {
        self.read(key, BookState::spread).ok().flatten()
    }

    /// Get the synchronisation state of a book
    pub fn state(&self, key: &InstrumentKey) -> Option<SyncState> {
        let books = self.books.read();
        books.get(key).map(|e| e.read().state)
    }

    /// Number of buffered, not yet applied updates for an instrument
    pub fn pending(&self, key: &InstrumentKey) -> usize {
        let books = self.books.read();
        books.get(key).map_or(0, |e| e.read().buffer.len())
    }

    /// Mark a book as needing resync
    pub fn mark_needs_resync(&self, key: &InstrumentKey) {
        let books = self.books.read();
        if let Some(entry) = books.get(key) {
            entry.write().state = SyncState::NeedsResync;
        }
    }

    /// Get all instruments whose books need a fresh snapshot
    pub fn instruments_needing_resync(&self) -> Vec<InstrumentKey> {
        let books = self.books.read();
        books
            .iter()
            .filter(|(_, entry)| entry.read().state == SyncState::NeedsResync)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Drop one instrument's book and pending updates
    ///
    /// Publishes [`BookEvent::Removed`] if the instrument was tracked.
    pub fn remove(&self, key: &InstrumentKey) -> bool {
        let removed = self.books.write().remove(key).is_some();
        if removed {
            debug!(instrument = %key, "orderbook removed");
            self.publish(BookEvent::Removed(key.clone()));
        }
        removed
    }

    /// Drop every book and pending update
    ///
    /// Call on disconnect; updates are rejected with [`Error::BookNotFound`]
    /// until fresh snapshots arrive.
    pub fn flush(&self) {
        let dropped = {
            let mut books = self.books.write();
            let dropped = books.len();
            books.clear();
            dropped
        };
        info!(books = dropped, "orderbook cache flushed");
        self.publish(BookEvent::Flushed);
    }

    /// Get number of tracked instruments
    pub fn len(&self) -> usize {
        self.books.read().len()
    }

    /// Check if manager has no books
    pub fn is_empty(&self) -> bool {
        self.books.read().is_empty()
    }

    /// Get all tracked instrument keys
    pub fn instruments(&self) -> Vec<InstrumentKey> {
        self.books.read().keys().cloned().collect()
    }
}

impl Default for OrderbookManager {
    fn default() -> Self {
        Self::with_valid_config(Config::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::{Checksum, ConcatCrc32};
    use crate::config::SortKey;
    use crate::types::{Action, AssetClass};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn key() -> InstrumentKey {
        InstrumentKey::new("test", "BTC-USD", AssetClass::Spot)
    }

    fn lvl(price: Decimal, amount: Decimal) -> PriceLevel {
        PriceLevel::new(price, amount)
    }

    fn snapshot() -> Snapshot {
        Snapshot::new(
            key(),
            vec![lvl(dec!(100), dec!(2)), lvl(dec!(99), dec!(3))],
            vec![lvl(dec!(101), dec!(1))],
        )
    }

    fn bid(id: u64, price: Decimal, amount: Decimal) -> Update {
        Update::new(key(), vec![lvl(price, amount)], vec![]).with_update_id(id)
    }

    fn manager(config: Config) -> OrderbookManager {
        let manager = OrderbookManager::new(config).unwrap();
        manager.load_snapshot(snapshot()).unwrap();
        manager
    }

    #[test]
    fn test_load_snapshot() {
        let manager = OrderbookManager::default();
        manager.load_snapshot(snapshot()).unwrap();

        assert_eq!(manager.len(), 1);
        assert_eq!(manager.state(&key()), Some(SyncState::Synchronized));
        assert_eq!(manager.best_bid(&key()), Some(lvl(dec!(100), dec!(2))));
        assert_eq!(manager.best_ask(&key()), Some(lvl(dec!(101), dec!(1))));
    }

    #[test]
    fn test_invalid_snapshot_keeps_existing_book() {
        let manager = manager(Config::new());
        let bad = Snapshot::new(key(), vec![], vec![lvl(dec!(1), dec!(1))]);

        assert!(matches!(
            manager.load_snapshot(bad),
            Err(Error::InvalidSnapshot(_))
        ));
        assert_eq!(manager.best_bid(&key()), Some(lvl(dec!(100), dec!(2))));
    }

    #[test]
    fn test_update_requires_snapshot() {
        let manager = OrderbookManager::default();
        let result = manager.update(bid(1, dec!(100), dec!(1)));
        assert!(matches!(result, Err(Error::BookNotFound { .. })));
    }

    #[test]
    fn test_empty_update_rejected() {
        let manager = manager(Config::new());
        let result = manager.update(Update::new(key(), vec![], vec![]));
        assert!(matches!(result, Err(Error::EmptyUpdate { .. })));
    }

    #[test]
    fn test_unbuffered_apply() {
        let manager = manager(Config::new());
        let update = Update::new(
            key(),
            vec![lvl(dec!(100), dec!(0)), lvl(dec!(98), dec!(5))],
            vec![],
        );

        let outcome = manager.update(update).unwrap();
        assert_eq!(
            outcome,
            UpdateOutcome::Applied(ApplyReport {
                applied: 1,
                stale: vec![]
            })
        );

        let book = manager.get(&key()).unwrap();
        assert_eq!(book.bids(), &[lvl(dec!(99), dec!(3)), lvl(dec!(98), dec!(5))]);
        assert_eq!(book.asks(), &[lvl(dec!(101), dec!(1))]);
    }

    #[test]
    fn test_buffered_apply() {
        let manager = manager(Config::new().with_buffer(3));

        assert_eq!(
            manager.update(bid(1, dec!(98), dec!(1))).unwrap(),
            UpdateOutcome::Buffered { pending: 1 }
        );
        manager.update(bid(2, dec!(97), dec!(1))).unwrap();
        assert_eq!(manager.pending(&key()), 2);
        assert_eq!(manager.get(&key()).unwrap().num_levels(), (2, 1));

        let outcome = manager.update(bid(3, dec!(96), dec!(1))).unwrap();
        assert!(matches!(outcome, UpdateOutcome::Applied(ApplyReport { applied: 3, .. })));
        assert_eq!(manager.pending(&key()), 0);
        assert_eq!(manager.get(&key()).unwrap().num_levels(), (5, 1));
    }

    #[test]
    fn test_stale_update_rejected() {
        let manager = manager(Config::new().with_update_id_progression(true));
        manager.update(bid(5, dec!(98), dec!(1))).unwrap();
        let before = manager.get(&key()).unwrap();

        let result = manager.update(bid(5, dec!(97), dec!(1)));
        assert!(matches!(
            result,
            Err(Error::StaleUpdate { last: 5, got: 5, .. })
        ));
        assert_eq!(manager.get(&key()).unwrap(), before);
    }

    #[test]
    fn test_stale_update_in_batch_skipped() {
        let config = Config::new()
            .with_buffer(3)
            .with_update_id_progression(true);
        let manager = manager(config);

        manager.update(bid(2, dec!(98), dec!(1))).unwrap();
        manager.update(bid(1, dec!(97), dec!(1))).unwrap();
        let outcome = manager.update(bid(3, dec!(96), dec!(1))).unwrap();

        assert_eq!(
            outcome,
            UpdateOutcome::Applied(ApplyReport {
                applied: 2,
                stale: vec![1]
            })
        );
        let book = manager.get(&key()).unwrap();
        assert!(book.bids().iter().all(|l| l.price != dec!(97)));
        assert_eq!(book.last_update_id(), 3);
    }

    #[test]
    fn test_sorted_batch_passes_gate() {
        let config = Config::new()
            .with_buffer(3)
            .with_sort(SortKey::UpdateId)
            .with_update_id_progression(true);
        let manager = manager(config);

        manager.update(bid(2, dec!(98), dec!(1))).unwrap();
        manager.update(bid(1, dec!(97), dec!(1))).unwrap();
        let outcome = manager.update(bid(3, dec!(96), dec!(1))).unwrap();

        assert!(matches!(
            outcome,
            UpdateOutcome::Applied(ApplyReport { applied: 3, ref stale }) if stale.is_empty()
        ));
    }

    #[test]
    fn test_checksum_mismatch_marks_resync() {
        let manager = manager(Config::new().with_checksum(ConcatCrc32::default()));

        let result = manager.update(bid(1, dec!(98), dec!(1)).with_checksum(42));
        assert!(matches!(result, Err(Error::ChecksumMismatch { expected: 42, .. })));
        assert_eq!(manager.state(&key()), Some(SyncState::NeedsResync));
        assert_eq!(manager.instruments_needing_resync(), vec![key()]);
        // Book is left as applied
        assert_eq!(manager.get(&key()).unwrap().num_levels(), (3, 1));

        manager.load_snapshot(snapshot()).unwrap();
        assert_eq!(manager.state(&key()), Some(SyncState::Synchronized));
    }

    #[test]
    fn test_checksum_match() {
        let checksum = ConcatCrc32::default();
        let manager = manager(Config::new().with_checksum(checksum));

        let mut expected = manager.get(&key()).unwrap();
        expected.apply_by_price(&bid(1, dec!(98), dec!(1)), None);
        let digest = checksum.compute(&expected);

        assert!(manager.update(bid(1, dec!(98), dec!(1)).with_checksum(digest)).is_ok());
        assert_eq!(manager.state(&key()), Some(SyncState::Synchronized));
    }

    #[test]
    fn test_id_mode_delete_twice() {
        let manager = OrderbookManager::new(Config::new().with_mode(ReconcileMode::ById)).unwrap();
        manager
            .load_snapshot(Snapshot::new(
                key(),
                vec![PriceLevel::with_id(7, dec!(50), dec!(1))],
                vec![PriceLevel::with_id(8, dec!(51), dec!(1))],
            ))
            .unwrap();

        let delete = Update::new(key(), vec![PriceLevel::with_id(7, dec!(50), dec!(0))], vec![])
            .with_action(Action::Delete);
        manager.update(delete.clone()).unwrap();
        assert!(manager.get(&key()).unwrap().bids().is_empty());
        assert!(manager.update(delete).is_ok());
    }

    #[test]
    fn test_snapshot_clears_buffer() {
        let manager = manager(Config::new().with_buffer(5));
        manager.update(bid(1, dec!(98), dec!(1))).unwrap();
        assert_eq!(manager.pending(&key()), 1);

        manager.load_snapshot(snapshot()).unwrap();
        assert_eq!(manager.pending(&key()), 0);
    }

    #[test]
    fn test_flush() {
        let manager = manager(Config::new());
        manager.flush();

        assert!(manager.is_empty());
        assert!(matches!(manager.get(&key()), Err(Error::BookNotFound { .. })));
        assert!(matches!(
            manager.update(bid(1, dec!(98), dec!(1))),
            Err(Error::BookNotFound { .. })
        ));
    }

    #[test]
    fn test_remove_and_mark_resync() {
        let manager = manager(Config::new());
        manager.mark_needs_resync(&key());
        assert_eq!(manager.state(&key()), Some(SyncState::NeedsResync));

        assert!(manager.remove(&key()));
        assert!(!manager.remove(&key()));
        assert_eq!(manager.state(&key()), None);
    }

    #[test]
    fn test_notifications() {
        let manager = OrderbookManager::default();
        let mut events = manager.subscribe();

        manager.load_snapshot(snapshot()).unwrap();
        manager.update(bid(1, dec!(98), dec!(1))).unwrap();
        manager.flush();

        assert_eq!(events.try_recv().unwrap(), BookEvent::Updated(key()));
        assert_eq!(events.try_recv().unwrap(), BookEvent::Updated(key()));
        assert_eq!(events.try_recv().unwrap(), BookEvent::Flushed);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_remove_publishes_event() {
        let manager = manager(Config::new());
        let mut events = manager.subscribe();

        assert!(manager.remove(&key()));
        assert!(!manager.remove(&key()));

        assert_eq!(events.try_recv().unwrap(), BookEvent::Removed(key()));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_checksum_ignores_trailing_zeros() {
        let manager = OrderbookManager::new(Config::new().with_checksum(ConcatCrc32::default())).unwrap();
        manager
            .load_snapshot(Snapshot::new(
                key(),
                vec![lvl(dec!(1250.0), dec!(1))],
                vec![lvl(dec!(1251.00), dec!(2))],
            ))
            .unwrap();

        let update = bid(1, dec!(1250.0), dec!(1.50)).with_checksum(crc32fast::hash(b"12501512512"));
        assert!(manager.update(update).is_ok());
        assert_eq!(manager.state(&key()), Some(SyncState::Synchronized));
    }

    #[test]
    fn test_publish_period_throttles_updates() {
        let config = Config::new().with_publish_period(std::time::Duration::from_secs(60));
        let manager = manager(config);
        let mut events = manager.subscribe();

        manager.update(bid(1, dec!(98), dec!(1))).unwrap();
        manager.update(bid(2, dec!(97), dec!(1))).unwrap();

        assert_eq!(events.try_recv().unwrap(), BookEvent::Updated(key()));
        assert!(events.try_recv().is_err());
        assert_eq!(manager.get(&key()).unwrap().num_levels(), (4, 1));
    }

    #[test]
    fn test_max_depth_applies_to_snapshot() {
        let manager = manager(Config::new().with_max_depth(1));
        manager.load_snapshot(snapshot()).unwrap();
        assert_eq!(manager.get(&key()).unwrap().num_levels(), (1, 1));
    }

    #[test]
    fn test_process_message() {
        let manager = OrderbookManager::default();
        assert_eq!(
            manager
                .process_message(FeedMessage::Snapshot(snapshot()))
                .unwrap(),
            None
        );
        let outcome = manager
            .process_message(FeedMessage::Update(bid(1, dec!(98), dec!(1))))
            .unwrap();
        assert!(matches!(outcome, Some(UpdateOutcome::Applied(_))));
    }
}
