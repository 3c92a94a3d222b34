//! Per-instrument book state and delta reconciliation.
//!
//! Each side is a `Vec<PriceLevel>` kept sorted best-first:
//!
//! - Asks ascending by price, bids descending by price
//! - Sides are re-sorted after every applied update, so deltas inside one
//!   update may arrive in any order
//! - Identifier-keyed books may hold several levels at one price, which is why
//!   sides are not keyed by price

use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::config::ReconcileMode;
use crate::error::Error;
use crate::types::messages::{Action, PriceLevel, Snapshot, Update};
use crate::types::{now_ms, Amount, InstrumentKey, Price, TimestampMs, UpdateId};

/// Side of the book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Bid (buy) side, best = highest price
    Bid,
    /// Ask (sell) side, best = lowest price
    Ask,
}

impl Side {
    /// Restore best-first ordering
    ///
    /// Stable, so levels sharing a price keep their arrival order.
    pub fn sort(self, levels: &mut [PriceLevel]) {
        match self {
            Side::Bid => levels.sort_by(|a, b| b.price.cmp(&a.price)),
            Side::Ask => levels.sort_by(|a, b| a.price.cmp(&b.price)),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Side::Bid => "bid",
            Side::Ask => "ask",
        }
    }
}

/// Amount zero (or below) in an update means "remove this level"
fn is_removal(amount: Amount) -> bool {
    amount <= Decimal::ZERO
}

/// Orderbook for a single instrument.
///
/// # Design Decisions
///
/// 1. **Decimal prices**: exact equality when matching a delta to a level,
///    and the venue's scale survives for checksum rendering.
///
/// 2. **Sorted vectors**: an update re-sorts the touched sides. Books are
///    shallow (tens to a few hundred levels), and the same structure serves
///    both price-keyed and identifier-keyed venues.
///
/// 3. **Read-only outside the crate**: only the manager mutates a book, while
///    holding that instrument's lock. Callers receive clones or scoped views.
#[derive(Debug, Clone, PartialEq)]
pub struct BookState {
    /// Instrument this book replicates
    key: InstrumentKey,

    /// Bid levels, highest price first
    bids: Vec<PriceLevel>,

    /// Ask levels, lowest price first
    asks: Vec<PriceLevel>,

    /// Update id of the last snapshot or applied update
    last_update_id: UpdateId,

    /// Venue time of the last snapshot or applied update
    last_updated: TimestampMs,
}

impl BookState {
    /// Build a book from a snapshot, validating it for `mode`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSnapshot`] if the key is unpopulated, either
    /// side is empty, a level has a non-positive price or amount, or levels
    /// collide on price (price-keyed) or id (identifier-keyed).
    pub fn from_snapshot(snapshot: Snapshot, mode: ReconcileMode) -> Result<Self, Error> {
        if let Some(component) = snapshot.key.missing_component() {
            return Err(Error::InvalidSnapshot(format!("{component} unset")));
        }
        if snapshot.bids.is_empty() || snapshot.asks.is_empty() {
            return Err(Error::InvalidSnapshot(format!(
                "{}: bids and asks must both be non-empty",
                snapshot.key
            )));
        }

        let Snapshot {
            key,
            mut bids,
            mut asks,
            last_update_id,
            update_time,
        } = snapshot;

        Side::Bid.sort(&mut bids);
        Side::Ask.sort(&mut asks);
        verify_side(&key, Side::Bid, &bids, mode)?;
        verify_side(&key, Side::Ask, &asks, mode)?;

        Ok(Self {
            key,
            bids,
            asks,
            last_update_id,
            last_updated: if update_time == 0 { now_ms() } else { update_time },
        })
    }

    /// Get the instrument key
    #[must_use]
    pub fn key(&self) -> &InstrumentKey {
        &self.key
    }

    /// Bid levels, best (highest) first
    #[must_use]
    pub fn bids(&self) -> &[PriceLevel] {
        &self.bids
    }

    /// Ask levels, best (lowest) first
    #[must_use]
    pub fn asks(&self) -> &[PriceLevel] {
        &self.asks
    }

    /// Update id of the last snapshot or applied update
    #[must_use]
    pub const fn last_update_id(&self) -> UpdateId {
        self.last_update_id
    }

    /// Venue time (ms) of the last snapshot or applied update
    #[must_use]
    pub const fn last_updated(&self) -> TimestampMs {
        self.last_updated
    }

    /// Apply price-keyed deltas
    ///
    /// Per level: matching price + zero amount deletes, matching price +
    /// non-zero amount amends, no match + zero amount is a no-op, no match +
    /// non-zero amount inserts. When one update targets a price twice, the
    /// later delta wins.
    pub(crate) fn apply_by_price(&mut self, update: &Update, max_depth: Option<usize>) {
        if !update.bids.is_empty() {
            update_by_price(&mut self.bids, &update.bids, Side::Bid, max_depth);
        }
        if !update.asks.is_empty() {
            update_by_price(&mut self.asks, &update.asks, Side::Ask, max_depth);
        }
    }

    /// Apply identifier-keyed deltas according to the update's action
    ///
    /// Unknown ids are ignored for `Update` and `Delete`, so late deletes of
    /// orders that already left the book are harmless.
    pub(crate) fn apply_by_id(&mut self, update: &Update) {
        match update.action {
            Action::Update => {
                amend_by_id(&mut self.bids, &update.bids);
                amend_by_id(&mut self.asks, &update.asks);
            }
            Action::Delete => {
                delete_by_id(&mut self.bids, &update.bids);
                delete_by_id(&mut self.asks, &update.asks);
            }
            Action::Insert | Action::Upsert => {
                insert_by_id(&mut self.bids, &update.bids, Side::Bid);
                insert_by_id(&mut self.asks, &update.asks, Side::Ask);
            }
        }
    }

    /// Keep only the best `depth` levels on each side
    pub(crate) fn truncate(&mut self, depth: usize) {
        self.bids.truncate(depth);
        self.asks.truncate(depth);
    }

    /// Record the id and time of the update just applied
    pub(crate) fn stamp(&mut self, update_id: UpdateId, update_time: TimestampMs) {
        self.last_update_id = update_id;
        self.last_updated = if update_time == 0 { now_ms() } else { update_time };
    }

    /// Get the best bid (highest bid)
    ///
    /// Returns `None` if there are no bids.
    #[must_use]
    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.bids.first().copied()
    }

    /// Get the best ask (lowest ask)
    ///
    /// Returns `None` if there are no asks.
    #[must_use]
    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.asks.first().copied()
    }

    /// Get the mid price
    ///
    /// Returns the average of best bid and best ask, or `None` if either is
    /// missing or their sum overflows.
    #[must_use]
    pub fn mid_price(&self) -> Option<Price> {
        let (bid, ask) = (self.best_bid()?, self.best_ask()?);
        bid.price
            .checked_add(ask.price)
            .map(|sum| sum / Decimal::TWO)
    }

    /// Get the spread (best ask - best bid)
    #[must_use]
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.price - bid.price),
            _ => None,
        }
    }

    /// Check if the book is crossed (best bid >= best ask)
    ///
    /// A replicated book should never cross; a crossed book has desynced.
    #[must_use]
    pub fn is_crossed(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => bid.price >= ask.price,
            _ => false,
        }
    }

    /// Get the top N bid levels
    #[must_use]
    pub fn top_bids(&self, n: usize) -> &[PriceLevel] {
        &self.bids[..n.min(self.bids.len())]
    }

    /// Get the top N ask levels
    #[must_use]
    pub fn top_asks(&self, n: usize) -> &[PriceLevel] {
        &self.asks[..n.min(self.asks.len())]
    }

    /// Total bid amount and its notional value
    ///
    /// Returns `None` if either total overflows `Decimal`.
    #[must_use]
    pub fn total_bid_amount(&self) -> Option<(Amount, Amount)> {
        totals(&self.bids)
    }

    /// Total ask amount and its notional value
    ///
    /// Returns `None` if either total overflows `Decimal`.
    #[must_use]
    pub fn total_ask_amount(&self) -> Option<(Amount, Amount)> {
        totals(&self.asks)
    }

    /// Check if the orderbook is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Get the number of levels as `(bids, asks)`
    #[must_use]
    pub fn num_levels(&self) -> (usize, usize) {
        (self.bids.len(), self.asks.len())
    }
}

fn totals(levels: &[PriceLevel]) -> Option<(Amount, Amount)> {
    levels
        .iter()
        .try_fold((Decimal::ZERO, Decimal::ZERO), |(amount, value), l| {
            Some((amount.checked_add(l.amount)?, value.checked_add(l.notional()?)?))
        })
}

fn verify_side(
    key: &InstrumentKey,
    side: Side,
    levels: &[PriceLevel],
    mode: ReconcileMode,
) -> Result<(), Error> {
    let invalid = |reason: String| {
        Error::InvalidSnapshot(format!("{key}: {} side {reason}", side.name()))
    };

    let mut ids = FxHashSet::default();
    for (i, level) in levels.iter().enumerate() {
        if level.price <= Decimal::ZERO {
            return Err(invalid(format!("price {} not positive", level.price)));
        }
        if level.amount <= Decimal::ZERO {
            return Err(invalid(format!("amount at {} not positive", level.price)));
        }
        match mode {
            ReconcileMode::ByPrice => {
                if i > 0 && levels[i - 1].price == level.price {
                    return Err(invalid(format!("duplicate price {}", level.price)));
                }
            }
            ReconcileMode::ById => match level.id {
                None => return Err(invalid(format!("level at {} has no id", level.price))),
                Some(id) if !ids.insert(id) => {
                    return Err(invalid(format!("duplicate id {id}")));
                }
                Some(_) => {}
            },
        }
    }
    Ok(())
}

fn update_by_price(
    levels: &mut Vec<PriceLevel>,
    deltas: &[PriceLevel],
    side: Side,
    max_depth: Option<usize>,
) {
    for delta in deltas {
        match levels.iter().position(|l| l.price == delta.price) {
            Some(i) if is_removal(delta.amount) => {
                levels.remove(i);
            }
            Some(i) => levels[i].amount = delta.amount,
            // Deleting a level we never had
            None if is_removal(delta.amount) => {}
            None => levels.push(PriceLevel::new(delta.price, delta.amount)),
        }
    }
    side.sort(levels);
    if let Some(depth) = max_depth {
        levels.truncate(depth);
    }
}

fn position_by_id(levels: &[PriceLevel], delta: &PriceLevel) -> Option<usize> {
    let id = delta.id?;
    levels.iter().position(|l| l.id == Some(id))
}

fn amend_by_id(levels: &mut Vec<PriceLevel>, deltas: &[PriceLevel]) {
    for delta in deltas {
        match position_by_id(levels, delta) {
            Some(i) if is_removal(delta.amount) => {
                levels.remove(i);
            }
            Some(i) => levels[i].amount = delta.amount,
            None => debug!(id = ?delta.id, "update for unknown id ignored"),
        }
    }
}

fn delete_by_id(levels: &mut Vec<PriceLevel>, deltas: &[PriceLevel]) {
    for delta in deltas {
        if let Some(i) = position_by_id(levels, delta) {
            levels.remove(i);
        }
    }
}

fn insert_by_id(levels: &mut Vec<PriceLevel>, deltas: &[PriceLevel], side: Side) {
    if deltas.is_empty() {
        return;
    }
    for delta in deltas {
        if delta.id.is_none() {
            debug!(price = %delta.price, "level without id ignored");
            continue;
        }
        match position_by_id(levels, delta) {
            Some(i) if is_removal(delta.amount) => {
                levels.remove(i);
            }
            Some(i) => levels[i] = *delta,
            None if is_removal(delta.amount) => {}
            None => levels.push(*delta),
        }
    }
    side.sort(levels);
}
