//! Feed message types.
//!
//! This module contains the snapshot/update messages an exchange client hands
//! to the engine, and the events the engine publishes to downstream consumers.
//! Decimals travel as JSON strings so their scale survives the round trip.

use serde::{Deserialize, Serialize};

use super::{Amount, InstrumentKey, LevelId, Price, TimestampMs, UpdateId};

/// A single level on one side of the book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// Level price
    pub price: Price,
    /// Amount resting at the price; zero in an update means delete
    pub amount: Amount,
    /// Venue order/level id (identifier-keyed books only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<LevelId>,
}

impl PriceLevel {
    /// Create a price-keyed level
    pub fn new(price: Price, amount: Amount) -> Self {
        Self {
            price,
            amount,
            id: None,
        }
    }

    /// Create an identifier-keyed level
    pub fn with_id(id: LevelId, price: Price, amount: Amount) -> Self {
        Self {
            price,
            amount,
            id: Some(id),
        }
    }

    /// Notional value (price * amount) at this level
    ///
    /// Returns `None` if the product overflows `Decimal`.
    pub fn notional(&self) -> Option<Amount> {
        self.price.checked_mul(self.amount)
    }
}

/// Action carried by an identifier-keyed update
///
/// Price-keyed books ignore the action: every delta is an upsert by price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Update the level if the id rests on the book, insert it otherwise
    #[default]
    #[serde(alias = "update_insert")]
    Upsert,
    /// Insert new levels
    Insert,
    /// Amend the amount of existing levels
    Update,
    /// Remove existing levels
    Delete,
}

/// Full replacement of an instrument's book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Instrument the snapshot belongs to
    pub key: InstrumentKey,
    /// Bid levels, any order
    pub bids: Vec<PriceLevel>,
    /// Ask levels, any order
    pub asks: Vec<PriceLevel>,
    /// Update id the snapshot is current as of
    #[serde(default)]
    pub last_update_id: UpdateId,
    /// Venue timestamp (0 = stamp on arrival)
    #[serde(default)]
    pub update_time: TimestampMs,
}

impl Snapshot {
    /// Create a snapshot with no update id or timestamp
    pub fn new(key: InstrumentKey, bids: Vec<PriceLevel>, asks: Vec<PriceLevel>) -> Self {
        Self {
            key,
            bids,
            asks,
            last_update_id: 0,
            update_time: 0,
        }
    }

    /// Set the update id the snapshot is current as of
    #[must_use]
    pub fn with_update_id(mut self, last_update_id: UpdateId) -> Self {
        self.last_update_id = last_update_id;
        self
    }
}

/// Incremental change to an instrument's book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    /// Instrument the update is addressed to
    pub key: InstrumentKey,
    /// Bid deltas
    #[serde(default)]
    pub bids: Vec<PriceLevel>,
    /// Ask deltas
    #[serde(default)]
    pub asks: Vec<PriceLevel>,
    /// Action for identifier-keyed books
    #[serde(default)]
    pub action: Action,
    /// Feed sequence/update id
    #[serde(default)]
    pub update_id: UpdateId,
    /// Venue timestamp (0 = stamp on apply)
    #[serde(default)]
    pub update_time: TimestampMs,
    /// Venue checksum of the book after this update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<u32>,
}

impl Update {
    /// Create an update with the default action and no id or timestamp
    pub fn new(key: InstrumentKey, bids: Vec<PriceLevel>, asks: Vec<PriceLevel>) -> Self {
        Self {
            key,
            bids,
            asks,
            action: Action::default(),
            update_id: 0,
            update_time: 0,
            checksum: None,
        }
    }

    /// Set the identifier-keyed action
    #[must_use]
    pub fn with_action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    /// Set the feed update id
    #[must_use]
    pub fn with_update_id(mut self, update_id: UpdateId) -> Self {
        self.update_id = update_id;
        self
    }

    /// Set the venue timestamp
    #[must_use]
    pub fn with_update_time(mut self, update_time: TimestampMs) -> Self {
        self.update_time = update_time;
        self
    }

    /// Attach the venue checksum
    #[must_use]
    pub fn with_checksum(mut self, checksum: u32) -> Self {
        self.checksum = Some(checksum);
        self
    }

    /// Check that the update carries no deltas at all
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

/// Message from the feed, as produced by an exchange client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedMessage {
    /// Full book
    Snapshot(Snapshot),
    /// Incremental change
    Update(Update),
}

/// Why a book is suspected to have drifted from the venue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesyncReason {
    /// Update id did not advance past the last applied id
    StaleUpdate {
        /// Last applied update id
        last: UpdateId,
        /// Rejected update id
        got: UpdateId,
    },
    /// Venue checksum disagrees with the local book
    ChecksumMismatch {
        /// Checksum carried by the feed
        expected: u32,
        /// Checksum computed locally
        computed: u32,
    },
}

/// Notification published to downstream consumers
///
/// Carries keys only; consumers re-fetch the book from the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookEvent {
    /// Book changed (snapshot loaded or updates applied)
    Updated(InstrumentKey),
    /// Book rejected an update or failed integrity checks
    Desync {
        /// Affected instrument
        key: InstrumentKey,
        /// What was detected
        reason: DesyncReason,
    },
    /// One book was dropped
    Removed(InstrumentKey),
    /// All books were dropped
    Flushed,
}
