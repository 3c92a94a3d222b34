//! Error types for the orderbook-replica crate.
//!
//! Every error here is recoverable: the worst case is a desynchronised book,
//! which the caller repairs by requesting a fresh snapshot for that instrument.

use thiserror::Error;

use crate::types::{DesyncReason, InstrumentKey, UpdateId};

/// The main error type for this crate
#[derive(Debug, Error)]
pub enum Error {
    /// Update carried neither bid nor ask deltas
    #[error("{key}: update has no bid or ask deltas")]
    EmptyUpdate {
        /// Instrument the update was addressed to
        key: InstrumentKey,
    },

    /// No snapshot has been loaded for the instrument
    #[error("{key}: orderbook not found, load a snapshot first")]
    BookNotFound {
        /// Instrument that was looked up
        key: InstrumentKey,
    },

    /// Snapshot failed validation and was not stored
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Update id did not advance past the book's last applied id
    #[error("{key}: stale update {got}, last applied {last}")]
    StaleUpdate {
        /// Instrument the update was addressed to
        key: InstrumentKey,
        /// Last applied update id
        last: UpdateId,
        /// Update id that was rejected
        got: UpdateId,
    },

    /// Local book digest does not match the one carried by the feed
    #[error("{key}: checksum mismatch, expected {expected} computed {computed}")]
    ChecksumMismatch {
        /// Instrument whose book is now suspect
        key: InstrumentKey,
        /// Checksum carried by the feed
        expected: u32,
        /// Checksum computed over the local book
        computed: u32,
    },

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build the error reported for a desync detected on `key`
    pub(crate) fn from_desync(key: InstrumentKey, reason: DesyncReason) -> Self {
        match reason {
            DesyncReason::StaleUpdate { last, got } => Error::StaleUpdate { key, last, got },
            DesyncReason::ChecksumMismatch { expected, computed } => Error::ChecksumMismatch {
                key,
                expected,
                computed,
            },
        }
    }

    /// Returns `true` when the caller should resubscribe for a fresh snapshot
    pub fn needs_resync(&self) -> bool {
        matches!(
            self,
            Error::BookNotFound { .. } | Error::ChecksumMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AssetClass;

    fn key() -> InstrumentKey {
        InstrumentKey::new("kraken", "BTC-USD", AssetClass::Spot)
    }

    #[test]
    fn test_stale_update_display() {
        let err = Error::StaleUpdate {
            key: key(),
            last: 5,
            got: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("kraken"));
        assert!(msg.contains('5'));
        assert!(msg.contains('3'));
    }

    #[test]
    fn test_checksum_mismatch_display() {
        let err = Error::ChecksumMismatch {
            key: key(),
            expected: 974947235,
            computed: 1,
        };
        assert!(err.to_string().contains("974947235"));
        assert!(err.needs_resync());
    }

    #[test]
    fn test_needs_resync() {
        assert!(Error::BookNotFound { key: key() }.needs_resync());
        assert!(!Error::EmptyUpdate { key: key() }.needs_resync());
        assert!(!Error::InvalidSnapshot("empty".into()).needs_resync());
    }
}
