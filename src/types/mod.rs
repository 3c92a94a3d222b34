//! Feed types consumed and produced by the replication engine.
//!
//! - [`instrument`] - Instrument keys (venue + pair + asset class)
//! - [`messages`] - Snapshot/update messages from the feed and events to consumers

pub mod instrument;
pub mod messages;

pub use instrument::{AssetClass, InstrumentKey};
pub use messages::{Action, BookEvent, DesyncReason, FeedMessage, PriceLevel, Snapshot, Update};

/// Price of a level
///
/// Using `Decimal` instead of floating point for:
/// - Exact equality when matching incoming deltas to resting levels
/// - Scale preservation, which venue checksums depend on
pub type Price = rust_decimal::Decimal;

/// Amount resting at a level
pub type Amount = rust_decimal::Decimal;

/// Venue-assigned order or level identifier (identifier-keyed books)
pub type LevelId = u64;

/// Monotonic update/sequence id carried by the feed
pub type UpdateId = u64;

/// Timestamp in milliseconds since Unix epoch
pub type TimestampMs = u64;

/// Current wall-clock time in milliseconds since Unix epoch
pub(crate) fn now_ms() -> TimestampMs {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as TimestampMs)
        .unwrap_or_default()
}
