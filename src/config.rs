//! Engine configuration.
//!
//! This module provides the [`Config`] struct, supplied once when the
//! [`OrderbookManager`](crate::orderbook::OrderbookManager) is built.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::checksum::Checksum;
use crate::error::Error;

/// How incoming deltas are matched to resting levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileMode {
    /// Match by price; amount zero deletes
    #[default]
    ByPrice,
    /// Match by level/order id and dispatch on the update's action
    ById,
}

/// Key used to order a buffered batch before it is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Venue timestamp
    #[default]
    UpdateTime,
    /// Feed update id, for venues that do not stamp updates
    UpdateId,
}

/// Configuration for the replication engine
///
/// # Example
///
/// ```rust
/// use orderbook_replica::config::{Config, ReconcileMode, SortKey};
///
/// // Apply every update as it arrives
/// let config = Config::new();
///
/// // Coalesce bursts of 20 updates, ordered by update id
/// let config = Config::new()
///     .with_buffer(20)
///     .with_sort(SortKey::UpdateId)
///     .with_update_id_progression(true);
///
/// // Order-addressed venue
/// let config = Config::new().with_mode(ReconcileMode::ById);
/// ```
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Accumulate updates per instrument before applying them
    buffer_enabled: bool,

    /// Number of buffered updates that triggers a flush
    buffer_limit: usize,

    /// Sort a buffered batch before applying it
    sort_buffer: bool,

    /// Sort key for buffered batches
    sort_key: SortKey,

    /// Delta matching mode
    mode: ReconcileMode,

    /// Reject updates whose id does not exceed the last applied id
    update_id_progression: bool,

    /// Keep only the best N levels per side (price-keyed books)
    max_depth: Option<usize>,

    /// Minimum interval between change notifications per instrument
    publish_period_ms: Option<u64>,

    /// Capacity of the notification channel
    event_capacity: usize,

    /// Venue checksum over the top of the book
    #[serde(skip)]
    checksum: Option<Arc<dyn Checksum>>,
}

impl Config {
    /// Create a configuration that applies every update immediately by price
    pub fn new() -> Self {
        Self {
            buffer_enabled: false,
            buffer_limit: 0,
            sort_buffer: false,
            sort_key: SortKey::default(),
            mode: ReconcileMode::default(),
            update_id_progression: false,
            max_depth: None,
            publish_period_ms: None,
            event_capacity: 1024,
            checksum: None,
        }
    }

    /// Parse a configuration from JSON
    ///
    /// The checksum cannot be expressed in JSON; attach it with
    /// [`with_checksum`](Self::with_checksum).
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Buffer `limit` updates per instrument before applying them
    #[must_use]
    pub fn with_buffer(mut self, limit: usize) -> Self {
        self.buffer_enabled = true;
        self.buffer_limit = limit;
        self
    }

    /// Sort buffered batches by `key` before applying them
    #[must_use]
    pub fn with_sort(mut self, key: SortKey) -> Self {
        self.sort_buffer = true;
        self.sort_key = key;
        self
    }

    /// Set the delta matching mode
    #[must_use]
    pub fn with_mode(mut self, mode: ReconcileMode) -> Self {
        self.mode = mode;
        self
    }

    /// Require strictly increasing update ids
    #[must_use]
    pub fn with_update_id_progression(mut self, enabled: bool) -> Self {
        self.update_id_progression = enabled;
        self
    }

    /// Truncate each side to its best `depth` levels after every apply
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Publish at most one change notification per instrument per `period`
    #[must_use]
    pub fn with_publish_period(mut self, period: Duration) -> Self {
        self.publish_period_ms = Some(period.as_millis() as u64);
        self
    }

    /// Set the notification channel capacity
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Validate books against a venue checksum after each apply
    #[must_use]
    pub fn with_checksum(mut self, checksum: impl Checksum + 'static) -> Self {
        self.checksum = Some(Arc::new(checksum));
        self
    }

    /// Check the configuration for contradictions
    pub fn validate(&self) -> Result<(), Error> {
        if self.buffer_enabled && self.buffer_limit == 0 {
            return Err(Error::Config(
                "buffer_limit must be at least 1 when buffering is enabled".into(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(Error::Config("event_capacity must be at least 1".into()));
        }
        if self.max_depth == Some(0) {
            return Err(Error::Config("max_depth must be at least 1".into()));
        }
        Ok(())
    }

    /// Whether updates are buffered
    pub fn buffer_enabled(&self) -> bool {
        self.buffer_enabled
    }

    /// Buffer flush threshold
    pub fn buffer_limit(&self) -> usize {
        self.buffer_limit
    }

    /// Sort key, if buffered batches are sorted
    pub fn sort_key(&self) -> Option<SortKey> {
        self.sort_buffer.then_some(self.sort_key)
    }

    /// Delta matching mode
    pub fn mode(&self) -> ReconcileMode {
        self.mode
    }

    /// Whether update ids must strictly increase
    pub fn update_id_progression(&self) -> bool {
        self.update_id_progression
    }

    /// Per-side depth limit
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Notification throttle period
    pub fn publish_period(&self) -> Option<Duration> {
        self.publish_period_ms.map(Duration::from_millis)
    }

    /// Notification channel capacity
    pub fn event_capacity(&self) -> usize {
        self.event_capacity
    }

    /// Configured checksum
    pub fn checksum(&self) -> Option<&Arc<dyn Checksum>> {
        self.checksum.as_ref()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("buffer_enabled", &self.buffer_enabled)
            .field("buffer_limit", &self.buffer_limit)
            .field("sort_buffer", &self.sort_buffer)
            .field("sort_key", &self.sort_key)
            .field("mode", &self.mode)
            .field("update_id_progression", &self.update_id_progression)
            .field("max_depth", &self.max_depth)
            .field("publish_period_ms", &self.publish_period_ms)
            .field("event_capacity", &self.event_capacity)
            .field("checksum", &self.checksum.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::new();
        assert!(!config.buffer_enabled());
        assert_eq!(config.sort_key(), None);
        assert_eq!(config.mode(), ReconcileMode::ByPrice);
        assert!(!config.update_id_progression());
        assert!(config.checksum().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = Config::new()
            .with_buffer(5)
            .with_sort(SortKey::UpdateId)
            .with_mode(ReconcileMode::ById)
            .with_update_id_progression(true)
            .with_publish_period(Duration::from_millis(250))
            .with_checksum(|_: &crate::orderbook::BookState| 0u32);

        assert!(config.buffer_enabled());
        assert_eq!(config.buffer_limit(), 5);
        assert_eq!(config.sort_key(), Some(SortKey::UpdateId));
        assert_eq!(config.mode(), ReconcileMode::ById);
        assert!(config.update_id_progression());
        assert_eq!(config.publish_period(), Some(Duration::from_millis(250)));
        assert!(config.checksum().is_some());
        assert!(format!("{:?}", config).contains("checksum: true"));
    }

    #[test]
    fn test_zero_buffer_limit_rejected() {
        let config = Config::new().with_buffer(0);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_from_json() {
        let config = Config::from_json(
            r#"{
                "buffer_enabled": true,
                "buffer_limit": 10,
                "sort_buffer": true,
                "sort_key": "update_id",
                "mode": "by_id",
                "max_depth": 25
            }"#,
        )
        .unwrap();

        assert_eq!(config.buffer_limit(), 10);
        assert_eq!(config.sort_key(), Some(SortKey::UpdateId));
        assert_eq!(config.mode(), ReconcileMode::ById);
        assert_eq!(config.max_depth(), Some(25));
        assert_eq!(config.event_capacity(), 1024);
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(
            Config::from_json(r#"{"buffer_enabled": true}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(Config::from_json("{"), Err(Error::Json(_))));
    }
}
