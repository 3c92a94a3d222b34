//! Per-instrument update buffer.
//!
//! Bursty feeds are coalesced into batches of `limit` updates. A full batch is
//! optionally sorted and handed back to the manager to apply in one pass.

use crate::config::SortKey;
use crate::types::messages::Update;

/// Pending updates for one instrument
#[derive(Debug, Default)]
pub(crate) struct UpdateBuffer {
    pending: Vec<Update>,
}

impl UpdateBuffer {
    /// Queue an update
    ///
    /// Returns the whole batch, sorted by `sort` when given, once `limit`
    /// updates are pending. The buffer is empty afterwards.
    pub(crate) fn push(
        &mut self,
        update: Update,
        limit: usize,
        sort: Option<SortKey>,
    ) -> Option<Vec<Update>> {
        self.pending.push(update);
        if self.pending.len() < limit {
            return None;
        }

        let mut batch = std::mem::take(&mut self.pending);
        if let Some(key) = sort {
            sort_batch(&mut batch, key);
        }
        Some(batch)
    }

    /// Number of queued updates
    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    /// Drop all queued updates
    pub(crate) fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Order a batch by `key`, keeping arrival order between equal keys
pub(crate) fn sort_batch(batch: &mut [Update], key: SortKey) {
    match key {
        SortKey::UpdateId => batch.sort_by_key(|u| u.update_id),
        SortKey::UpdateTime => batch.sort_by_key(|u| u.update_time),
    }
}
