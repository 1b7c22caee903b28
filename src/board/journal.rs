use std::collections::HashMap;

use crate::board::registry::Status;
use crate::board::store::ItemId;

/// Pre-image recorded for one optimistic status mutation. Kept until the
/// gesture either commits (entry discarded), fails (pre-image replayed),
/// or ends without a commit (entry discarded explicitly).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    /// Version produced by the optimistic apply this entry guards.
    pub version: u64,
    /// Status held immediately before that apply.
    pub prior_status: Status,
    /// Set once a commit has actually been issued for this version. An
    /// in-flight entry survives gesture-end cleanup until its result
    /// settles, so a failed commit can still be compensated.
    pub in_flight: bool,
}

/// Per-item transaction journal backing optimistic updates: record the
/// pre-image, apply the speculative mutation, then discard the pre-image
/// on commit or replay it to compensate on failure.
#[derive(Debug, Default)]
pub struct TransactionJournal {
    entries: HashMap<ItemId, JournalEntry>,
}

impl TransactionJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the pre-image of an optimistic apply. A later apply on the
    /// same item supersedes the earlier entry: rollback always targets the
    /// value held immediately before the apply that failed.
    pub fn record(&mut self, item_id: ItemId, version: u64, prior_status: Status) {
        self.entries.insert(
            item_id,
            JournalEntry {
                version,
                prior_status,
                in_flight: false,
            },
        );
    }

    /// Marks the journaled mutation as having an issued commit and pins
    /// its pre-image to `prior_status`. Hover previews along the way leave
    /// intermediate pre-images behind; compensation must target the status
    /// held before the whole gesture began. Returns false if no entry at
    /// that version exists.
    pub fn stage(&mut self, item_id: &ItemId, version: u64, prior_status: Status) -> bool {
        match self.entries.get_mut(item_id) {
            Some(entry) if entry.version == version => {
                entry.prior_status = prior_status;
                entry.in_flight = true;
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, item_id: &ItemId) -> Option<&JournalEntry> {
        self.entries.get(item_id)
    }

    pub fn is_pending(&self, item_id: &ItemId) -> bool {
        self.entries.contains_key(item_id)
    }

    /// Discards the entry, returning it for compensation if present.
    pub fn take(&mut self, item_id: &ItemId) -> Option<JournalEntry> {
        self.entries.remove(item_id)
    }

    /// Discards a preview-only entry. An in-flight entry is kept: its
    /// commit result is still outstanding and may need the pre-image.
    pub fn discard_preview(&mut self, item_id: &ItemId) {
        if self.entries.get(item_id).is_some_and(|entry| !entry.in_flight) {
            self.entries.remove(item_id);
        }
    }

    /// Drops entries for items no longer known to the board.
    pub fn retain_items<F>(&mut self, mut known: F)
    where
        F: FnMut(&ItemId) -> bool,
    {
        self.entries.retain(|id, _| known(id));
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
