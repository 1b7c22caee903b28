use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::board::journal::TransactionJournal;
use crate::board::registry::{ContentType, Status, StatusWorkflow};
use crate::board::{BoardEvent, MutationTrigger, TransitionRecord};

/// Opaque item identifier, assigned by the external feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        ItemId(s)
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display payload of a card. Opaque to the board core; carried through
/// snapshots untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardFields {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub extra: serde_json::Value,
}

/// One content piece on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowItem {
    pub id: ItemId,
    pub content_type: ContentType,
    pub status: Status,
    /// Monotonic per-item counter, bumped on every status mutation.
    /// Stale asynchronous results are detected and discarded by version.
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub card: CardFields,
}

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("unknown item: {0}")]
    UnknownItem(ItemId),

    #[error("status {status} is not part of the {content_type} workflow")]
    StatusOutsideWorkflow {
        status: Status,
        content_type: ContentType,
    },

    #[error("a drag session is already active for item {0}")]
    DragAlreadyActive(ItemId),

    #[error("no active drag session")]
    NoActiveDrag,
}

/// How the store settled a commit result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitSettlement {
    /// The result no longer matches the item's current version (or the
    /// item left the board); discarded with no state change.
    Stale,
    /// Success confirmed; pending entry cleared, state untouched.
    Committed,
    /// Failure; the journaled pre-image was replayed.
    RolledBack { attempted: Status, reverted_to: Status },
}

/// In-memory authoritative cache of the items on one board. Mutations are
/// synchronous; change notifications are emitted for the render layer.
pub struct BoardStore {
    workflow: &'static StatusWorkflow,
    items: HashMap<ItemId, WorkflowItem>,
    /// Feed delivery order; intra-column ordering follows it.
    order: Vec<ItemId>,
    journal: TransactionJournal,
    history: Vec<TransitionRecord>,
    history_limit: usize,
    events: broadcast::Sender<BoardEvent>,
}

impl std::fmt::Debug for BoardStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardStore")
            .field("content_type", &self.workflow.content_type)
            .field("items", &self.items.len())
            .field("history", &self.history.len())
            .finish()
    }
}

impl BoardStore {
    pub fn new(
        workflow: &'static StatusWorkflow,
        events: broadcast::Sender<BoardEvent>,
        history_limit: usize,
    ) -> Self {
        Self {
            workflow,
            items: HashMap::new(),
            order: Vec::new(),
            journal: TransactionJournal::new(),
            history: Vec::new(),
            history_limit,
            events,
        }
    }

    pub fn workflow(&self) -> &'static StatusWorkflow {
        self.workflow
    }

    /// Replaces the cache with a fresh snapshot from the external feed.
    ///
    /// Items with a pending optimistic edit keep their local status and
    /// version instead of being clobbered by the (possibly stale) incoming
    /// value; only their display fields are refreshed. Items absent from
    /// the snapshot are removed outright; the feed owns item lifecycle.
    pub fn load(&mut self, snapshot: Vec<WorkflowItem>) {
        let mut items = HashMap::with_capacity(snapshot.len());
        let mut order = Vec::with_capacity(snapshot.len());

        for mut incoming in snapshot {
            if incoming.content_type != self.workflow.content_type {
                warn!(
                    item_id = %incoming.id,
                    content_type = %incoming.content_type,
                    board = %self.workflow.content_type,
                    "Dropping snapshot item from another board"
                );
                continue;
            }
            if !self.workflow.contains(incoming.status) {
                warn!(
                    item_id = %incoming.id,
                    status = %incoming.status,
                    "Dropping snapshot item with status outside its workflow"
                );
                continue;
            }

            let current = self
                .items
                .get(&incoming.id)
                .map(|item| (item.status, item.version));
            if let Some((current_status, current_version)) = current {
                if self.journal.is_pending(&incoming.id) {
                    // Optimistic edit wins over the stale snapshot value.
                    incoming.status = current_status;
                    incoming.version = current_version;
                } else if incoming.status != current_status {
                    // Externally-synced mutation: versioned like any other.
                    incoming.version = current_version + 1;
                    self.record(TransitionRecord {
                        item_id: incoming.id.clone(),
                        from: Some(current_status),
                        to: incoming.status,
                        trigger: MutationTrigger::FeedSync,
                        version: incoming.version,
                        at: Utc::now(),
                    });
                } else {
                    incoming.version = current_version.max(incoming.version);
                }
            }

            order.push(incoming.id.clone());
            items.insert(incoming.id.clone(), incoming);
        }

        self.journal.retain_items(|id| items.contains_key(id));
        let count = items.len();
        self.items = items;
        self.order = order;

        debug!(
            board = %self.workflow.content_type,
            items = count,
            "Snapshot loaded"
        );
        let _ = self.events.send(BoardEvent::SnapshotLoaded { count });
    }

    /// Items in one column, in feed order.
    pub fn items_by_status(&self, status: Status) -> Vec<&WorkflowItem> {
        self.order
            .iter()
            .filter_map(|id| self.items.get(id))
            .filter(|item| item.status == status)
            .collect()
    }

    pub fn get(&self, item_id: &ItemId) -> Option<&WorkflowItem> {
        self.items.get(item_id)
    }

    pub fn status_of(&self, item_id: &ItemId) -> Option<Status> {
        self.items.get(item_id).map(|item| item.status)
    }

    pub fn version_of(&self, item_id: &ItemId) -> Option<u64> {
        self.items.get(item_id).map(|item| item.version)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Applies a speculative status mutation: journals the pre-image,
    /// bumps the version, and notifies subscribers. Returns the new
    /// version for correlating the asynchronous commit result. Applying
    /// the item's current status is a no-op and leaves the version
    /// untouched.
    pub fn apply_optimistic(
        &mut self,
        item_id: &ItemId,
        new_status: Status,
        trigger: MutationTrigger,
    ) -> Result<u64, BoardError> {
        if !self.workflow.contains(new_status) {
            return Err(BoardError::StatusOutsideWorkflow {
                status: new_status,
                content_type: self.workflow.content_type,
            });
        }
        let item = self
            .items
            .get_mut(item_id)
            .ok_or_else(|| BoardError::UnknownItem(item_id.clone()))?;

        if item.status == new_status {
            return Ok(item.version);
        }

        let prior = item.status;
        item.status = new_status;
        item.version += 1;
        let version = item.version;
        self.journal.record(item_id.clone(), version, prior);

        self.record(TransitionRecord {
            item_id: item_id.clone(),
            from: Some(prior),
            to: new_status,
            trigger,
            version,
            at: Utc::now(),
        });
        debug!(
            item_id = %item_id,
            from = %prior,
            to = %new_status,
            version,
            trigger = ?trigger,
            "Optimistic status applied"
        );
        let _ = self.events.send(BoardEvent::StatusChanged {
            item_id: item_id.clone(),
            from: prior,
            to: new_status,
            version,
            trigger,
        });
        Ok(version)
    }

    /// Flags the journaled mutation as having an issued commit and pins
    /// its pre-image to `prior_status`, the status held before the gesture
    /// began. Rollback then targets that status, not an intermediate hover
    /// preview.
    pub fn stage_commit(&mut self, item_id: &ItemId, version: u64, prior_status: Status) {
        if !self.journal.stage(item_id, version, prior_status) {
            debug!(item_id = %item_id, version, "No journal entry to stage for commit");
        }
    }

    /// Discards the pending journal entry for a gesture that ended without
    /// issuing a commit (no-op drop or cancel). An entry whose commit is
    /// still in flight is left alone until its result settles.
    pub fn discard_pending(&mut self, item_id: &ItemId) {
        self.journal.discard_preview(item_id);
    }

    pub fn is_pending(&self, item_id: &ItemId) -> bool {
        self.journal.is_pending(item_id)
    }

    /// Settles an asynchronous commit result.
    ///
    /// A result whose version no longer matches the item's current version
    /// is stale (a newer optimistic edit superseded it) and is silently
    /// discarded with no state change. Otherwise success clears the
    /// pending entry; failure replays the journaled pre-image (itself a
    /// versioned mutation) and surfaces a persistence notification.
    pub fn resolve_commit(
        &mut self,
        item_id: &ItemId,
        version: u64,
        success: bool,
    ) -> CommitSettlement {
        let Some(item) = self.items.get_mut(item_id) else {
            debug!(item_id = %item_id, version, "Commit resolved for an item no longer on the board");
            return CommitSettlement::Stale;
        };
        if item.version != version {
            debug!(
                item_id = %item_id,
                resolved = version,
                current = item.version,
                "Discarding stale commit result"
            );
            return CommitSettlement::Stale;
        }

        let Some(entry) = self.journal.take(item_id) else {
            debug!(item_id = %item_id, version, "Commit resolved with no pending entry");
            return CommitSettlement::Stale;
        };

        if success {
            info!(item_id = %item_id, status = %item.status, version, "Status transition committed");
            let _ = self.events.send(BoardEvent::CommitSettled {
                item_id: item_id.clone(),
                status: item.status,
                version,
            });
            return CommitSettlement::Committed;
        }

        let attempted = item.status;
        item.status = entry.prior_status;
        item.version += 1;
        let rollback_version = item.version;

        warn!(
            item_id = %item_id,
            attempted = %attempted,
            reverted_to = %entry.prior_status,
            version = rollback_version,
            "Commit failed, rolled back optimistic transition"
        );
        self.record(TransitionRecord {
            item_id: item_id.clone(),
            from: Some(attempted),
            to: entry.prior_status,
            trigger: MutationTrigger::Rollback,
            version: rollback_version,
            at: Utc::now(),
        });
        let _ = self.events.send(BoardEvent::StatusChanged {
            item_id: item_id.clone(),
            from: attempted,
            to: entry.prior_status,
            version: rollback_version,
            trigger: MutationTrigger::Rollback,
        });
        CommitSettlement::RolledBack {
            attempted,
            reverted_to: entry.prior_status,
        }
    }

    /// Recent transition history, oldest first.
    pub fn history(&self) -> &[TransitionRecord] {
        &self.history
    }

    fn record(&mut self, record: TransitionRecord) {
        self.history.push(record);
        if self.history.len() > self.history_limit {
            let excess = self.history.len() - self.history_limit;
            self.history.drain(..excess);
        }
    }
}
