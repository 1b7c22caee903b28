//! The board core: registry, store, resolver, drag controller, and commit
//! service, assembled behind a single `Board` facade parameterized by a
//! `StatusWorkflow`: one state machine serves both the campaign and the
//! routine board.

pub mod commit;
pub mod drag;
pub mod journal;
pub mod registry;
pub mod resolver;
pub mod store;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::board::commit::{
    CommitOutcome, CommitRequest, CommitResolution, CommitService, StatusPersistence,
};
use crate::board::drag::{DragController, DragPhase, DragSession, DropDisposition};
use crate::board::registry::{statuses_for, ColumnMeta, ContentType, Status};
use crate::board::store::{BoardError, BoardStore, CommitSettlement, ItemId, WorkflowItem};

/// What caused a status mutation. Recorded in history and change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationTrigger {
    /// Live preview while the pointer hovers a target mid-drag.
    Preview,
    /// Final apply at drop time, paired with a commit.
    Drop,
    /// Revert to the original status for a cancelled or no-op gesture.
    Revert,
    /// Compensation replay after a failed commit.
    Rollback,
    /// Externally-synced mutation delivered by a feed snapshot.
    FeedSync,
}

/// One entry of the board's transition audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionRecord {
    pub item_id: ItemId,
    pub from: Option<Status>,
    pub to: Status,
    pub trigger: MutationTrigger,
    pub version: u64,
    pub at: DateTime<Utc>,
}

/// Change notifications for the render layer, plus the one user-visible
/// failure class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    SnapshotLoaded {
        count: usize,
    },
    StatusChanged {
        item_id: ItemId,
        from: Status,
        to: Status,
        version: u64,
        trigger: MutationTrigger,
    },
    CommitSettled {
        item_id: ItemId,
        status: Status,
        version: u64,
    },
    /// Persistence rejected or failed a transition. The board has already
    /// rolled back; the host renders this as a notification.
    PersistFailed {
        item_id: ItemId,
        attempted: Status,
        reason: String,
        at: DateTime<Utc>,
    },
}

/// One drag-and-drop workflow board: the in-memory store, the single drag
/// session, and the commit path to the persistence collaborator.
#[derive(Debug)]
pub struct Board {
    store: BoardStore,
    controller: DragController,
    commits: CommitService,
    events: broadcast::Sender<BoardEvent>,
}

impl Board {
    pub fn new(content_type: ContentType, backend: Arc<dyn StatusPersistence>) -> Self {
        let config = crate::config::config()
            .map(|c| c.board.clone())
            .unwrap_or_default();
        Self::with_tuning(content_type, backend, &config)
    }

    pub fn with_tuning(
        content_type: ContentType,
        backend: Arc<dyn StatusPersistence>,
        tuning: &crate::config::BoardTuning,
    ) -> Self {
        let (events, _) = broadcast::channel(tuning.event_capacity);
        Self {
            store: BoardStore::new(statuses_for(content_type), events.clone(), tuning.history_limit),
            controller: DragController::new(),
            commits: CommitService::new(backend),
            events,
        }
    }

    pub fn content_type(&self) -> ContentType {
        self.store.workflow().content_type
    }

    /// Columns to render, in workflow order.
    pub fn columns(&self) -> &'static [ColumnMeta] {
        self.store.workflow().columns
    }

    /// Subscribes to change notifications for re-render triggers.
    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    /// Applies a fresh snapshot from the external feed.
    pub fn load(&mut self, snapshot: Vec<WorkflowItem>) {
        self.store.load(snapshot);
    }

    pub fn items_by_status(&self, status: Status) -> Vec<&WorkflowItem> {
        self.store.items_by_status(status)
    }

    pub fn item(&self, item_id: &ItemId) -> Option<&WorkflowItem> {
        self.store.get(item_id)
    }

    pub fn history(&self) -> &[TransitionRecord] {
        self.store.history()
    }

    pub fn phase(&self) -> DragPhase {
        self.controller.phase()
    }

    /// The live drag session, for overlay rendering.
    pub fn current_preview(&self) -> Option<&DragSession> {
        self.controller.current_preview()
    }

    pub fn drag_start(&mut self, item_id: ItemId) -> Result<(), BoardError> {
        self.controller.drag_start(&self.store, item_id)
    }

    pub fn drag_over(&mut self, target_id: &str) -> Result<Option<Status>, BoardError> {
        self.controller.drag_over(&mut self.store, target_id)
    }

    /// Releases the dragged item. Returns the commit request to drive when
    /// the transition needs persisting; `None` for no-op and cancelled
    /// gestures, which never touch the network.
    pub fn drop_on(&mut self, target_id: &str) -> Result<Option<CommitRequest>, BoardError> {
        match self.controller.drop_on(&mut self.store, target_id)? {
            DropDisposition::Commit(request) => Ok(Some(request)),
            DropDisposition::Settled | DropDisposition::Cancelled => Ok(None),
        }
    }

    /// Cancels the live gesture (pointer released outside the board).
    pub fn drag_cancel(&mut self) -> Result<(), BoardError> {
        self.controller.cancel(&mut self.store)
    }

    /// Spawns the single-attempt persist call for a drop's commit request.
    /// The caller awaits the handle and feeds the resolution back through
    /// `resolve_commit`.
    pub fn submit(&self, request: CommitRequest) -> JoinHandle<CommitResolution> {
        let service = self.commits.clone();
        tokio::spawn(async move { service.commit(request).await })
    }

    /// Awaits the persist call inline. Useful to hosts that drive commits
    /// on their own tasks.
    pub async fn commit(&self, request: CommitRequest) -> CommitResolution {
        self.commits.commit(request).await
    }

    /// Settles a commit result against the store: stale results are
    /// discarded, successes clear the pending entry, failures roll back
    /// and surface a `PersistFailed` notification.
    pub fn resolve_commit(&mut self, resolution: CommitResolution) {
        let CommitResolution {
            item_id,
            version,
            outcome,
            ..
        } = resolution;

        let (success, reason) = match outcome {
            CommitOutcome::Success => (true, None),
            CommitOutcome::Failure { reason } => (false, Some(reason)),
        };
        let settlement = self.store.resolve_commit(&item_id, version, success);

        if let CommitSettlement::RolledBack { attempted, .. } = settlement {
            let _ = self.events.send(BoardEvent::PersistFailed {
                item_id: item_id.clone(),
                attempted,
                reason: reason.unwrap_or_else(|| "persist failed".to_string()),
                at: Utc::now(),
            });
        }
        self.controller.commit_resolved(&item_id, version);
    }
}
