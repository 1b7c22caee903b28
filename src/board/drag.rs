use serde::Serialize;
use tracing::{debug, info};

use crate::board::commit::CommitRequest;
use crate::board::registry::Status;
use crate::board::resolver::{resolve_drop, DropResolution};
use crate::board::store::{BoardError, BoardStore, ItemId};
use crate::board::MutationTrigger;

/// Gesture phase of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DragPhase {
    Idle,
    Dragging,
    /// The last gesture's commit is still awaiting its result. A new drag
    /// on another item may start from this phase.
    Committing,
}

/// One live drag gesture. At most one exists at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DragSession {
    pub item_id: ItemId,
    /// Captured at drag start; the revert target for cancelled gestures.
    pub original_status: Status,
    /// Follows the pointer as it hovers columns and cards.
    pub preview_status: Status,
}

/// How a drop concluded.
#[derive(Debug, Clone, PartialEq)]
pub enum DropDisposition {
    /// The transition needs persisting; the caller drives the commit.
    Commit(CommitRequest),
    /// Net no-op: the item landed back on its original status. No commit
    /// call is issued and, absent hover previews, the version is untouched.
    Settled,
    /// Released on an unrecognized target; reverted to the original status.
    Cancelled,
}

/// Finite-state controller for one drag gesture: `Idle → Dragging` on
/// pick-up, live optimistic previews while hovering, and either a commit
/// hand-off, a silent settle, or a revert on release.
#[derive(Debug, Default)]
pub struct DragController {
    session: Option<DragSession>,
    in_flight: Option<(ItemId, u64)>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DragPhase {
        if self.session.is_some() {
            DragPhase::Dragging
        } else if self.in_flight.is_some() {
            DragPhase::Committing
        } else {
            DragPhase::Idle
        }
    }

    /// The active session, for drag-overlay rendering.
    pub fn current_preview(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Picks up an item. Rejected while another gesture is live; a pending
    /// commit on a previous item does not block a new drag.
    pub fn drag_start(&mut self, store: &BoardStore, item_id: ItemId) -> Result<(), BoardError> {
        if let Some(session) = &self.session {
            return Err(BoardError::DragAlreadyActive(session.item_id.clone()));
        }
        let original_status = store
            .status_of(&item_id)
            .ok_or_else(|| BoardError::UnknownItem(item_id.clone()))?;

        debug!(item_id = %item_id, status = %original_status, "Drag started");
        self.session = Some(DragSession {
            item_id,
            original_status,
            preview_status: original_status,
        });
        Ok(())
    }

    /// Pointer moved over a potential target. A recognized target updates
    /// the preview and applies it optimistically right away; the board
    /// follows the pointer, not just the final drop. Hovering something
    /// unrecognized leaves the board untouched.
    pub fn drag_over(
        &mut self,
        store: &mut BoardStore,
        target_id: &str,
    ) -> Result<Option<Status>, BoardError> {
        let session = self.session.as_mut().ok_or(BoardError::NoActiveDrag)?;

        let DropResolution::Status(status) = resolve_drop(store, target_id) else {
            return Ok(None);
        };
        session.preview_status = status;
        if store.status_of(&session.item_id) != Some(status) {
            let item_id = session.item_id.clone();
            store.apply_optimistic(&item_id, status, MutationTrigger::Preview)?;
        }
        Ok(Some(status))
    }

    /// Releases the item on a target. A resolved status different from the
    /// original yields a commit request; landing back home settles without
    /// any persistence call; an unrecognized target cancels the gesture.
    pub fn drop_on(
        &mut self,
        store: &mut BoardStore,
        target_id: &str,
    ) -> Result<DropDisposition, BoardError> {
        let session = self.session.take().ok_or(BoardError::NoActiveDrag)?;

        let resolved = match resolve_drop(store, target_id) {
            DropResolution::Status(status) => status,
            DropResolution::NoTransition => {
                self.revert(store, &session)?;
                debug!(item_id = %session.item_id, "Drop on unrecognized target, gesture cancelled");
                return Ok(DropDisposition::Cancelled);
            }
        };

        if resolved == session.original_status {
            // Undo any hover previews, then settle with zero commit calls.
            if store.status_of(&session.item_id) != Some(resolved) {
                store.apply_optimistic(&session.item_id, resolved, MutationTrigger::Revert)?;
            }
            store.discard_pending(&session.item_id);
            debug!(item_id = %session.item_id, status = %resolved, "No-op drop settled");
            return Ok(DropDisposition::Settled);
        }

        let version = if store.status_of(&session.item_id) == Some(resolved) {
            store
                .version_of(&session.item_id)
                .ok_or_else(|| BoardError::UnknownItem(session.item_id.clone()))?
        } else {
            store.apply_optimistic(&session.item_id, resolved, MutationTrigger::Drop)?
        };
        store.stage_commit(&session.item_id, version, session.original_status);
        self.in_flight = Some((session.item_id.clone(), version));

        info!(
            item_id = %session.item_id,
            from = %session.original_status,
            to = %resolved,
            version,
            "Drop resolved, committing transition"
        );
        Ok(DropDisposition::Commit(CommitRequest {
            item_id: session.item_id,
            content_type: store.workflow().content_type,
            new_status: resolved,
            version,
        }))
    }

    /// Aborts the gesture (released outside any droppable surface, or
    /// interrupted before the drop fired). Reverts synchronously; no commit
    /// was ever issued for preview-only updates.
    pub fn cancel(&mut self, store: &mut BoardStore) -> Result<(), BoardError> {
        let session = self.session.take().ok_or(BoardError::NoActiveDrag)?;
        self.revert(store, &session)?;
        debug!(item_id = %session.item_id, "Drag cancelled");
        Ok(())
    }

    /// Informs the controller that a commit result arrived, closing the
    /// `Committing` phase if it belongs to the last issued gesture.
    pub fn commit_resolved(&mut self, item_id: &ItemId, version: u64) {
        if let Some((pending_id, pending_version)) = &self.in_flight {
            if pending_id == item_id && *pending_version == version {
                self.in_flight = None;
            }
        }
    }

    fn revert(&self, store: &mut BoardStore, session: &DragSession) -> Result<(), BoardError> {
        if store.status_of(&session.item_id) != Some(session.original_status) {
            store.apply_optimistic(
                &session.item_id,
                session.original_status,
                MutationTrigger::Revert,
            )?;
        }
        store.discard_pending(&session.item_id);
        Ok(())
    }
}
