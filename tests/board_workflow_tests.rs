//! Tests for the board drag/commit workflow (src/board).
//! Testing library/framework: Rust built-in test framework with Tokio async runtime (#[tokio::test]).
//! The persistence collaborator is a hand-rolled recording fake so commit
//! outcomes can be scripted per test.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use planboard::{
    Board, BoardEvent, CardFields, CommitOutcome, CommitResolution, ContentType, DragPhase,
    ItemId, MutationTrigger, PersistenceError, Status, StatusPersistence, WorkflowItem,
};
use tokio::sync::broadcast;
use tokio_test::assert_ok;

#[derive(Default)]
struct RecordingBackend {
    calls: Mutex<Vec<(ItemId, ContentType, Status)>>,
    fail_with: Mutex<Option<String>>,
}

impl RecordingBackend {
    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn fail_next(&self, reason: &str) {
        *self.fail_with.lock().unwrap() = Some(reason.to_string());
    }
}

#[async_trait]
impl StatusPersistence for RecordingBackend {
    async fn persist_status(
        &self,
        item_id: &ItemId,
        content_type: ContentType,
        new_status: Status,
    ) -> Result<(), PersistenceError> {
        self.calls
            .lock()
            .unwrap()
            .push((item_id.clone(), content_type, new_status));
        match self.fail_with.lock().unwrap().take() {
            Some(reason) => Err(PersistenceError::Rejected(reason)),
            None => Ok(()),
        }
    }
}

fn item(id: &str, content_type: ContentType, status: Status, title: &str) -> WorkflowItem {
    WorkflowItem {
        id: ItemId::from(id),
        content_type,
        status,
        version: 0,
        card: CardFields {
            title: title.to_string(),
            platform: None,
            extra: serde_json::Value::Null,
        },
    }
}

fn drain(events: &mut broadcast::Receiver<BoardEvent>) -> Vec<BoardEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

#[tokio::test]
async fn noop_drop_issues_no_commit_and_keeps_version() {
    let backend = Arc::new(RecordingBackend::default());
    let mut board = Board::new(ContentType::Routine, backend.clone());
    board.load(vec![item("a", ContentType::Routine, Status::Plan, "Weekly vlog")]);

    tokio_test::assert_ok!(board.drag_start(ItemId::from("a")));
    let request = tokio_test::assert_ok!(board.drop_on("plan"));

    assert!(request.is_none());
    assert_eq!(backend.call_count(), 0);
    let a = board.item(&ItemId::from("a")).unwrap();
    assert_eq!(a.status, Status::Plan);
    assert_eq!(a.version, 0);
    assert_eq!(board.phase(), DragPhase::Idle);
}

#[tokio::test]
async fn failed_commit_rolls_back_to_exact_prior_status() {
    let backend = Arc::new(RecordingBackend::default());
    backend.fail_next("schedule slot already taken");
    let mut board = Board::new(ContentType::Routine, backend.clone());
    board.load(vec![item("x", ContentType::Routine, Status::Plan, "Short")]);
    let mut events = board.subscribe();

    board.drag_start(ItemId::from("x")).expect("drag start");
    board.drag_over("scheduled").expect("drag over");
    let request = board.drop_on("scheduled").expect("drop").expect("commit request");

    // Optimistically on the new column before the round-trip resolves.
    assert_eq!(board.item(&ItemId::from("x")).unwrap().status, Status::Scheduled);

    let resolution = board.commit(request).await;
    assert!(matches!(resolution.outcome, CommitOutcome::Failure { .. }));
    board.resolve_commit(resolution);

    assert_eq!(board.item(&ItemId::from("x")).unwrap().status, Status::Plan);
    assert_eq!(backend.call_count(), 1);

    let seen = drain(&mut events);
    let rollbacks = seen
        .iter()
        .filter(|e| {
            matches!(
                e,
                BoardEvent::StatusChanged {
                    trigger: MutationTrigger::Rollback,
                    ..
                }
            )
        })
        .count();
    assert_eq!(rollbacks, 1, "exactly one rollback mutation");
    assert!(
        seen.iter().any(|e| matches!(
            e,
            BoardEvent::PersistFailed { attempted: Status::Scheduled, .. }
        )),
        "persistence failure surfaces as a notification"
    );
}

#[tokio::test]
async fn regrab_and_replace_does_not_lose_the_rollback_target() {
    let backend = Arc::new(RecordingBackend::default());
    backend.fail_next("schedule slot already taken");
    let mut board = Board::new(ContentType::Routine, backend.clone());
    board.load(vec![item("x", ContentType::Routine, Status::Plan, "Short")]);
    let mut events = board.subscribe();

    board.drag_start(ItemId::from("x")).expect("drag start");
    let request = board.drop_on("scheduled").expect("drop").expect("commit request");

    // The user picks the card up again while the commit is outstanding
    // and releases it back onto the column it already occupies.
    board.drag_start(ItemId::from("x")).expect("second drag");
    assert!(board.drop_on("scheduled").expect("drop").is_none());
    assert_eq!(backend.call_count(), 0);

    let resolution = board.commit(request).await;
    assert!(matches!(resolution.outcome, CommitOutcome::Failure { .. }));
    board.resolve_commit(resolution);

    assert_eq!(board.item(&ItemId::from("x")).unwrap().status, Status::Plan);
    let seen = drain(&mut events);
    assert!(
        seen.iter().any(|e| matches!(
            e,
            BoardEvent::PersistFailed { attempted: Status::Scheduled, .. }
        )),
        "the rejected transition still surfaces a failure notification"
    );
}

#[tokio::test]
async fn rollback_after_multi_column_hover_returns_to_the_pre_drag_status() {
    let backend = Arc::new(RecordingBackend::default());
    backend.fail_next("publish window closed");
    let mut board = Board::new(ContentType::Routine, backend.clone());
    board.load(vec![item("x", ContentType::Routine, Status::Plan, "Recap")]);

    board.drag_start(ItemId::from("x")).expect("drag start");
    board.drag_over("scheduled").expect("hover");
    board.drag_over("published").expect("hover");
    let request = board.drop_on("published").expect("drop").expect("commit request");

    let resolution = board.commit(request).await;
    board.resolve_commit(resolution);

    // Not the intermediate hover status; the status held before the drag.
    assert_eq!(board.item(&ItemId::from("x")).unwrap().status, Status::Plan);
}

#[tokio::test]
async fn drop_onto_card_adopts_its_column() {
    let backend = Arc::new(RecordingBackend::default());
    let mut board = Board::new(ContentType::Campaign, backend.clone());
    board.load(vec![
        item("card-a", ContentType::Campaign, Status::Production, "Unboxing"),
        item("card-b", ContentType::Campaign, Status::Done, "Retro"),
    ]);

    board.drag_start(ItemId::from("card-a")).expect("drag start");
    let request = board.drop_on("card-b").expect("drop").expect("commit request");

    assert_eq!(request.new_status, Status::Done);
    assert_eq!(
        board.item(&ItemId::from("card-a")).unwrap().status,
        Status::Done
    );

    let resolution = board.commit(request).await;
    assert_eq!(resolution.outcome, CommitOutcome::Success);
    board.resolve_commit(resolution);
    assert_eq!(
        board.item(&ItemId::from("card-a")).unwrap().status,
        Status::Done
    );
}

#[tokio::test]
async fn stale_result_is_discarded_whatever_its_outcome() {
    for first_commit_succeeds in [true, false] {
        let backend = Arc::new(RecordingBackend::default());
        let mut board = Board::new(ContentType::Routine, backend.clone());
        board.load(vec![item("x", ContentType::Routine, Status::Plan, "Devlog")]);
        let id = ItemId::from("x");

        board.drag_start(id.clone()).expect("first drag");
        let first = board.drop_on("scheduled").expect("drop").expect("commit request");

        // Second drag on the same item before the first commit resolves.
        board.drag_start(id.clone()).expect("second drag");
        let second = board.drop_on("published").expect("drop").expect("commit request");
        assert!(second.version > first.version);

        // The first commit resolves late; its outcome no longer matters.
        board.resolve_commit(CommitResolution {
            item_id: id.clone(),
            version: first.version,
            outcome: if first_commit_succeeds {
                CommitOutcome::Success
            } else {
                CommitOutcome::Failure {
                    reason: "too late".to_string(),
                }
            },
            resolved_at: Utc::now(),
        });

        let x = board.item(&id).unwrap();
        assert_eq!(x.status, Status::Published);
        assert_eq!(x.version, second.version);

        // The second commit settles normally.
        board.resolve_commit(CommitResolution {
            item_id: id.clone(),
            version: second.version,
            outcome: CommitOutcome::Success,
            resolved_at: Utc::now(),
        });
        assert_eq!(board.item(&id).unwrap().status, Status::Published);
    }
}

#[tokio::test]
async fn cancel_outside_reverts_with_zero_commits() {
    let backend = Arc::new(RecordingBackend::default());
    let mut board = Board::new(ContentType::Routine, backend.clone());
    board.load(vec![item("x", ContentType::Routine, Status::InProgress, "Recap")]);

    tokio_test::assert_ok!(board.drag_start(ItemId::from("x")));
    tokio_test::assert_ok!(board.drag_over("published"));
    assert_eq!(
        board.item(&ItemId::from("x")).unwrap().status,
        Status::Published
    );

    let request = board.drop_on("not-a-column-or-card").expect("drop");
    assert!(request.is_none());
    assert_eq!(backend.call_count(), 0);
    assert_eq!(
        board.item(&ItemId::from("x")).unwrap().status,
        Status::InProgress
    );
}

#[tokio::test]
async fn launch_video_drag_end_to_end() {
    let backend = Arc::new(RecordingBackend::default());
    let mut board = Board::new(ContentType::Campaign, backend.clone());
    board.load(vec![item(
        "launch-video",
        ContentType::Campaign,
        Status::ProductObtained,
        "Launch Video",
    )]);
    let mut events = board.subscribe();

    board.drag_start(ItemId::from("launch-video")).expect("drag start");
    board.drag_over("production").expect("drag over");

    // Board shows the card under "production" before any network round-trip.
    let production: Vec<&str> = board
        .items_by_status(Status::Production)
        .iter()
        .map(|i| i.card.title.as_str())
        .collect();
    assert_eq!(production, vec!["Launch Video"]);
    assert_eq!(backend.call_count(), 0);

    let request = board.drop_on("production").expect("drop").expect("commit request");
    let resolution = board.commit(request).await;
    assert_eq!(resolution.outcome, CommitOutcome::Success);
    board.resolve_commit(resolution);

    // Final state: still in production, no failure notification, one call.
    assert_eq!(
        board.item(&ItemId::from("launch-video")).unwrap().status,
        Status::Production
    );
    assert_eq!(backend.call_count(), 1);
    let seen = drain(&mut events);
    assert!(!seen
        .iter()
        .any(|e| matches!(e, BoardEvent::PersistFailed { .. })));
    assert!(seen
        .iter()
        .any(|e| matches!(e, BoardEvent::CommitSettled { .. })));
}
