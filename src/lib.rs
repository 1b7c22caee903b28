// Planboard - Optimistic Workflow Board Core
// This exposes the board state machine for hosts and integration tests

pub mod board;
pub mod config;
pub mod feed;
pub mod telemetry;

// Re-export key types for easy access
pub use board::commit::{
    CommitOutcome, CommitRequest, CommitResolution, CommitService, PersistenceError,
    StatusPersistence,
};
pub use board::drag::{DragController, DragPhase, DragSession, DropDisposition};
pub use board::registry::{
    statuses_for, ColumnMeta, ContentType, Status, StatusWorkflow, CAMPAIGN_WORKFLOW,
    ROUTINE_WORKFLOW,
};
pub use board::resolver::{resolve_drop, DropResolution};
pub use board::store::{
    BoardError, BoardStore, CardFields, CommitSettlement, ItemId, WorkflowItem,
};
pub use board::{Board, BoardEvent, MutationTrigger, TransitionRecord};
pub use config::{config, init_config, PlanboardConfig};
pub use feed::{BoardCommand, BoardHandle, BoardRuntime, FeedError, FeedFilters, SnapshotFeed};
pub use telemetry::{generate_correlation_id, init_telemetry, shutdown_telemetry};
