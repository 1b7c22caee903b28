//! Seam to the reactive persistence/query collaborator and the cooperative
//! event loop driving a board from it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::board::commit::CommitResolution;
use crate::board::registry::{ContentType, Status};
use crate::board::store::{ItemId, WorkflowItem};
use crate::board::Board;
use crate::config::FeedConfig;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed unavailable: {0}")]
    Unavailable(String),

    #[error("board runtime stopped")]
    RuntimeStopped,
}

/// Filters the feed applies server-side before delivering snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedFilters {
    pub platform: Option<String>,
    pub search: Option<String>,
}

/// Reactive snapshot source. Delivers fresh item lists at its own pace;
/// every delivery replaces the board's snapshot via `Board::load`.
#[async_trait]
pub trait SnapshotFeed: Send + Sync {
    async fn subscribe(
        &self,
        content_type: ContentType,
        filters: FeedFilters,
    ) -> Result<mpsc::Receiver<Vec<WorkflowItem>>, FeedError>;
}

/// Commands a host sends into the runtime loop.
#[derive(Debug)]
pub enum BoardCommand {
    DragStart(ItemId),
    DragOver(String),
    Drop(String),
    Cancel,
    Column {
        status: Status,
        reply: oneshot::Sender<Vec<WorkflowItem>>,
    },
}

/// Cloneable command-side handle to a running board loop.
#[derive(Debug, Clone)]
pub struct BoardHandle {
    commands: mpsc::Sender<BoardCommand>,
}

impl BoardHandle {
    pub async fn drag_start(&self, item_id: ItemId) -> Result<(), FeedError> {
        self.send(BoardCommand::DragStart(item_id)).await
    }

    pub async fn drag_over(&self, target_id: impl Into<String>) -> Result<(), FeedError> {
        self.send(BoardCommand::DragOver(target_id.into())).await
    }

    pub async fn drop_on(&self, target_id: impl Into<String>) -> Result<(), FeedError> {
        self.send(BoardCommand::Drop(target_id.into())).await
    }

    pub async fn cancel(&self) -> Result<(), FeedError> {
        self.send(BoardCommand::Cancel).await
    }

    /// Snapshot of one column's items, in feed order.
    pub async fn column(&self, status: Status) -> Result<Vec<WorkflowItem>, FeedError> {
        let (reply, rx) = oneshot::channel();
        self.send(BoardCommand::Column { status, reply }).await?;
        rx.await.map_err(|_| FeedError::RuntimeStopped)
    }

    async fn send(&self, command: BoardCommand) -> Result<(), FeedError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| FeedError::RuntimeStopped)
    }
}

/// Single-threaded cooperative event loop: board commands, feed
/// snapshots, and commit resolutions are applied one at a time, so store
/// mutations never interleave.
pub struct BoardRuntime {
    board: Board,
    commands: mpsc::Receiver<BoardCommand>,
    snapshots: mpsc::Receiver<Vec<WorkflowItem>>,
    resolutions_tx: mpsc::Sender<CommitResolution>,
    resolutions_rx: mpsc::Receiver<CommitResolution>,
}

impl BoardRuntime {
    /// Subscribes to the feed and wires up the loop. The returned handle
    /// is the sole way in; dropping every handle stops the loop.
    pub async fn start(
        board: Board,
        feed: &dyn SnapshotFeed,
        filters: FeedFilters,
    ) -> Result<(Self, BoardHandle), FeedError> {
        let tuning = crate::config::config()
            .map(|c| c.feed.clone())
            .unwrap_or_else(|_| FeedConfig::default());

        let snapshots = feed.subscribe(board.content_type(), filters).await?;
        let (commands_tx, commands_rx) = mpsc::channel(tuning.command_capacity);
        let (resolutions_tx, resolutions_rx) = mpsc::channel(tuning.command_capacity);

        Ok((
            Self {
                board,
                commands: commands_rx,
                snapshots,
                resolutions_tx,
                resolutions_rx,
            },
            BoardHandle {
                commands: commands_tx,
            },
        ))
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Runs until every command handle is dropped.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(command) => self.handle_command(command),
                        None => {
                            debug!("Board command channel closed, stopping runtime");
                            break;
                        }
                    }
                }
                Some(snapshot) = self.snapshots.recv() => {
                    self.board.load(snapshot);
                }
                Some(resolution) = self.resolutions_rx.recv() => {
                    self.board.resolve_commit(resolution);
                }
            }
        }
    }

    fn handle_command(&mut self, command: BoardCommand) {
        match command {
            BoardCommand::DragStart(item_id) => {
                if let Err(err) = self.board.drag_start(item_id) {
                    warn!(error = %err, "Rejected drag start");
                }
            }
            BoardCommand::DragOver(target_id) => {
                if let Err(err) = self.board.drag_over(&target_id) {
                    warn!(error = %err, target = %target_id, "Rejected drag over");
                }
            }
            BoardCommand::Drop(target_id) => match self.board.drop_on(&target_id) {
                Ok(Some(request)) => {
                    let handle = self.board.submit(request);
                    let resolutions = self.resolutions_tx.clone();
                    tokio::spawn(async move {
                        if let Ok(resolution) = handle.await {
                            let _ = resolutions.send(resolution).await;
                        }
                    });
                }
                Ok(None) => {}
                Err(err) => warn!(error = %err, target = %target_id, "Rejected drop"),
            },
            BoardCommand::Cancel => {
                if let Err(err) = self.board.drag_cancel() {
                    warn!(error = %err, "Rejected drag cancel");
                }
            }
            BoardCommand::Column { status, reply } => {
                let items = self
                    .board
                    .items_by_status(status)
                    .into_iter()
                    .cloned()
                    .collect();
                let _ = reply.send(items);
            }
        }
    }
}
