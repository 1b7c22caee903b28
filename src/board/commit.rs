use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::board::registry::{ContentType, Status};
use crate::board::store::ItemId;

#[cfg(test)]
use mockall::automock;

/// Failure reported by the persistence collaborator. The only error class
/// surfaced to the user; everything else the core swallows.
#[derive(Debug, Clone, Error)]
pub enum PersistenceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("rejected by backend: {0}")]
    Rejected(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// External persistence collaborator. Invoked exactly once per resolved
/// transition.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StatusPersistence: Send + Sync {
    async fn persist_status(
        &self,
        item_id: &ItemId,
        content_type: ContentType,
        new_status: Status,
    ) -> Result<(), PersistenceError>;
}

/// A resolved transition awaiting persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRequest {
    pub item_id: ItemId,
    pub content_type: ContentType,
    pub new_status: Status,
    /// Version of the optimistic apply this commit belongs to; the store
    /// uses it to discard results superseded by a newer edit.
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Success,
    Failure { reason: String },
}

/// Result of one commit attempt, correlated back to the store by item and
/// version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitResolution {
    pub item_id: ItemId,
    pub version: u64,
    pub outcome: CommitOutcome,
    pub resolved_at: DateTime<Utc>,
}

/// Issues persist requests for resolved transitions. Single attempt, no
/// automatic retry and no timeout: a failed transition requires the user
/// to re-attempt the drag.
#[derive(Clone)]
pub struct CommitService {
    backend: Arc<dyn StatusPersistence>,
}

impl std::fmt::Debug for CommitService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitService").finish_non_exhaustive()
    }
}

impl CommitService {
    pub fn new(backend: Arc<dyn StatusPersistence>) -> Self {
        Self { backend }
    }

    /// Persists one resolved transition and maps the result to an outcome.
    pub async fn commit(&self, request: CommitRequest) -> CommitResolution {
        let outcome = match self
            .backend
            .persist_status(&request.item_id, request.content_type, request.new_status)
            .await
        {
            Ok(()) => {
                info!(
                    item_id = %request.item_id,
                    status = %request.new_status,
                    version = request.version,
                    "Status transition persisted"
                );
                CommitOutcome::Success
            }
            Err(err) => {
                warn!(
                    item_id = %request.item_id,
                    status = %request.new_status,
                    version = request.version,
                    error = %err,
                    "Status transition persist failed"
                );
                CommitOutcome::Failure {
                    reason: err.to_string(),
                }
            }
        };

        CommitResolution {
            item_id: request.item_id,
            version: request.version,
            outcome,
            resolved_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    fn request() -> CommitRequest {
        CommitRequest {
            item_id: ItemId::from("launch-video"),
            content_type: ContentType::Campaign,
            new_status: Status::Production,
            version: 3,
        }
    }

    #[tokio::test]
    async fn commit_issues_exactly_one_persist_call() {
        let mut backend = MockStatusPersistence::new();
        backend
            .expect_persist_status()
            .with(
                eq(ItemId::from("launch-video")),
                eq(ContentType::Campaign),
                eq(Status::Production),
            )
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = CommitService::new(Arc::new(backend));
        let resolution = service.commit(request()).await;
        assert_eq!(resolution.outcome, CommitOutcome::Success);
        assert_eq!(resolution.version, 3);
    }

    #[tokio::test]
    async fn backend_error_maps_to_failure_with_reason() {
        let mut backend = MockStatusPersistence::new();
        backend
            .expect_persist_status()
            .times(1)
            .returning(|_, _, _| Err(PersistenceError::Network("connection reset".into())));

        let service = CommitService::new(Arc::new(backend));
        let resolution = service.commit(request()).await;
        let CommitOutcome::Failure { reason } = resolution.outcome else {
            panic!("expected failure outcome");
        };
        assert!(reason.contains("connection reset"));
    }
}
