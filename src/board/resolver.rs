use crate::board::registry::Status;
use crate::board::store::{BoardStore, ItemId};

/// Result of resolving a drop target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropResolution {
    /// The target names a column or an item; transitioning to this status.
    Status(Status),
    /// Unrecognized target (e.g. released outside any droppable surface).
    NoTransition,
}

/// Resolves a raw drop-target identifier to a target status.
///
/// First match wins: a column identifier of the active workflow beats an
/// item with the same identifier. Dropping onto another card adopts that
/// card's current status' column, never its list position.
pub fn resolve_drop(store: &BoardStore, target_id: &str) -> DropResolution {
    if let Some(status) = store.workflow().column_for_id(target_id) {
        return DropResolution::Status(status);
    }
    if let Some(status) = store.status_of(&ItemId::from(target_id)) {
        return DropResolution::Status(status);
    }
    DropResolution::NoTransition
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::registry::{ContentType, CAMPAIGN_WORKFLOW};
    use crate::board::store::{CardFields, WorkflowItem};
    use tokio::sync::broadcast;

    fn campaign_store(items: Vec<(&str, Status)>) -> BoardStore {
        let (tx, _rx) = broadcast::channel(16);
        let mut store = BoardStore::new(&CAMPAIGN_WORKFLOW, tx, 32);
        store.load(
            items
                .into_iter()
                .map(|(id, status)| WorkflowItem {
                    id: ItemId::from(id),
                    content_type: ContentType::Campaign,
                    status,
                    version: 0,
                    card: CardFields::default(),
                })
                .collect(),
        );
        store
    }

    #[test]
    fn column_identifier_resolves_to_its_status() {
        let store = campaign_store(vec![("a", Status::Production)]);
        assert_eq!(
            resolve_drop(&store, "production"),
            DropResolution::Status(Status::Production)
        );
    }

    #[test]
    fn item_identifier_adopts_that_items_current_status() {
        let store = campaign_store(vec![("a", Status::Production), ("b", Status::Done)]);
        assert_eq!(
            resolve_drop(&store, "b"),
            DropResolution::Status(Status::Done)
        );
    }

    #[test]
    fn column_match_wins_over_an_item_with_the_same_identifier() {
        // A card whose id collides with a column id defers to the column.
        let store = campaign_store(vec![("payment", Status::Production)]);
        assert_eq!(
            resolve_drop(&store, "payment"),
            DropResolution::Status(Status::Payment)
        );
    }

    #[test]
    fn foreign_workflow_column_does_not_resolve() {
        let store = campaign_store(vec![("a", Status::Production)]);
        assert_eq!(resolve_drop(&store, "plan"), DropResolution::NoTransition);
    }

    #[test]
    fn unrecognized_target_yields_no_transition() {
        let store = campaign_store(vec![("a", Status::Production)]);
        assert_eq!(
            resolve_drop(&store, "somewhere-else"),
            DropResolution::NoTransition
        );
    }
}
