//! End-to-end admin workflows against the in-memory adapters.
//!
//! Each test wires a Store, its controllers, and the fakes the way an admin
//! page would, then checks both the local state and what reached the
//! "database".

use serde_json::json;
use std::sync::Arc;

use sitecraft_cms::adapters::{
    GatewayOp, InMemoryChangeFeed, InMemoryCollectionGateway, NotificationCenter,
};
use sitecraft_cms::application::{
    BulkAction, BulkRequest, BulkSelectionController, DragReorderController, DropOutcome,
    LiveRefresh, OrderedCollectionStore,
};
use sitecraft_cms::domain::collection::{CollectionError, CollectionKind, PayloadPatch, Scope};
use sitecraft_cms::domain::foundation::{EntityId, PublicationStatus};
use sitecraft_cms::domain::selection::{SelectionState, ViewQuery};
use sitecraft_cms::ports::NotificationLevel;

// =============================================================================
// Helpers
// =============================================================================

fn payload(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    value.as_object().cloned().unwrap()
}

fn titles(store: &OrderedCollectionStore) -> Vec<String> {
    store.entities().iter().map(|e| e.label()).collect()
}

fn orders(store: &OrderedCollectionStore) -> Vec<i32> {
    store.entities().iter().map(|e| e.order()).collect()
}

fn remote_orders(gateway: &InMemoryCollectionGateway, scope: &Scope) -> Vec<(String, i32)> {
    gateway
        .rows(scope)
        .iter()
        .map(|e| (e.label(), e.order()))
        .collect()
}

async fn store_with(
    gateway: &Arc<InMemoryCollectionGateway>,
    scope: Scope,
    labels: &[&str],
) -> (OrderedCollectionStore, Vec<EntityId>) {
    let base = scope.base_index();
    let ids = labels
        .iter()
        .enumerate()
        .map(|(i, label)| gateway.seed(&scope, base + i as i32, json!({ "title": label })))
        .collect();
    let store = OrderedCollectionStore::new(gateway.clone(), scope);
    store.load().await.unwrap();
    (store, ids)
}

// =============================================================================
// Ordered collection Store
// =============================================================================

#[tokio::test]
async fn reorder_persists_dense_one_based_step_numbers() {
    let gateway = Arc::new(InMemoryCollectionGateway::new());
    let scope = Scope::root(CollectionKind::ProcessSteps);
    let (store, ids) = store_with(&gateway, scope.clone(), &["Survey", "Design", "Permit", "Build"]).await;

    store.reorder(&ids[3], 1).await.unwrap();

    assert_eq!(titles(&store), vec!["Survey", "Build", "Design", "Permit"]);
    assert_eq!(orders(&store), vec![1, 2, 3, 4]);
    assert_eq!(
        remote_orders(&gateway, &scope),
        vec![
            ("Survey".to_string(), 1),
            ("Build".to_string(), 2),
            ("Design".to_string(), 3),
            ("Permit".to_string(), 4)
        ]
    );
}

#[tokio::test]
async fn append_then_remove_keeps_sequence_dense() {
    let gateway = Arc::new(InMemoryCollectionGateway::new());
    let scope = Scope::root(CollectionKind::Services);
    let (store, ids) = store_with(&gateway, scope.clone(), &["Roofing", "Paving"]).await;

    let added = store
        .append(payload(json!({"title": "Demolition"})))
        .await
        .unwrap();
    assert_eq!(added.order(), 2);
    assert_eq!(added.status(), Some(PublicationStatus::Draft));

    store.remove(&ids[0]).await.unwrap();

    assert_eq!(titles(&store), vec!["Paving", "Demolition"]);
    assert_eq!(orders(&store), vec![0, 1]);
    assert_eq!(
        remote_orders(&gateway, &scope),
        vec![("Paving".to_string(), 0), ("Demolition".to_string(), 1)]
    );
}

#[tokio::test]
async fn appended_entity_keeps_its_creation_time_across_reload() {
    let gateway = Arc::new(InMemoryCollectionGateway::new());
    let (store, _) = store_with(&gateway, Scope::root(CollectionKind::Projects), &["Harbor"]).await;

    let added = store.append(payload(json!({"title": "Depot"}))).await.unwrap();
    store.reload().await.unwrap();

    let reloaded = store.get(added.id()).unwrap();
    assert_eq!(reloaded.created_at(), added.created_at());
    assert_eq!(titles(&store), vec!["Harbor", "Depot"]);
}

#[tokio::test]
async fn failed_insert_adds_no_phantom_row() {
    let gateway = Arc::new(InMemoryCollectionGateway::new());
    let (store, _) = store_with(&gateway, Scope::root(CollectionKind::Projects), &["Harbor"]).await;
    gateway.fail(GatewayOp::Insert);

    let result = store.append(payload(json!({"title": "Depot"}))).await;

    assert!(matches!(result, Err(CollectionError::Persist { .. })));
    assert_eq!(titles(&store), vec!["Harbor"]);
}

#[tokio::test]
async fn unreachable_backend_is_a_load_error() {
    let gateway = Arc::new(InMemoryCollectionGateway::new());
    gateway.fail(GatewayOp::Fetch);
    let store = OrderedCollectionStore::new(gateway.clone(), Scope::root(CollectionKind::Projects));

    assert!(matches!(store.load().await, Err(CollectionError::Load(_))));

    gateway.heal();
    assert!(store.load().await.unwrap().is_empty());
}

#[tokio::test]
async fn navigation_children_are_ordered_independently() {
    let gateway = Arc::new(InMemoryCollectionGateway::new());
    let root = Scope::root(CollectionKind::Navigation);
    let about = gateway.seed(&root, 0, json!({"label": "About", "href": "/about"}));
    gateway.seed(&root, 1, json!({"label": "Contact", "href": "/contact"}));

    let children = Scope::children_of(CollectionKind::Navigation, about).unwrap();
    let child_store = OrderedCollectionStore::new(gateway.clone(), children.clone());
    child_store.load().await.unwrap();
    child_store
        .append(payload(json!({"label": "Team", "href": "/about/team"})))
        .await
        .unwrap();
    let history = child_store
        .append(payload(json!({"label": "History", "href": "/about/history"})))
        .await
        .unwrap();

    child_store.reorder(history.id(), 0).await.unwrap();

    assert_eq!(titles(&child_store), vec!["History", "Team"]);
    assert_eq!(
        remote_orders(&gateway, &root),
        vec![("About".to_string(), 0), ("Contact".to_string(), 1)]
    );
}

#[tokio::test]
async fn rejected_status_patch_never_reaches_backend() {
    let gateway = Arc::new(InMemoryCollectionGateway::new());
    let (store, ids) = store_with(&gateway, Scope::root(CollectionKind::LeadershipTeam), &["Dana"]).await;
    let calls = gateway.calls(GatewayOp::UpdateFields);

    let result = store
        .update(&ids[0], PayloadPatch::status_only(PublicationStatus::Published))
        .await;

    assert!(matches!(result, Err(CollectionError::Validation(_))));
    assert_eq!(gateway.calls(GatewayOp::UpdateFields), calls);
}

#[tokio::test]
async fn compact_repairs_order_after_failed_renumber() {
    let gateway = Arc::new(InMemoryCollectionGateway::new());
    let scope = Scope::root(CollectionKind::LeadershipTeam);
    let (store, ids) = store_with(&gateway, scope.clone(), &["Ana", "Ben", "Cleo"]).await;

    gateway.fail(GatewayOp::OrderBatch);
    let outcome = store.remove(&ids[0]).await.unwrap();
    assert!(outcome.order_repair_pending);
    assert_eq!(
        remote_orders(&gateway, &scope),
        vec![("Ben".to_string(), 1), ("Cleo".to_string(), 2)]
    );

    gateway.heal();
    store.reload().await.unwrap();
    assert!(store.needs_compaction());
    store.compact().await.unwrap();

    assert_eq!(
        remote_orders(&gateway, &scope),
        vec![("Ben".to_string(), 0), ("Cleo".to_string(), 1)]
    );
}

#[tokio::test]
async fn closed_store_refuses_further_operations() {
    let gateway = Arc::new(InMemoryCollectionGateway::new());
    let (store, ids) = store_with(&gateway, Scope::root(CollectionKind::Services), &["A", "B"]).await;
    let before = store.entities();

    store.close();

    assert!(matches!(store.remove(&ids[0]).await, Err(CollectionError::Detached)));
    assert!(matches!(store.load().await, Err(CollectionError::Detached)));
    assert_eq!(store.entities(), before);
}

// =============================================================================
// Drag reorder
// =============================================================================

#[tokio::test]
async fn failed_drop_notifies_and_leaves_backend_untouched() {
    let gateway = Arc::new(InMemoryCollectionGateway::new());
    let scope = Scope::root(CollectionKind::Services);
    let (store, ids) = store_with(&gateway, scope.clone(), &["Roofing", "Paving", "Framing"]).await;
    let center = Arc::new(NotificationCenter::new());
    let mut drag = DragReorderController::new(store.clone(), center.clone(), 5);

    gateway.fail_for(&ids[1]);
    drag.press(&ids[0], 10, 10).unwrap();
    assert!(drag.pointer_moved(10, 40));
    drag.drag_over(Some(&ids[2]));
    let result = drag.drop().await;

    assert!(result.is_err());
    assert_eq!(titles(&store), vec!["Roofing", "Paving", "Framing"]);
    assert_eq!(
        remote_orders(&gateway, &scope),
        vec![
            ("Roofing".to_string(), 0),
            ("Paving".to_string(), 1),
            ("Framing".to_string(), 2)
        ]
    );
    let active = center.active();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].level, NotificationLevel::Error);
    assert!(active[0].message.contains("Roofing"));
}

#[tokio::test]
async fn keyboard_moves_walk_an_item_to_the_end() {
    let gateway = Arc::new(InMemoryCollectionGateway::new());
    let (store, ids) = store_with(&gateway, Scope::root(CollectionKind::LeadershipTeam), &["Ana", "Ben", "Cleo"]).await;
    let mut drag = DragReorderController::new(store.clone(), Arc::new(NotificationCenter::new()), 5);

    assert_eq!(drag.move_down(&ids[0]).await.unwrap(), DropOutcome::Moved { from: 0, to: 1 });
    assert_eq!(drag.move_down(&ids[0]).await.unwrap(), DropOutcome::Moved { from: 1, to: 2 });
    assert_eq!(drag.move_down(&ids[0]).await.unwrap(), DropOutcome::Unchanged);

    assert_eq!(titles(&store), vec!["Ben", "Cleo", "Ana"]);
}

// =============================================================================
// Bulk selection
// =============================================================================

#[tokio::test]
async fn bulk_delete_with_one_failure_reports_two_of_three() {
    let gateway = Arc::new(InMemoryCollectionGateway::new());
    let scope = Scope::root(CollectionKind::Projects);
    let (store, ids) = store_with(&gateway, scope.clone(), &["Harbor", "Library", "Tunnel"]).await;
    let center = Arc::new(NotificationCenter::new());
    let mut bulk = BulkSelectionController::new(store.clone(), center.clone(), 100);
    gateway.fail_for(&ids[1]);

    bulk.toggle_all();
    assert_eq!(bulk.state(), SelectionState::All);
    let token = match bulk.request(BulkAction::Delete).await.unwrap() {
        BulkRequest::PendingConfirmation { token, count, .. } => {
            assert_eq!(count, 3);
            token
        }
        other => panic!("expected confirmation, got {:?}", other),
    };
    let report = bulk.confirm(token).await.unwrap();

    assert_eq!(report.succeeded_count(), 2);
    assert_eq!(report.failed_ids(), vec![ids[1].clone()]);
    assert_eq!(titles(&store), vec!["Library"]);
    assert_eq!(orders(&store), vec![0]);
    // The failing row also refuses its renumbering
    assert!(store.needs_compaction());
    assert_eq!(gateway.rows(&scope).len(), 1);
    assert_eq!(bulk.state(), SelectionState::Empty);
    assert_eq!(center.count_at(NotificationLevel::Warning), 1);
}

#[tokio::test]
async fn paging_evicts_selection_from_previous_page() {
    let gateway = Arc::new(InMemoryCollectionGateway::new());
    let (store, ids) = store_with(&gateway, Scope::root(CollectionKind::Services), &["A", "B", "C", "D"]).await;
    let mut bulk = BulkSelectionController::new(store, Arc::new(NotificationCenter::new()), 100);

    bulk.set_view(ViewQuery::paginated(1, 2)).unwrap();
    bulk.toggle_all();
    assert_eq!(bulk.selected_ids(), vec![ids[0].clone(), ids[1].clone()]);

    let view = bulk.set_view(ViewQuery::paginated(2, 2)).unwrap();
    assert_eq!(view.ids, vec![ids[2].clone(), ids[3].clone()]);
    assert!(!view.has_more);
    assert_eq!(bulk.state(), SelectionState::Empty);
}

#[tokio::test]
async fn bulk_publish_updates_backend() {
    let gateway = Arc::new(InMemoryCollectionGateway::new());
    let scope = Scope::root(CollectionKind::Services);
    let (store, ids) = store_with(&gateway, scope.clone(), &["Roofing", "Paving"]).await;
    let mut bulk = BulkSelectionController::new(store, Arc::new(NotificationCenter::new()), 100);

    bulk.toggle(&ids[1]);
    let request = bulk
        .request(BulkAction::SetStatus(PublicationStatus::Published))
        .await
        .unwrap();

    assert!(matches!(request, BulkRequest::Completed(ref r) if r.is_complete_success()));
    let statuses: Vec<_> = gateway.rows(&scope).iter().map(|e| e.status()).collect();
    assert_eq!(
        statuses,
        vec![Some(PublicationStatus::Draft), Some(PublicationStatus::Published)]
    );
}

// =============================================================================
// Live refresh
// =============================================================================

#[tokio::test]
async fn edits_from_another_session_reload_open_editor() {
    let feed = Arc::new(InMemoryChangeFeed::new());
    let gateway = Arc::new(InMemoryCollectionGateway::new().with_feed(feed.clone()));
    let scope = Scope::root(CollectionKind::Services);
    gateway.seed(&scope, 0, json!({"title": "Roofing"}));

    let mine = OrderedCollectionStore::new(gateway.clone(), scope.clone());
    mine.load().await.unwrap();
    let live = LiveRefresh::start(feed.clone(), &mine);

    let theirs = OrderedCollectionStore::new(gateway.clone(), scope.clone());
    theirs.load().await.unwrap();
    theirs
        .append(payload(json!({"title": "Paving"})))
        .await
        .unwrap();

    assert_eq!(titles(&mine), vec!["Roofing", "Paving"]);

    drop(live);
    assert_eq!(feed.subscriber_count(), 0);
}
