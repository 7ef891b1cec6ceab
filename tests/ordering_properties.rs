//! Property tests for collection ordering and row selection.

use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

use sitecraft_cms::adapters::{GatewayOp, InMemoryCollectionGateway};
use sitecraft_cms::application::OrderedCollectionStore;
use sitecraft_cms::domain::collection::{CollectionKind, Scope};
use sitecraft_cms::domain::foundation::EntityId;
use sitecraft_cms::domain::selection::{Selection, SelectionState};

#[derive(Debug, Clone)]
enum Op {
    Reorder { pick: usize, to: usize },
    Remove { pick: usize },
    Append,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0usize..16, 0usize..20).prop_map(|(pick, to)| Op::Reorder { pick, to }),
        1 => (0usize..16).prop_map(|pick| Op::Remove { pick }),
        1 => Just(Op::Append),
    ]
}

fn kind_strategy() -> impl Strategy<Value = CollectionKind> {
    prop_oneof![
        Just(CollectionKind::ProcessSteps),
        Just(CollectionKind::LeadershipTeam),
        Just(CollectionKind::Services),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap_or_else(|e| panic!("runtime: {e}"))
}

fn required_payload(kind: CollectionKind, n: usize) -> serde_json::Value {
    let mut payload = serde_json::Map::new();
    for field in kind.required_fields() {
        payload.insert(field.to_string(), json!(format!("entry {n}")));
    }
    serde_json::Value::Object(payload)
}

async fn seeded_store(
    kind: CollectionKind,
    len: usize,
) -> (OrderedCollectionStore, Arc<InMemoryCollectionGateway>, Scope) {
    let scope = Scope::root(kind);
    let gateway = Arc::new(InMemoryCollectionGateway::new());
    for i in 0..len {
        gateway.seed(&scope, scope.base_index() + i as i32, required_payload(kind, i));
    }
    let store = OrderedCollectionStore::new(gateway.clone(), scope.clone());
    store.load().await.unwrap_or_else(|e| panic!("load: {e}"));
    (store, gateway, scope)
}

fn expected_orders(base: i32, len: usize) -> Vec<i32> {
    (0..len as i32).map(|i| base + i).collect()
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn orders_stay_dense_locally_and_remotely(
        kind in kind_strategy(),
        len in 0usize..8,
        ops in prop::collection::vec(op_strategy(), 1..12),
    ) {
        runtime().block_on(async {
            let (store, gateway, scope) = seeded_store(kind, len).await;
            let base = scope.base_index();

            for (n, op) in ops.into_iter().enumerate() {
                let ids = store.ids();
                match op {
                    Op::Reorder { pick, to } if !ids.is_empty() => {
                        store.reorder(&ids[pick % ids.len()], to).await
                            .unwrap_or_else(|e| panic!("reorder: {e}"));
                    }
                    Op::Remove { pick } if !ids.is_empty() => {
                        store.remove(&ids[pick % ids.len()]).await
                            .unwrap_or_else(|e| panic!("remove: {e}"));
                    }
                    Op::Append => {
                        let payload = required_payload(kind, 100 + n);
                        store.append(payload.as_object().cloned().unwrap_or_default()).await
                            .unwrap_or_else(|e| panic!("append: {e}"));
                    }
                    _ => {}
                }

                let local: Vec<i32> = store.entities().iter().map(|e| e.order()).collect();
                assert_eq!(local, expected_orders(base, store.len()));

                let remote: Vec<(EntityId, i32)> = gateway.rows(&scope)
                    .iter().map(|e| (e.id().clone(), e.order())).collect();
                let mirrored: Vec<(EntityId, i32)> = store.entities()
                    .iter().map(|e| (e.id().clone(), e.order())).collect();
                assert_eq!(remote, mirrored);
            }
        });
    }

    #[test]
    fn reorder_to_current_index_changes_nothing(
        kind in kind_strategy(),
        len in 1usize..8,
        pick in 0usize..8,
    ) {
        runtime().block_on(async {
            let (store, gateway, _) = seeded_store(kind, len).await;
            let id = store.ids()[pick % len].clone();
            let before = store.entities();
            let current = store.index_of(&id).unwrap_or_else(|| panic!("missing {id}"));

            let outcome = store.reorder(&id, current).await
                .unwrap_or_else(|e| panic!("reorder: {e}"));

            assert_eq!(outcome.changed, 0);
            assert_eq!(store.entities(), before);
            assert_eq!(gateway.calls(GatewayOp::OrderBatch), 0);
        });
    }

    #[test]
    fn failed_reorder_restores_exact_prior_state(
        len in 2usize..8,
        pick in 0usize..8,
        to in 0usize..8,
    ) {
        runtime().block_on(async {
            let (store, gateway, _) = seeded_store(CollectionKind::Services, len).await;
            gateway.fail(GatewayOp::OrderBatch);
            let id = store.ids()[pick % len].clone();
            let before = store.entities();

            let _ = store.reorder(&id, to).await;

            assert_eq!(store.entities(), before);
        });
    }

    #[test]
    fn selection_is_always_a_subset_of_visible(
        views in prop::collection::vec(prop::collection::btree_set(0u8..12, 0..12), 1..6),
        toggles in prop::collection::vec(0u8..12, 0..20),
    ) {
        let id = |n: u8| EntityId::new(format!("row-{n}")).unwrap_or_else(|e| panic!("{e}"));
        let mut selection = Selection::new();

        for view in views {
            selection.set_visible(view.iter().map(|n| id(*n)).collect());
            for t in &toggles {
                selection.toggle(&id(*t));
            }
            for selected in selection.ids() {
                prop_assert!(selection.visible().contains(&selected));
            }
            let expected = match selection.len() {
                0 => SelectionState::Empty,
                n if n == selection.visible().len() => SelectionState::All,
                _ => SelectionState::Partial,
            };
            prop_assert_eq!(selection.state(), expected);
        }
    }

    #[test]
    fn toggle_all_twice_from_empty_is_identity(
        visible in prop::collection::btree_set(0u8..20, 1..20),
    ) {
        let ids: Vec<EntityId> = visible.iter()
            .map(|n| EntityId::new(format!("row-{n}")).unwrap_or_else(|e| panic!("{e}")))
            .collect();
        let mut selection = Selection::new();
        selection.set_visible(ids);

        selection.toggle_all();
        prop_assert_eq!(selection.state(), SelectionState::All);
        selection.toggle_all();
        prop_assert_eq!(selection.state(), SelectionState::Empty);
    }
}
