use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use nodes_core::{
    CoreError, DiscardSink, GraphMutation, GraphRepository, GraphSnapshot, GraphStore,
    MutationSink, NodeId, Position, StoreConfig,
};
use nodes_state_inmemory::{
    InMemoryGraphRepository, JsonFileGraphRepository, PersistenceStats, PersistenceWorker,
};

fn connection_ids(snapshot: &GraphSnapshot) -> BTreeSet<String> {
    snapshot.connections.iter().map(|c| c.id.to_string()).collect()
}

#[tokio::test]
async fn worker_mirrors_store_into_repository() {
    let repo = Arc::new(InMemoryGraphRepository::with_sample_students());
    let initial = repo.load_initial_state().await.unwrap();
    let (worker, sink) = PersistenceWorker::spawn(repo.clone());

    let mut store = GraphStore::from_snapshot(initial, StoreConfig::default(), sink);
    let ids: Vec<NodeId> = store.nodes().map(|n| n.id).collect();
    store.add_connection(ids[0], ids[1], "Chess");
    store.add_connection(ids[1], ids[2], "Soccer");
    store.set_active(ids[1], false);
    store.set_position(ids[3], Position::new(10.0, 20.0));
    store.remove_node(ids[4]);
    let expected = store.snapshot();
    drop(store);

    let stats = worker.shutdown().await.unwrap();
    assert_eq!(stats, PersistenceStats { applied: 5, failed: 0 });

    let stored = repo.records().await;
    assert_eq!(stored.nodes, expected.nodes);
    assert_eq!(connection_ids(&stored), connection_ids(&expected));
}

#[tokio::test]
async fn undo_and_clear_reach_the_repository() {
    let repo = Arc::new(InMemoryGraphRepository::new());
    let (worker, sink) = PersistenceWorker::spawn(repo.clone());

    let mut store = GraphStore::new(StoreConfig::default(), sink);
    let a = store.add_node("Alice", Position::new(100.0, 100.0)).id;
    let b = store.add_node("Bob", Position::new(150.0, 150.0)).id;
    store.add_connection(a, b, "Music");
    store.undo();
    store.clear_all();
    store.add_node("Charlie", Position::new(200.0, 200.0));
    drop(store);

    let stats = worker.shutdown().await.unwrap();
    assert_eq!(stats.failed, 0);

    let stored = repo.records().await;
    let names: Vec<_> = stored.nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["Charlie"]);
    assert!(stored.connections.is_empty());
}

struct FlakyRepository {
    calls: AtomicUsize,
}

#[async_trait]
impl GraphRepository for FlakyRepository {
    async fn load_initial_state(&self) -> Result<GraphSnapshot, CoreError> {
        Ok(GraphSnapshot::default())
    }

    async fn apply(&self, _mutation: &GraphMutation) -> Result<(), CoreError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call % 2 == 0 {
            Err(CoreError::StateStoreError("disk full".to_string()))
        } else {
            Ok(())
        }
    }

    async fn clear_all(&self) -> Result<(), CoreError> {
        Ok(())
    }
}

#[tokio::test]
async fn storage_failures_do_not_touch_the_graph() {
    let repo = Arc::new(FlakyRepository {
        calls: AtomicUsize::new(0),
    });
    let (worker, sink) = PersistenceWorker::spawn(repo);

    let mut store = GraphStore::new(StoreConfig::default(), sink);
    for name in ["A", "B", "C", "D"] {
        store.add_node(name, Position::ZERO);
    }
    assert_eq!(store.graph().len(), 4);
    drop(store);

    let stats = worker.shutdown().await.unwrap();
    assert_eq!(stats, PersistenceStats { applied: 2, failed: 2 });
}

#[tokio::test]
async fn sink_outliving_worker_drops_mutations() {
    let repo = Arc::new(InMemoryGraphRepository::new());
    let (worker, sink) = PersistenceWorker::spawn(repo.clone());
    let extra = sink.clone();
    drop(sink);

    extra.persist(GraphMutation::Cleared);
    drop(extra);
    let stats = worker.shutdown().await.unwrap();
    assert_eq!(stats.applied, 1);
}

#[tokio::test]
async fn json_file_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("classroom").join("graph.json");

    let repo = Arc::new(JsonFileGraphRepository::open(&path).await.unwrap());
    assert!(repo.load_initial_state().await.unwrap().is_empty());

    let (worker, sink) = PersistenceWorker::spawn(repo.clone());
    let mut store = GraphStore::new(StoreConfig::default(), sink);
    let a = store.add_node("Alice", Position::new(100.0, 100.0)).id;
    let b = store.add_node("Bob", Position::new(150.0, 150.0)).id;
    store.add_connection(a, b, "Robotics");
    store.set_active(b, false);
    let expected = store.snapshot();
    drop(store);
    worker.shutdown().await.unwrap();

    let reopened = JsonFileGraphRepository::open(&path).await.unwrap();
    let loaded = reopened.load_initial_state().await.unwrap();
    assert_eq!(loaded.nodes, expected.nodes);
    assert_eq!(connection_ids(&loaded), connection_ids(&expected));

    let restored = GraphStore::from_snapshot(loaded, StoreConfig::default(), DiscardSink);
    assert!(restored.verify().is_ok());
    assert!(!restored.has_path(a, b));
}

#[tokio::test]
async fn corrupt_json_file_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.json");
    tokio::fs::write(&path, "{ not json").await.unwrap();

    let result = JsonFileGraphRepository::open(&path).await;
    assert!(matches!(result, Err(CoreError::SerializationError(_))));
}

#[tokio::test]
async fn clear_all_empties_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.json");
    let repo = JsonFileGraphRepository::open(&path).await.unwrap();
    repo.apply(&GraphMutation::NodeCreated {
        node: nodes_core::Node::new("Alice", Position::ZERO).record(),
    })
    .await
    .unwrap();
    repo.clear_all().await.unwrap();

    let reopened = JsonFileGraphRepository::open(&path).await.unwrap();
    assert!(reopened.load_initial_state().await.unwrap().is_empty());
}
