//! Repository implementations backed by memory or a JSON file

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use nodes_core::{
    Connection, CoreError, GraphMutation, GraphRepository, GraphSnapshot, NodeId, NodeRecord,
    Position,
};

/// Names seeded by [`InMemoryGraphRepository::with_sample_students`]
pub const SAMPLE_STUDENTS: [&str; 5] = ["Alice", "Bob", "Charlie", "Diana", "Eve"];

/// Apply one mutation to stored records.
///
/// Deleting a node also drops every stored connection touching it, so the
/// records never reference a missing node.
pub(crate) fn apply_to_snapshot(
    snapshot: &mut GraphSnapshot,
    mutation: &GraphMutation,
) -> Result<(), CoreError> {
    match mutation {
        GraphMutation::NodeCreated { node } => {
            match snapshot.nodes.iter_mut().find(|n| n.id == node.id) {
                Some(existing) => *existing = node.clone(),
                None => snapshot.nodes.push(node.clone()),
            }
        }
        GraphMutation::NodeDeleted { node_id } => {
            let before = snapshot.nodes.len();
            snapshot.nodes.retain(|n| n.id != *node_id);
            if snapshot.nodes.len() == before {
                return Err(CoreError::NodeNotFound(node_id.to_string()));
            }
            snapshot
                .connections
                .retain(|c| c.from_node_id != *node_id && c.to_node_id != *node_id);
        }
        GraphMutation::ConnectionCreated { forward, mirror } => {
            for half in [forward, mirror] {
                require_node(snapshot, half.from_node_id)?;
                require_node(snapshot, half.to_node_id)?;
            }
            snapshot.connections.retain(|c| c.id != forward.id && c.id != mirror.id);
            snapshot.connections.push(forward.clone());
            snapshot.connections.push(mirror.clone());
        }
        GraphMutation::ConnectionDeleted { forward, mirror } => {
            snapshot.connections.retain(|c| c.id != forward.id && c.id != mirror.id);
        }
        GraphMutation::PositionChanged { node_id, position } => {
            node_record_mut(snapshot, *node_id)?.position = *position;
        }
        GraphMutation::ActivationChanged { node_id, is_active } => {
            node_record_mut(snapshot, *node_id)?.is_active = *is_active;
        }
        GraphMutation::Cleared => {
            snapshot.nodes.clear();
            snapshot.connections.clear();
        }
    }
    Ok(())
}

fn require_node(snapshot: &GraphSnapshot, id: NodeId) -> Result<(), CoreError> {
    if snapshot.nodes.iter().any(|n| n.id == id) {
        Ok(())
    } else {
        Err(CoreError::NodeNotFound(id.to_string()))
    }
}

fn node_record_mut(snapshot: &mut GraphSnapshot, id: NodeId) -> Result<&mut NodeRecord, CoreError> {
    snapshot
        .nodes
        .iter_mut()
        .find(|n| n.id == id)
        .ok_or_else(|| CoreError::NodeNotFound(id.to_string()))
}

/// In-memory implementation of the GraphRepository
#[derive(Clone, Default)]
pub struct InMemoryGraphRepository {
    records: Arc<RwLock<GraphSnapshot>>,
}

impl InMemoryGraphRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-loaded with the given records
    pub fn with_snapshot(snapshot: GraphSnapshot) -> Self {
        Self {
            records: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// Five active, unconnected students laid out on a diagonal
    pub fn with_sample_students() -> Self {
        Self::with_snapshot(sample_students())
    }

    /// Copy of everything currently stored
    pub async fn records(&self) -> GraphSnapshot {
        self.records.read().await.clone()
    }
}

/// The sample classroom used to seed an empty store
pub fn sample_students() -> GraphSnapshot {
    let nodes = SAMPLE_STUDENTS
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let offset = 100.0 + 50.0 * i as f64;
            NodeRecord {
                id: NodeId::new(),
                name: (*name).to_string(),
                position: Position::new(offset, offset),
                is_active: true,
            }
        })
        .collect();

    GraphSnapshot {
        nodes,
        connections: Vec::<Connection>::new(),
    }
}

#[async_trait]
impl GraphRepository for InMemoryGraphRepository {
    async fn load_initial_state(&self) -> Result<GraphSnapshot, CoreError> {
        let records = self.records.read().await;
        debug!(
            nodes = records.nodes.len(),
            connections = records.connections.len(),
            "Loading graph from memory"
        );
        Ok(records.clone())
    }

    async fn apply(&self, mutation: &GraphMutation) -> Result<(), CoreError> {
        let mut records = self.records.write().await;
        apply_to_snapshot(&mut records, mutation)
    }

    async fn clear_all(&self) -> Result<(), CoreError> {
        let mut records = self.records.write().await;
        records.nodes.clear();
        records.connections.clear();
        Ok(())
    }
}

/// On-disk document written by [`JsonFileGraphRepository`]
#[derive(Debug, Serialize, Deserialize)]
struct StoredDocument {
    saved_at: DateTime<Utc>,
    #[serde(default)]
    snapshot: GraphSnapshot,
}

/// Repository that keeps the graph in a single JSON document.
///
/// Every applied mutation rewrites the file through a temporary sibling and
/// a rename, so a crash mid-write leaves the previous document intact.
pub struct JsonFileGraphRepository {
    path: PathBuf,
    records: RwLock<GraphSnapshot>,
}

impl JsonFileGraphRepository {
    /// Open the document at `path`; a missing file is an empty graph
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let records = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                let document: StoredDocument = serde_json::from_str(&contents)?;
                info!(
                    path = %path.display(),
                    saved_at = %document.saved_at,
                    nodes = document.snapshot.nodes.len(),
                    "Opened graph document"
                );
                document.snapshot
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No graph document yet, starting empty");
                GraphSnapshot::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    /// Location of the backing document
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn save(&self, snapshot: &GraphSnapshot) -> Result<(), CoreError> {
        let document = StoredDocument {
            saved_at: Utc::now(),
            snapshot: snapshot.clone(),
        };
        let json = serde_json::to_string_pretty(&document)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl GraphRepository for JsonFileGraphRepository {
    async fn load_initial_state(&self) -> Result<GraphSnapshot, CoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn apply(&self, mutation: &GraphMutation) -> Result<(), CoreError> {
        let mut records = self.records.write().await;
        apply_to_snapshot(&mut records, mutation)?;
        if let Err(e) = self.save(&records).await {
            warn!(path = %self.path.display(), error = %e, "Failed to write graph document");
            return Err(CoreError::StateStoreError(e.to_string()));
        }
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), CoreError> {
        let mut records = self.records.write().await;
        records.nodes.clear();
        records.connections.clear();
        self.save(&records).await
    }
}
