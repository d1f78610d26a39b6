//! Persistence collaborator interfaces
//!
//! The graph store is authoritative and updates optimistically. It hands
//! each applied mutation to a [`MutationSink`] without waiting; durable
//! storage sits behind a [`GraphRepository`] driven by whatever consumes
//! the sink. Storage failures never flow back into the graph.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::events::GraphMutation;
use super::node::{Connection, NodeRecord};
use crate::CoreError;

/// Plain node and connection records, as loaded at startup or exported
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Nodes in display order
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,

    /// Connection halves; each relationship normally appears twice
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl GraphSnapshot {
    /// Whether the snapshot holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Fire-and-forget receiver of applied mutations
pub trait MutationSink {
    /// Hand over a mutation; must not block
    fn persist(&self, mutation: GraphMutation);
}

impl<F> MutationSink for F
where
    F: Fn(GraphMutation),
{
    fn persist(&self, mutation: GraphMutation) {
        self(mutation)
    }
}

/// Sink that drops everything, for stores without persistence
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl MutationSink for DiscardSink {
    fn persist(&self, _mutation: GraphMutation) {}
}

/// Durable storage for the classroom graph
#[async_trait]
pub trait GraphRepository: Send + Sync {
    /// Load every stored node and connection
    async fn load_initial_state(&self) -> Result<GraphSnapshot, CoreError>;

    /// Mirror one applied mutation
    async fn apply(&self, mutation: &GraphMutation) -> Result<(), CoreError>;

    /// Remove everything stored
    async fn clear_all(&self) -> Result<(), CoreError>;
}
