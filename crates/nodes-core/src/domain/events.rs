//! Mutation events mirrored to the persistence collaborator

use serde::{Deserialize, Serialize};

use super::graph::ConnectionPair;
use super::node::{Connection, NodeId, NodeRecord, Position};

/// A change already applied to the in-memory graph.
///
/// The store emits one of these after every mutation (undo included) so a
/// durable mirror can follow along. Persistence is best-effort; nothing in
/// the graph depends on the event being stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GraphMutation {
    /// A node was created (or restored by undo)
    NodeCreated {
        /// The node, without connections
        node: NodeRecord,
    },

    /// A node was deleted
    NodeDeleted {
        /// Id of the deleted node
        node_id: NodeId,
    },

    /// A connection pair was created
    ConnectionCreated {
        /// Half owned by the first endpoint
        forward: Connection,
        /// Half owned by the second endpoint
        mirror: Connection,
    },

    /// A connection pair was deleted
    ConnectionDeleted {
        /// Half owned by the first endpoint
        forward: Connection,
        /// Half owned by the second endpoint
        mirror: Connection,
    },

    /// A node moved
    PositionChanged {
        /// The node that moved
        node_id: NodeId,
        /// Its new position
        position: Position,
    },

    /// A node was activated or deactivated
    ActivationChanged {
        /// The node
        node_id: NodeId,
        /// Its new activity flag
        is_active: bool,
    },

    /// The whole graph was wiped
    Cleared,
}

impl GraphMutation {
    /// Returns the type of the event as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            GraphMutation::NodeCreated { .. } => "node.created",
            GraphMutation::NodeDeleted { .. } => "node.deleted",
            GraphMutation::ConnectionCreated { .. } => "connection.created",
            GraphMutation::ConnectionDeleted { .. } => "connection.deleted",
            GraphMutation::PositionChanged { .. } => "node.position_changed",
            GraphMutation::ActivationChanged { .. } => "node.activation_changed",
            GraphMutation::Cleared => "graph.cleared",
        }
    }

    pub(crate) fn connection_created(pair: &ConnectionPair) -> Self {
        GraphMutation::ConnectionCreated {
            forward: pair.forward.clone(),
            mirror: pair.mirror.clone(),
        }
    }

    pub(crate) fn connection_deleted(pair: &ConnectionPair) -> Self {
        GraphMutation::ConnectionDeleted {
            forward: pair.forward.clone(),
            mirror: pair.mirror.clone(),
        }
    }
}
