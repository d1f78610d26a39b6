//! Authoritative in-memory node collection
//!
//! `Graph` is an arena of nodes keyed by id. Connections refer to nodes by
//! id only, so the mirrored halves of a relationship are two independent
//! records. The primitives here keep the mirror invariant intact but do not
//! record undo entries or emit persistence events; that is the job of
//! [`GraphStore`](crate::application::graph_store::GraphStore).

use std::collections::HashMap;

use super::node::{Connection, ConnectionId, Node, NodeId, Position};
use crate::CoreError;

/// Arena of nodes with stable insertion order
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: HashMap<NodeId, Node>,
    order: Vec<NodeId>,
}

/// Both halves of a relationship, `forward` owned by the first endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionPair {
    /// Half owned by the node the operation was addressed from
    pub forward: Connection,
    /// Half owned by the opposite node
    pub mirror: Connection,
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Look up a node
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Whether a node exists
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.order.iter().filter_map(move |id| self.nodes.get(id))
    }

    /// Node ids in insertion order
    pub fn node_ids(&self) -> &[NodeId] {
        &self.order
    }

    /// Position of `id` in insertion order
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.order.iter().position(|n| *n == id)
    }

    /// Whether a node is present and active
    pub fn is_active(&self, id: NodeId) -> bool {
        self.nodes.get(&id).map(|n| n.is_active).unwrap_or(false)
    }

    /// The half owned by `from` pointing at `to`, if the pair exists
    pub fn connection_between(&self, from: NodeId, to: NodeId) -> Option<&Connection> {
        self.nodes.get(&from).and_then(|n| n.connection_to(to))
    }

    /// Total number of connection halves
    pub fn connection_count(&self) -> usize {
        self.nodes.values().map(|n| n.connections.len()).sum()
    }

    /// Every half in node order, then connection order
    pub fn connections(&self) -> impl Iterator<Item = &Connection> + '_ {
        self.nodes().flat_map(|n| n.connections.iter())
    }

    /// Append a node. An existing node with the same id is replaced in place.
    pub fn insert_node(&mut self, node: Node) {
        let id = node.id;
        if self.nodes.insert(id, node).is_none() {
            self.order.push(id);
        }
    }

    /// Remove a node and every pair touching it.
    ///
    /// Returns the removed node (without connections) and the removed pairs,
    /// each with `forward` owned by the removed node.
    pub fn remove_node(&mut self, id: NodeId) -> Option<(Node, Vec<ConnectionPair>)> {
        let neighbor_ids: Vec<NodeId> = self.nodes.get(&id)?.neighbor_ids().collect();

        let mut pairs = Vec::with_capacity(neighbor_ids.len());
        for neighbor in neighbor_ids {
            if let Some(pair) = self.remove_pair(id, neighbor) {
                pairs.push(pair);
            }
        }

        // Halves owned by others that point at us without a mirror would be
        // an invariant breach; sweep them anyway so no dangling edge survives.
        for node in self.nodes.values_mut() {
            node.connections.retain(|c| c.to_node_id != id);
        }

        let node = self.nodes.remove(&id)?;
        self.order.retain(|n| *n != id);
        Some((node, pairs))
    }

    /// Create a pair between `from` and `to` with fresh ids.
    ///
    /// Callers must have removed any existing pair first; both endpoints must exist.
    pub fn connect(&mut self, from: NodeId, to: NodeId, label: &str) -> Option<ConnectionPair> {
        let forward = Connection::new(from, to, label);
        let mirror = forward.mirrored();
        self.insert_pair(forward, mirror)
    }

    /// Insert both halves of a pair as given (ids preserved).
    ///
    /// No-op returning `None` when an endpoint is missing, the halves are not
    /// mirrors of each other, or the node pair is already connected.
    pub fn insert_pair(&mut self, forward: Connection, mirror: Connection) -> Option<ConnectionPair> {
        let (from, to) = (forward.from_node_id, forward.to_node_id);
        if from == to
            || !forward.is_mirror_of(&mirror)
            || !self.contains(from)
            || !self.contains(to)
            || self.connection_between(from, to).is_some()
            || self.connection_between(to, from).is_some()
        {
            return None;
        }

        let pair = ConnectionPair {
            forward: forward.clone(),
            mirror: mirror.clone(),
        };
        if let Some(node) = self.nodes.get_mut(&from) {
            node.connections.push(forward);
        }
        if let Some(node) = self.nodes.get_mut(&to) {
            node.connections.push(mirror);
        }
        Some(pair)
    }

    /// Remove the pair joining `from` and `to`, whichever direction it was addressed in
    pub fn remove_pair(&mut self, from: NodeId, to: NodeId) -> Option<ConnectionPair> {
        let forward = Self::take_half(self.nodes.get_mut(&from), to);
        let mirror = Self::take_half(self.nodes.get_mut(&to), from);
        match (forward, mirror) {
            (Some(forward), Some(mirror)) => Some(ConnectionPair { forward, mirror }),
            (None, None) => None,
            // Half a pair would already be an invariant breach; report what was dropped.
            (Some(half), None) | (None, Some(half)) => {
                tracing::warn!(connection_id = %half.id, "Removed connection without a mirror");
                let mirror = half.mirrored();
                Some(ConnectionPair { forward: half, mirror })
            }
        }
    }

    /// Remove the pair one of whose halves has `connection_id`.
    ///
    /// Returns `None` and leaves the graph untouched when no half carries the
    /// id (stale or never issued) or when that half does not join `from` and
    /// `to`.
    pub fn remove_connection(
        &mut self,
        connection_id: ConnectionId,
        from: NodeId,
        to: NodeId,
    ) -> Option<ConnectionPair> {
        let Some((half_from, half_to)) = self
            .connections()
            .find(|c| c.id == connection_id)
            .map(|c| (c.from_node_id, c.to_node_id))
        else {
            tracing::debug!(connection_id = %connection_id, "No connection with this id");
            return None;
        };
        if !((half_from == from && half_to == to) || (half_from == to && half_to == from)) {
            tracing::debug!(
                connection_id = %connection_id,
                from = %from,
                to = %to,
                "Connection id does not join the given nodes"
            );
            return None;
        }
        self.remove_pair(half_from, half_to)
    }

    /// Set the activity flag, returning the previous value
    pub fn set_active(&mut self, id: NodeId, active: bool) -> Option<bool> {
        let node = self.nodes.get_mut(&id)?;
        let previous = node.is_active;
        node.is_active = active;
        Some(previous)
    }

    /// Set the position, returning the previous value
    pub fn set_position(&mut self, id: NodeId, position: Position) -> Option<Position> {
        let node = self.nodes.get_mut(&id)?;
        let previous = node.position;
        node.position = position;
        Some(previous)
    }

    /// Drop every node
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.order.clear();
    }

    /// Check ownership and bidirectional symmetry across the whole graph
    pub fn verify_invariants(&self) -> Result<(), CoreError> {
        for node in self.nodes() {
            for conn in &node.connections {
                if conn.from_node_id != node.id {
                    return Err(CoreError::InvariantViolation(format!(
                        "connection {} stored on {} but owned by {}",
                        conn.id, node.id, conn.from_node_id
                    )));
                }
                if conn.to_node_id == node.id {
                    return Err(CoreError::InvariantViolation(format!(
                        "self-connection {} on {}",
                        conn.id, node.id
                    )));
                }
                let mirrored = self
                    .connection_between(conn.to_node_id, node.id)
                    .map(|m| m.is_mirror_of(conn))
                    .unwrap_or(false);
                if !mirrored {
                    return Err(CoreError::InvariantViolation(format!(
                        "connection {} from {} to {} has no mirror",
                        conn.id, conn.from_node_id, conn.to_node_id
                    )));
                }
            }
            let mut targets: Vec<NodeId> = node.neighbor_ids().collect();
            targets.sort();
            targets.dedup();
            if targets.len() != node.connections.len() {
                return Err(CoreError::InvariantViolation(format!(
                    "node {} carries more than one connection to the same neighbor",
                    node.id
                )));
            }
        }
        Ok(())
    }

    fn take_half(owner: Option<&mut Node>, to: NodeId) -> Option<Connection> {
        let owner = owner?;
        let index = owner.connections.iter().position(|c| c.to_node_id == to)?;
        Some(owner.connections.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn graph_with(names: &[&str]) -> (Graph, Vec<NodeId>) {
        let mut graph = Graph::new();
        let ids = names
            .iter()
            .map(|name| {
                let node = Node::new(*name, Position::ZERO);
                let id = node.id;
                graph.insert_node(node);
                id
            })
            .collect();
        (graph, ids)
    }

    #[test]
    fn connect_creates_mirrored_halves() {
        let (mut graph, ids) = graph_with(&["Alice", "Bob"]);
        let pair = graph.connect(ids[0], ids[1], "soccer").unwrap();

        assert_eq!(pair.forward.from_node_id, ids[0]);
        assert_eq!(pair.mirror.from_node_id, ids[1]);
        assert_eq!(graph.connection_count(), 2);
        graph.verify_invariants().unwrap();
    }

    #[test]
    fn insert_pair_refuses_existing_pair_and_missing_endpoint() {
        let (mut graph, ids) = graph_with(&["Alice", "Bob"]);
        graph.connect(ids[0], ids[1], "soccer").unwrap();

        assert!(graph.connect(ids[1], ids[0], "math").is_none());
        assert!(graph.connect(ids[0], NodeId::new(), "math").is_none());
        assert!(graph.connect(ids[0], ids[0], "math").is_none());
        assert_eq!(graph.connection_count(), 2);
    }

    #[test]
    fn remove_pair_works_from_either_side() {
        let (mut graph, ids) = graph_with(&["Alice", "Bob"]);
        graph.connect(ids[0], ids[1], "soccer").unwrap();

        let pair = graph.remove_pair(ids[1], ids[0]).unwrap();
        assert_eq!(pair.forward.from_node_id, ids[1]);
        assert_eq!(graph.connection_count(), 0);
        assert!(graph.remove_pair(ids[0], ids[1]).is_none());
    }

    #[test]
    fn remove_connection_accepts_either_half_id() {
        let (mut graph, ids) = graph_with(&["Alice", "Bob"]);
        let pair = graph.connect(ids[0], ids[1], "soccer").unwrap();

        let removed = graph.remove_connection(pair.mirror.id, ids[0], ids[1]).unwrap();
        assert_eq!(removed.forward.id, pair.mirror.id);
        assert_eq!(graph.connection_count(), 0);
    }

    #[test]
    fn remove_connection_ignores_unknown_and_mismatched_ids() {
        let (mut graph, ids) = graph_with(&["Alice", "Bob", "Charlie"]);
        let soccer = graph.connect(ids[0], ids[1], "soccer").unwrap();
        graph.connect(ids[1], ids[2], "math").unwrap();

        assert!(graph.remove_connection(ConnectionId::new(), ids[0], ids[1]).is_none());
        assert!(graph.remove_connection(soccer.forward.id, ids[1], ids[2]).is_none());
        assert_eq!(graph.connection_count(), 4);
        graph.verify_invariants().unwrap();
    }

    #[test]
    fn remove_node_sweeps_all_incident_pairs() {
        let (mut graph, ids) = graph_with(&["Alice", "Bob", "Charlie"]);
        graph.connect(ids[0], ids[1], "soccer").unwrap();
        graph.connect(ids[2], ids[1], "math").unwrap();
        graph.connect(ids[0], ids[2], "chess").unwrap();

        let (node, pairs) = graph.remove_node(ids[1]).unwrap();
        assert_eq!(node.name, "Bob");
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|p| p.forward.from_node_id == ids[1]));
        assert_eq!(graph.connection_count(), 2);
        assert_eq!(graph.node_ids(), &[ids[0], ids[2]]);
        graph.verify_invariants().unwrap();
    }

    #[test]
    fn verify_invariants_detects_missing_mirror() {
        let (mut graph, ids) = graph_with(&["Alice", "Bob"]);
        if let Some(node) = graph.nodes.get_mut(&ids[0]) {
            node.connections.push(Connection::new(ids[0], ids[1], "soccer"));
        }
        assert!(matches!(
            graph.verify_invariants(),
            Err(CoreError::InvariantViolation(_))
        ));
    }

    #[test]
    fn setters_return_previous_values_and_ignore_unknown_ids() {
        let (mut graph, ids) = graph_with(&["Alice"]);
        assert_eq!(graph.set_active(ids[0], false), Some(true));
        assert_eq!(graph.set_position(ids[0], Position::new(5.0, 5.0)), Some(Position::ZERO));
        assert_eq!(graph.set_active(NodeId::new(), false), None);
        assert!(!graph.is_active(ids[0]));
    }
}
