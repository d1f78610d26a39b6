//! Undo log of inverse actions
//!
//! Every store mutation records an [`UndoAction`] describing how to reverse
//! it. Undo is one-directional: applying an inverse never records a new
//! entry, and there is no redo stack.
//!
//! Undoing [`UndoAction::NodeRemoved`] restores the node but not the
//! connections it had. Those come back only if the separate
//! `ConnectionRemoved` entries recorded before it are undone as well.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::events::GraphMutation;
use super::graph::Graph;
use super::node::{Connection, ConnectionId, Node, NodeId, NodeRecord, Position};

/// Inverse of one store mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UndoAction {
    /// A node was added; undo removes it
    NodeAdded {
        /// The added node
        node_id: NodeId,
    },

    /// A node was removed; undo re-inserts it without connections
    NodeRemoved {
        /// The removed node as it was
        node: NodeRecord,
    },

    /// A connection half was added; undo removes its pair
    ConnectionAdded {
        /// The added half
        connection: Connection,
    },

    /// A connection half was removed; undo restores its pair
    ConnectionRemoved {
        /// The removed half
        connection: Connection,
        /// Id the opposite half had, so the restored pair keeps both ids
        mirror_id: ConnectionId,
    },

    /// A node moved from `from` to `to`
    PositionChanged {
        /// The node
        node_id: NodeId,
        /// Position before the first coalesced move
        from: Position,
        /// Position after the last coalesced move
        to: Position,
    },

    /// A node's activity flag was changed from `previous`
    ActivationToggled {
        /// The node
        node_id: NodeId,
        /// Value before the toggle
        previous: bool,
    },
}

impl UndoAction {
    /// Apply the inverse of this action to `graph`.
    ///
    /// Returns the mutations actually performed; an inverse whose target no
    /// longer exists, or was already reversed, performs none.
    pub fn apply_inverse(self, graph: &mut Graph) -> Vec<GraphMutation> {
        match self {
            UndoAction::NodeAdded { node_id } => match graph.remove_node(node_id) {
                Some((_, pairs)) => {
                    let mut mutations: Vec<GraphMutation> =
                        pairs.iter().map(GraphMutation::connection_deleted).collect();
                    mutations.push(GraphMutation::NodeDeleted { node_id });
                    mutations
                }
                None => Vec::new(),
            },
            UndoAction::NodeRemoved { node } => {
                if graph.contains(node.id) {
                    return Vec::new();
                }
                graph.insert_node(Node::from(node.clone()));
                vec![GraphMutation::NodeCreated { node }]
            }
            UndoAction::ConnectionAdded { connection } => {
                let present = graph.connections().any(|c| c.id == connection.id);
                if !present {
                    return Vec::new();
                }
                graph
                    .remove_pair(connection.from_node_id, connection.to_node_id)
                    .map(|pair| vec![GraphMutation::connection_deleted(&pair)])
                    .unwrap_or_default()
            }
            UndoAction::ConnectionRemoved { connection, mirror_id } => {
                let mirror = Connection {
                    id: mirror_id,
                    from_node_id: connection.to_node_id,
                    to_node_id: connection.from_node_id,
                    common_interest: connection.common_interest.clone(),
                };
                graph
                    .insert_pair(connection, mirror)
                    .map(|pair| vec![GraphMutation::connection_created(&pair)])
                    .unwrap_or_default()
            }
            UndoAction::PositionChanged { node_id, from, .. } => graph
                .set_position(node_id, from)
                .map(|_| vec![GraphMutation::PositionChanged { node_id, position: from }])
                .unwrap_or_default(),
            UndoAction::ActivationToggled { node_id, previous } => graph
                .set_active(node_id, previous)
                .map(|_| {
                    vec![GraphMutation::ActivationChanged {
                        node_id,
                        is_active: previous,
                    }]
                })
                .unwrap_or_default(),
        }
    }

    /// Whether `next` is the other half of the same connection operation
    fn is_mirror_entry(&self, next: &UndoAction) -> bool {
        match (self, next) {
            (
                UndoAction::ConnectionAdded { connection: a },
                UndoAction::ConnectionAdded { connection: b },
            ) => a.is_mirror_of(b),
            (
                UndoAction::ConnectionRemoved { connection: a, mirror_id },
                UndoAction::ConnectionRemoved { connection: b, .. },
            ) => b.id == *mirror_id && a.is_mirror_of(b),
            _ => false,
        }
    }
}

/// Stack of inverse actions with drag coalescing
#[derive(Debug, Clone, Default)]
pub struct UndoLog {
    actions: VecDeque<UndoAction>,
    max_steps: Option<usize>,
    /// Node whose position updates currently merge into the top entry
    coalescing: Option<NodeId>,
}

impl UndoLog {
    /// Create an unbounded undo log
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an undo log that drops its oldest steps beyond `max_steps`
    pub fn with_limit(max_steps: Option<usize>) -> Self {
        Self {
            max_steps,
            ..Self::default()
        }
    }

    /// Whether there is anything to undo
    pub fn can_undo(&self) -> bool {
        !self.actions.is_empty()
    }

    /// Number of recorded entries
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Most recent entry
    pub fn last(&self) -> Option<&UndoAction> {
        self.actions.back()
    }

    /// Record an action.
    ///
    /// A position change for the node that produced the previous entry, with
    /// nothing recorded in between, extends that entry instead of adding one.
    pub fn push(&mut self, action: UndoAction) {
        if let UndoAction::PositionChanged { node_id, to, .. } = &action {
            if self.coalescing == Some(*node_id) {
                if let Some(UndoAction::PositionChanged { node_id: top, to: top_to, .. }) =
                    self.actions.back_mut()
                {
                    if *top == *node_id {
                        *top_to = *to;
                        return;
                    }
                }
            }
        }

        self.coalescing = match &action {
            UndoAction::PositionChanged { node_id, .. } => Some(*node_id),
            _ => None,
        };
        self.actions.push_back(action);

        if let Some(max) = self.max_steps {
            while self.steps() > max {
                self.drop_oldest_step();
            }
        }
    }

    /// Number of undoable steps; a connection's two halves count once
    pub fn steps(&self) -> usize {
        let mut count = 0;
        let mut rest = self.actions.len();
        while rest > 0 {
            rest -= 1;
            if rest > 0 && self.actions[rest].is_mirror_entry(&self.actions[rest - 1]) {
                rest -= 1;
            }
            count += 1;
        }
        count
    }

    fn drop_oldest_step(&mut self) {
        let paired = match (self.actions.front(), self.actions.get(1)) {
            (Some(first), Some(second)) => second.is_mirror_entry(first),
            _ => false,
        };
        self.actions.pop_front();
        if paired {
            self.actions.pop_front();
        }
    }

    /// Stop merging position updates into the top entry
    pub fn seal(&mut self) {
        self.coalescing = None;
    }

    /// Pop the entries making up the most recent step.
    ///
    /// Usually one entry; the two halves of a connection add or remove are
    /// popped together. Entries come back in pop order.
    pub fn pop_step(&mut self) -> Vec<UndoAction> {
        self.coalescing = None;
        let Some(top) = self.actions.pop_back() else {
            return Vec::new();
        };
        let mirror = self
            .actions
            .back()
            .filter(|next| top.is_mirror_entry(next))
            .is_some();
        let mut step = vec![top];
        if mirror {
            step.extend(self.actions.pop_back());
        }
        step
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.actions.clear();
        self.coalescing = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn moved(node_id: NodeId, from: (f64, f64), to: (f64, f64)) -> UndoAction {
        UndoAction::PositionChanged {
            node_id,
            from: Position::new(from.0, from.1),
            to: Position::new(to.0, to.1),
        }
    }

    #[test]
    fn consecutive_moves_of_one_node_coalesce() {
        let id = NodeId::new();
        let mut log = UndoLog::new();
        log.push(moved(id, (0.0, 0.0), (1.0, 1.0)));
        log.push(moved(id, (1.0, 1.0), (2.0, 2.0)));
        log.push(moved(id, (2.0, 2.0), (3.0, 3.0)));

        assert_eq!(log.len(), 1);
        assert_eq!(log.last(), Some(&moved(id, (0.0, 0.0), (3.0, 3.0))));
    }

    #[test]
    fn intervening_action_breaks_coalescing() {
        let id = NodeId::new();
        let mut log = UndoLog::new();
        log.push(moved(id, (0.0, 0.0), (1.0, 1.0)));
        log.push(UndoAction::ActivationToggled { node_id: id, previous: true });
        log.push(moved(id, (1.0, 1.0), (2.0, 2.0)));
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn moves_of_different_nodes_do_not_coalesce() {
        let (a, b) = (NodeId::new(), NodeId::new());
        let mut log = UndoLog::new();
        log.push(moved(a, (0.0, 0.0), (1.0, 1.0)));
        log.push(moved(b, (0.0, 0.0), (1.0, 1.0)));
        log.push(moved(a, (1.0, 1.0), (2.0, 2.0)));
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn seal_and_pop_end_coalescing() {
        let id = NodeId::new();
        let mut log = UndoLog::new();
        log.push(moved(id, (0.0, 0.0), (1.0, 1.0)));
        log.seal();
        log.push(moved(id, (1.0, 1.0), (2.0, 2.0)));
        assert_eq!(log.len(), 2);

        log.pop_step();
        log.push(moved(id, (1.0, 1.0), (5.0, 5.0)));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn pop_step_takes_both_connection_halves() {
        let (a, b) = (NodeId::new(), NodeId::new());
        let forward = Connection::new(a, b, "soccer");
        let mirror = forward.mirrored();
        let mut log = UndoLog::new();
        log.push(UndoAction::NodeAdded { node_id: a });
        log.push(UndoAction::ConnectionAdded { connection: forward });
        log.push(UndoAction::ConnectionAdded { connection: mirror });

        assert_eq!(log.pop_step().len(), 2);
        assert_eq!(log.pop_step().len(), 1);
        assert!(log.pop_step().is_empty());
        assert!(!log.can_undo());
    }

    #[test]
    fn limit_discards_oldest_entries() {
        let mut log = UndoLog::with_limit(Some(2));
        let ids: Vec<NodeId> = (0..3).map(|_| NodeId::new()).collect();
        for id in &ids {
            log.push(UndoAction::NodeAdded { node_id: *id });
        }
        assert_eq!(log.len(), 2);
        assert_eq!(log.pop_step(), vec![UndoAction::NodeAdded { node_id: ids[2] }]);
        assert_eq!(log.pop_step(), vec![UndoAction::NodeAdded { node_id: ids[1] }]);
    }

    #[test]
    fn limit_counts_connection_halves_as_one_step() {
        let mut log = UndoLog::with_limit(Some(2));
        let (a, b, c) = (NodeId::new(), NodeId::new(), NodeId::new());
        let first = Connection::new(a, b, "soccer");
        let second = Connection::new(b, c, "math");

        log.push(UndoAction::NodeAdded { node_id: a });
        for conn in [&first, &second] {
            log.push(UndoAction::ConnectionAdded { connection: conn.clone() });
            log.push(UndoAction::ConnectionAdded { connection: conn.mirrored() });
        }

        assert_eq!(log.steps(), 2);
        assert_eq!(log.len(), 4);
        assert_eq!(log.pop_step().len(), 2);
        let oldest = log.pop_step();
        assert_eq!(oldest.len(), 2);
        assert!(matches!(&oldest[1], UndoAction::ConnectionAdded { connection } if connection.id == first.id));
        assert!(!log.can_undo());
    }

    #[test]
    fn connection_inverses_are_idempotent() {
        let mut graph = Graph::new();
        let alice = Node::new("Alice", Position::ZERO);
        let bob = Node::new("Bob", Position::ZERO);
        let (a, b) = (alice.id, bob.id);
        graph.insert_node(alice);
        graph.insert_node(bob);
        let pair = graph.connect(a, b, "soccer").unwrap();

        let added = UndoAction::ConnectionAdded { connection: pair.mirror.clone() };
        assert_eq!(added.clone().apply_inverse(&mut graph).len(), 1);
        assert!(added.apply_inverse(&mut graph).is_empty());

        let removed = UndoAction::ConnectionRemoved {
            connection: pair.forward.clone(),
            mirror_id: pair.mirror.id,
        };
        assert_eq!(removed.clone().apply_inverse(&mut graph).len(), 1);
        assert!(removed.apply_inverse(&mut graph).is_empty());
        assert_eq!(graph.connection_between(b, a), Some(&pair.mirror));
        graph.verify_invariants().unwrap();
    }
}
