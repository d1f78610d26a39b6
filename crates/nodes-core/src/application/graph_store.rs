//! Graph store service
//!
//! The single owner of the classroom graph. Every mutator applies its change
//! in memory, records the inverse on the undo log, then notifies the mode
//! observers and the persistence sink. Mutators never fail: references to
//! unknown ids are logged and ignored.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::events::GraphMutation;
use crate::domain::graph::{ConnectionPair, Graph};
use crate::domain::node::{Connection, ConnectionId, Node, NodeId, Position};
use crate::domain::pathfinding::{self, Path};
use crate::domain::repository::{GraphSnapshot, MutationSink};
use crate::domain::selection::{
    ConnectionDraft, DraftTapOutcome, GraphObserver, MultiSelection, PathSelection, PathTapOutcome,
};
use crate::domain::undo::{UndoAction, UndoLog};
use crate::CoreError;

/// Store tuning
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Oldest undo entries are dropped beyond this many; `None` keeps all
    #[serde(default)]
    pub max_undo_steps: Option<usize>,
}

/// What a tap on a node did, given the active mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TapOutcome {
    /// Unknown node
    Ignored,
    /// Multi-select mode toggled membership
    Selection {
        /// Whether the node is now selected
        selected: bool,
    },
    /// Path-finding mode handled the tap
    Path(PathTapOutcome),
    /// Connection drawing handled the tap
    Draft(DraftTapOutcome),
}

/// Authoritative classroom graph with undo and transient mode state
pub struct GraphStore {
    graph: Graph,
    undo: UndoLog,
    path: PathSelection,
    multi: MultiSelection,
    draft: ConnectionDraft,
    sink: Box<dyn MutationSink>,
    observers: Vec<Box<dyn GraphObserver>>,
}

impl GraphStore {
    /// Create an empty store
    pub fn new(config: StoreConfig, sink: impl MutationSink + 'static) -> Self {
        Self {
            graph: Graph::new(),
            undo: UndoLog::with_limit(config.max_undo_steps),
            path: PathSelection::default(),
            multi: MultiSelection::default(),
            draft: ConnectionDraft::default(),
            sink: Box::new(sink),
            observers: Vec::new(),
        }
    }

    /// Seed a store from persisted records.
    ///
    /// Loading neither records undo entries nor persists anything. Records
    /// that would break the graph invariants are repaired or dropped.
    pub fn from_snapshot(
        snapshot: GraphSnapshot,
        config: StoreConfig,
        sink: impl MutationSink + 'static,
    ) -> Self {
        let mut store = Self::new(config, sink);

        for record in snapshot.nodes {
            if store.graph.contains(record.id) {
                warn!(node_id = %record.id, "Skipping duplicate node record");
                continue;
            }
            store.graph.insert_node(Node::from(record));
        }

        let mut halves: HashMap<(NodeId, NodeId), &Connection> = HashMap::new();
        for conn in &snapshot.connections {
            let (from, to) = (conn.from_node_id, conn.to_node_id);
            if from == to || !store.graph.contains(from) || !store.graph.contains(to) {
                warn!(connection_id = %conn.id, "Dropping connection with invalid endpoints");
                continue;
            }
            if halves.contains_key(&(from, to)) {
                warn!(connection_id = %conn.id, "Dropping duplicate connection record");
                continue;
            }
            halves.insert((from, to), conn);
        }

        let mut done: HashSet<(NodeId, NodeId)> = HashSet::new();
        for conn in &snapshot.connections {
            let key = (conn.from_node_id, conn.to_node_id);
            match halves.get(&key) {
                Some(kept) if kept.id == conn.id => {}
                _ => continue,
            }
            if done.contains(&key) {
                continue;
            }

            let mirror = match halves.get(&(key.1, key.0)) {
                Some(found) if found.is_mirror_of(conn) => (*found).clone(),
                Some(found) => {
                    warn!(connection_id = %found.id, "Mirror label disagrees; keeping first label");
                    Connection {
                        id: found.id,
                        from_node_id: key.1,
                        to_node_id: key.0,
                        common_interest: conn.common_interest.clone(),
                    }
                }
                None => {
                    warn!(connection_id = %conn.id, "Synthesizing missing mirror connection");
                    conn.mirrored()
                }
            };
            store.graph.insert_pair(conn.clone(), mirror);
            done.insert(key);
            done.insert((key.1, key.0));
        }

        info!(
            nodes = store.graph.len(),
            connections = store.graph.connection_count() / 2,
            "Loaded classroom graph"
        );
        store
    }

    /// Register an observer notified after every mutation
    pub fn add_observer(&mut self, observer: impl GraphObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    // ── Queries ────────────────────────────────────────────────────────────

    /// Read-only view of the graph
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Nodes in display order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.graph.nodes()
    }

    /// Look up a node
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.graph.node(id)
    }

    /// Stable display index, used for palette colours
    pub fn node_order_index(&self, id: NodeId) -> Option<usize> {
        self.graph.index_of(id)
    }

    /// Whether undo would do anything
    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    /// Number of undoable steps
    pub fn undo_depth(&self) -> usize {
        self.undo.steps()
    }

    /// The path shown in path-finding mode
    pub fn current_path(&self) -> &[NodeId] {
        self.path.current_path()
    }

    /// Path-finding mode state
    pub fn path_selection(&self) -> &PathSelection {
        &self.path
    }

    /// Multi-select mode state
    pub fn multi_selection(&self) -> &MultiSelection {
        &self.multi
    }

    /// Connection-drawing state
    pub fn connection_draft(&self) -> &ConnectionDraft {
        &self.draft
    }

    /// Paths between two nodes; see [`pathfinding::find_paths`]
    pub fn find_paths(&self, start: NodeId, end: NodeId) -> Vec<Path> {
        pathfinding::find_paths(&self.graph, start, end)
    }

    /// Whether two nodes are joined through active nodes
    pub fn has_path(&self, start: NodeId, end: NodeId) -> bool {
        pathfinding::has_path(&self.graph, start, end)
    }

    /// Every simple path between two nodes
    pub fn all_simple_paths(&self, start: NodeId, end: NodeId) -> Vec<Path> {
        pathfinding::all_simple_paths(&self.graph, start, end)
    }

    /// Export the graph as plain records
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.graph.nodes().map(Node::record).collect(),
            connections: self.graph.connections().cloned().collect(),
        }
    }

    /// Check the ownership and mirror invariants
    pub fn verify(&self) -> Result<(), CoreError> {
        self.graph.verify_invariants()
    }

    // ── Mutators ───────────────────────────────────────────────────────────

    /// Add an active, unconnected node
    pub fn add_node(&mut self, name: impl Into<String>, position: Position) -> Node {
        let node = Node::new(name, position);
        debug!(node_id = %node.id, name = %node.name, "Adding node");

        self.graph.insert_node(node.clone());
        self.undo.push(UndoAction::NodeAdded { node_id: node.id });
        self.notify(GraphMutation::NodeCreated { node: node.record() });
        node
    }

    /// Remove a node and every connection touching it
    pub fn remove_node(&mut self, id: NodeId) {
        let Some((node, pairs)) = self.graph.remove_node(id) else {
            debug!(node_id = %id, "remove_node: unknown node");
            return;
        };
        debug!(node_id = %id, connections = pairs.len(), "Removed node");

        for pair in &pairs {
            self.undo.push(UndoAction::ConnectionRemoved {
                connection: pair.forward.clone(),
                mirror_id: pair.mirror.id,
            });
        }
        let record = node.record();
        self.undo.push(UndoAction::NodeRemoved { node: record });

        for pair in &pairs {
            self.notify(GraphMutation::connection_deleted(pair));
        }
        self.notify(GraphMutation::NodeDeleted { node_id: id });
    }

    /// Connect two nodes, replacing any existing label between them
    pub fn add_connection(
        &mut self,
        from: NodeId,
        to: NodeId,
        label: impl Into<String>,
    ) -> Option<ConnectionPair> {
        let label = label.into();
        if from == to {
            warn!(node_id = %from, "Rejected self-connection");
            return None;
        }
        if !self.graph.contains(from) || !self.graph.contains(to) {
            debug!(from = %from, to = %to, "add_connection: unknown node");
            return None;
        }

        if let Some(replaced) = self.graph.remove_pair(from, to) {
            debug!(from = %from, to = %to, old = %replaced.forward.common_interest, "Replacing connection");
            self.record_pair_removed(&replaced);
            self.notify(GraphMutation::connection_deleted(&replaced));
        }

        let pair = self.graph.connect(from, to, &label)?;
        debug!(from = %from, to = %to, label = %label, "Connected nodes");
        self.undo.push(UndoAction::ConnectionAdded { connection: pair.forward.clone() });
        self.undo.push(UndoAction::ConnectionAdded { connection: pair.mirror.clone() });
        self.notify(GraphMutation::connection_created(&pair));
        Some(pair)
    }

    /// Remove both halves of a connection
    pub fn remove_connection(&mut self, connection_id: ConnectionId, from: NodeId, to: NodeId) {
        let Some(pair) = self.graph.remove_connection(connection_id, from, to) else {
            debug!(connection_id = %connection_id, "remove_connection: unknown connection");
            return;
        };
        debug!(connection_id = %connection_id, "Removed connection");
        self.record_pair_removed(&pair);
        self.notify(GraphMutation::connection_deleted(&pair));
    }

    /// Activate or deactivate a node; rechecks the displayed path
    pub fn set_active(&mut self, id: NodeId, active: bool) {
        match self.graph.node(id).map(|n| n.is_active) {
            None => {
                debug!(node_id = %id, "set_active: unknown node");
                return;
            }
            Some(current) if current == active => return,
            Some(_) => {}
        }

        let Some(previous) = self.graph.set_active(id, active) else {
            return;
        };
        debug!(node_id = %id, active, "Changed node activity");
        self.undo.push(UndoAction::ActivationToggled { node_id: id, previous });
        self.notify(GraphMutation::ActivationChanged { node_id: id, is_active: active });
    }

    /// Flip a node's activity
    pub fn toggle_active(&mut self, id: NodeId) {
        if let Some(active) = self.graph.node(id).map(|n| n.is_active) {
            self.set_active(id, !active);
        }
    }

    /// Move a node. Consecutive moves of one node undo as a single step.
    pub fn set_position(&mut self, id: NodeId, position: Position) {
        match self.graph.node(id).map(|n| n.position) {
            None => {
                debug!(node_id = %id, "set_position: unknown node");
                return;
            }
            Some(current) if current == position => return,
            Some(_) => {}
        }

        let Some(previous) = self.graph.set_position(id, position) else {
            return;
        };
        self.undo.push(UndoAction::PositionChanged {
            node_id: id,
            from: previous,
            to: position,
        });
        self.notify(GraphMutation::PositionChanged { node_id: id, position });
    }

    /// End a drag: the next move starts a new undo step
    pub fn end_position_update(&mut self) {
        self.undo.seal();
    }

    /// Reverse the most recent step. Returns whether anything was undone.
    pub fn undo(&mut self) -> bool {
        let step = self.undo.pop_step();
        if step.is_empty() {
            return false;
        }

        for action in step {
            debug!(?action, "Undoing");
            for mutation in action.apply_inverse(&mut self.graph) {
                self.notify(mutation);
            }
        }
        true
    }

    /// Empty the graph, the undo log and every mode. Cannot be undone.
    pub fn clear_all(&mut self) {
        info!(nodes = self.graph.len(), "Clearing classroom graph");
        self.graph.clear();
        self.undo.clear();
        self.path = PathSelection::default();
        self.multi = MultiSelection::default();
        self.draft = ConnectionDraft::default();
        self.notify(GraphMutation::Cleared);
    }

    // ── Modes ──────────────────────────────────────────────────────────────

    /// Enter or leave path-finding mode
    pub fn set_path_finding_mode(&mut self, engaged: bool) {
        if engaged {
            self.draft.cancel();
        }
        self.path.set_engaged(engaged);
    }

    /// Enter or leave multi-select mode
    pub fn set_multi_select_mode(&mut self, engaged: bool) {
        self.multi.set_engaged(engaged);
    }

    /// Route a tap on a node to the mode that owns it
    pub fn tap_node(&mut self, id: NodeId) -> TapOutcome {
        if !self.graph.contains(id) {
            return TapOutcome::Ignored;
        }
        if self.multi.is_engaged() {
            TapOutcome::Selection { selected: self.multi.toggle(id) }
        } else if self.path.is_engaged() {
            TapOutcome::Path(self.path.tap(&self.graph, id))
        } else {
            TapOutcome::Draft(self.draft.tap(id))
        }
    }

    /// Toggle a node in the multi-selection
    pub fn toggle_node_selection(&mut self, id: NodeId) -> bool {
        if !self.graph.contains(id) {
            return false;
        }
        self.multi.toggle(id)
    }

    /// Deactivate every selected node, then leave multi-select mode
    pub fn deactivate_selected_nodes(&mut self) {
        for id in self.multi.finish() {
            self.set_active(id, false);
        }
    }

    /// Activate every selected node, then leave multi-select mode
    pub fn activate_selected_nodes(&mut self) {
        for id in self.multi.finish() {
            self.set_active(id, true);
        }
    }

    /// Label and create the drafted connection
    pub fn commit_connection(&mut self, label: &str) -> Result<ConnectionPair, CoreError> {
        let (from, to, label) = self.draft.commit(label)?;
        self.add_connection(from, to, label)
            .ok_or_else(|| CoreError::NodeNotFound(format!("{} or {}", from, to)))
    }

    /// Abandon the drafted connection
    pub fn cancel_connection(&mut self) {
        self.draft.cancel();
    }

    fn record_pair_removed(&mut self, pair: &ConnectionPair) {
        self.undo.push(UndoAction::ConnectionRemoved {
            connection: pair.forward.clone(),
            mirror_id: pair.mirror.id,
        });
        self.undo.push(UndoAction::ConnectionRemoved {
            connection: pair.mirror.clone(),
            mirror_id: pair.forward.id,
        });
    }

    fn notify(&mut self, mutation: GraphMutation) {
        self.path.on_mutation(&self.graph, &mutation);
        self.multi.on_mutation(&self.graph, &mutation);
        self.draft.on_mutation(&self.graph, &mutation);
        for observer in self.observers.iter_mut() {
            observer.on_mutation(&self.graph, &mutation);
        }
        self.sink.persist(mutation);
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new(StoreConfig::default(), crate::domain::repository::DiscardSink)
    }
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore")
            .field("nodes", &self.graph.len())
            .field("undo_depth", &self.undo.steps())
            .field("path", &self.path)
            .field("multi", &self.multi)
            .field("draft", &self.draft)
            .finish()
    }
}
