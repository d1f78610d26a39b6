//! Transient UI modes layered over the graph.
//!
//! None of these own graph data; they hold node ids and react to
//! mutations through [`GraphObserver`].

use serde::Serialize;
use tracing::debug;

use super::events::GraphMutation;
use super::graph::Graph;
use super::node::NodeId;
use super::pathfinding::{find_paths, Path};
use super::validation::validate_connection;
use crate::CoreError;

/// Receives every mutation after it has been applied to the graph
pub trait GraphObserver {
    /// Called once per applied mutation, in order
    fn on_mutation(&mut self, graph: &Graph, mutation: &GraphMutation);
}

/// Result of tapping a node while path-finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PathTapOutcome {
    /// Path-finding mode is off
    Ignored,
    /// The node became the start
    StartSelected,
    /// The start was tapped again; start and end cleared
    SelectionCleared,
    /// The node became the end and a path is displayed
    PathFound,
    /// No path joins start and this node; tap had no effect
    NoPath,
    /// Both ends were set; the node starts a new selection
    NewSelection,
}

/// Result of rechecking the displayed path after an activation change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PathRecheck {
    /// Not in path-finding mode or one end is unset
    Skipped,
    /// Displayed path replaced by the current shortest route
    Updated,
    /// No route remains; displayed path cleared
    Cleared,
}

/// Path-finding mode: start/end selection and the displayed path
#[derive(Debug, Clone, Default)]
pub struct PathSelection {
    engaged: bool,
    start: Option<NodeId>,
    end: Option<NodeId>,
    path: Path,
}

impl PathSelection {
    /// Whether path-finding mode is on
    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// Selected start node
    pub fn start(&self) -> Option<NodeId> {
        self.start
    }

    /// Selected end node
    pub fn end(&self) -> Option<NodeId> {
        self.end
    }

    /// Path currently displayed; empty when there is none
    pub fn current_path(&self) -> &[NodeId] {
        &self.path
    }

    /// Turn the mode on or off. Turning it off clears both ends and the path.
    pub fn set_engaged(&mut self, engaged: bool) {
        self.engaged = engaged;
        if !engaged {
            self.clear_selection();
        }
    }

    /// Apply the tap rules for `node`
    pub fn tap(&mut self, graph: &Graph, node: NodeId) -> PathTapOutcome {
        if !self.engaged {
            return PathTapOutcome::Ignored;
        }

        match (self.start, self.end) {
            (None, _) => {
                self.start = Some(node);
                PathTapOutcome::StartSelected
            }
            (Some(start), None) if start == node => {
                self.clear_selection();
                PathTapOutcome::SelectionCleared
            }
            (Some(start), None) => match find_paths(graph, start, node).into_iter().next() {
                Some(path) => {
                    self.end = Some(node);
                    self.path = path;
                    PathTapOutcome::PathFound
                }
                None => PathTapOutcome::NoPath,
            },
            (Some(_), Some(_)) => {
                self.start = Some(node);
                self.end = None;
                self.path.clear();
                PathTapOutcome::NewSelection
            }
        }
    }

    /// Recompute the displayed path, always preferring the current shortest route
    pub fn recheck(&mut self, graph: &Graph) -> PathRecheck {
        let (Some(start), Some(end)) = (self.start, self.end) else {
            return PathRecheck::Skipped;
        };
        if !self.engaged {
            return PathRecheck::Skipped;
        }

        match find_paths(graph, start, end).into_iter().next() {
            Some(path) => {
                self.path = path;
                PathRecheck::Updated
            }
            None => {
                self.path.clear();
                PathRecheck::Cleared
            }
        }
    }

    /// Clear start, end and path, leaving the mode as it is
    pub fn clear_selection(&mut self) {
        self.start = None;
        self.end = None;
        self.path.clear();
    }
}

impl GraphObserver for PathSelection {
    fn on_mutation(&mut self, graph: &Graph, mutation: &GraphMutation) {
        match mutation {
            GraphMutation::ActivationChanged { node_id, .. } => {
                let outcome = self.recheck(graph);
                debug!(node_id = %node_id, ?outcome, "Path rechecked after activation change");
            }
            GraphMutation::NodeDeleted { node_id } => {
                if self.start == Some(*node_id) || self.end == Some(*node_id) {
                    self.clear_selection();
                } else if self.path.contains(node_id) {
                    let outcome = self.recheck(graph);
                    debug!(node_id = %node_id, ?outcome, "Path rechecked after node removal");
                }
            }
            GraphMutation::Cleared => self.clear_selection(),
            _ => {}
        }
    }
}

/// Multi-select mode: an ordered set of selected node ids
#[derive(Debug, Clone, Default)]
pub struct MultiSelection {
    engaged: bool,
    selected: Vec<NodeId>,
}

impl MultiSelection {
    /// Whether multi-select mode is on
    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// Selected ids in selection order
    pub fn selected(&self) -> &[NodeId] {
        &self.selected
    }

    /// Whether `node` is selected
    pub fn contains(&self, node: NodeId) -> bool {
        self.selected.contains(&node)
    }

    /// Turn the mode on or off. Turning it off clears the selection.
    pub fn set_engaged(&mut self, engaged: bool) {
        self.engaged = engaged;
        if !engaged {
            self.selected.clear();
        }
    }

    /// Flip membership of `node`; returns whether it is now selected.
    /// Does nothing outside multi-select mode.
    pub fn toggle(&mut self, node: NodeId) -> bool {
        if !self.engaged {
            return false;
        }
        if let Some(index) = self.selected.iter().position(|n| *n == node) {
            self.selected.remove(index);
            false
        } else {
            self.selected.push(node);
            true
        }
    }

    /// Take the selection and leave the mode
    pub fn finish(&mut self) -> Vec<NodeId> {
        self.engaged = false;
        std::mem::take(&mut self.selected)
    }
}

impl GraphObserver for MultiSelection {
    fn on_mutation(&mut self, _graph: &Graph, mutation: &GraphMutation) {
        match mutation {
            GraphMutation::NodeDeleted { node_id } => self.selected.retain(|n| n != node_id),
            GraphMutation::Cleared => self.selected.clear(),
            _ => {}
        }
    }
}

/// Result of tapping a node while drawing a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DraftTapOutcome {
    /// The node is the start of a new draft
    Started,
    /// The node is the pending end; a label is needed to commit
    AwaitingLabel,
    /// The start node was tapped again
    Ignored,
}

/// Connection-drawing gesture: start node, then end node, then a label
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionDraft {
    /// No connection being drawn
    #[default]
    Idle,
    /// Start chosen
    Started {
        /// Start node
        from: NodeId,
    },
    /// Both ends chosen, waiting for a label
    Pending {
        /// Start node
        from: NodeId,
        /// End node
        to: NodeId,
    },
}

impl ConnectionDraft {
    /// Advance the draft with a tap on `node`
    pub fn tap(&mut self, node: NodeId) -> DraftTapOutcome {
        match *self {
            ConnectionDraft::Idle => {
                *self = ConnectionDraft::Started { from: node };
                DraftTapOutcome::Started
            }
            ConnectionDraft::Started { from } | ConnectionDraft::Pending { from, .. } => {
                if from == node {
                    return DraftTapOutcome::Ignored;
                }
                *self = ConnectionDraft::Pending { from, to: node };
                DraftTapOutcome::AwaitingLabel
            }
        }
    }

    /// Validate the pending draft with `label`, returning `(from, to, label)`.
    ///
    /// The draft is left untouched on error so the caller can retry.
    pub fn commit(&mut self, label: &str) -> Result<(NodeId, NodeId, String), CoreError> {
        let ConnectionDraft::Pending { from, to } = *self else {
            return Err(CoreError::ValidationError(
                "Choose two students before naming the connection".to_string(),
            ));
        };
        let label = validate_connection(from, to, label)?;
        *self = ConnectionDraft::Idle;
        Ok((from, to, label))
    }

    /// Abandon the draft
    pub fn cancel(&mut self) {
        *self = ConnectionDraft::Idle;
    }

    /// Whether the draft references `node`
    pub fn involves(&self, node: NodeId) -> bool {
        match *self {
            ConnectionDraft::Idle => false,
            ConnectionDraft::Started { from } => from == node,
            ConnectionDraft::Pending { from, to } => from == node || to == node,
        }
    }
}

impl GraphObserver for ConnectionDraft {
    fn on_mutation(&mut self, _graph: &Graph, mutation: &GraphMutation) {
        match mutation {
            GraphMutation::NodeDeleted { node_id } if self.involves(*node_id) => self.cancel(),
            GraphMutation::Cleared => self.cancel(),
            _ => {}
        }
    }
}
