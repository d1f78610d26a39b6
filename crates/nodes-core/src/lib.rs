//!
//! Nodes Core - graph engine for the classroom network
//!
//! This crate holds the in-memory model of students and their labeled
//! relationships, the mutation API with single-step undo, and the
//! path finder used to demonstrate fault tolerance. It performs no I/O;
//! persistence is delegated to collaborators through
//! [`MutationSink`] and [`GraphRepository`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Domain layer - graph model, undo log, path finding and modes
pub mod domain;

/// Application services - the graph store
pub mod application;

/// Error types
pub mod error;

// Re-export key types
pub use error::CoreError;

pub use application::graph_store::{GraphStore, StoreConfig, TapOutcome};
pub use domain::events::GraphMutation;
pub use domain::graph::{ConnectionPair, Graph};
pub use domain::node::{Connection, ConnectionId, Node, NodeId, NodeRecord, Position};
pub use domain::pathfinding::{all_simple_paths, find_paths, has_path, shortest_path, Path};
pub use domain::repository::{DiscardSink, GraphRepository, GraphSnapshot, MutationSink};
pub use domain::selection::{
    ConnectionDraft, DraftTapOutcome, GraphObserver, MultiSelection, PathRecheck, PathSelection,
    PathTapOutcome,
};
pub use domain::undo::{UndoAction, UndoLog};
pub use domain::validation::{validate_connection, validate_node_name};
