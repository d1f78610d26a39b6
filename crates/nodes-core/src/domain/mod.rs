/// Node and connection models
pub mod node;

/// Node arena and invariant-preserving primitives
pub mod graph;

/// Mutation events
pub mod events;

/// Undo log
pub mod undo;

/// Path finding
pub mod pathfinding;

/// Path-finding, multi-select and connection-drawing modes
pub mod selection;

/// Argument validation
pub mod validation;

/// Persistence collaborator interfaces
pub mod repository;
