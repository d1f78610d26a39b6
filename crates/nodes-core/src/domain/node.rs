//! Node and connection domain models

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Value object: Node ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Generate a fresh, unique node id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Value object: Connection ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Generate a fresh, unique connection id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Value object: 2D canvas coordinate
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Position {
    /// Create a position
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The origin
    pub const ZERO: Position = Position::new(0.0, 0.0);
}

/// One directed half of a labeled undirected relationship.
///
/// The half is owned by the node named in `from_node_id`; its mirror is
/// owned by `to_node_id` and carries the same `common_interest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// Unique identifier of this half
    pub id: ConnectionId,

    /// Owning node
    pub from_node_id: NodeId,

    /// Target node
    pub to_node_id: NodeId,

    /// Relationship label shared by both halves
    pub common_interest: String,
}

impl Connection {
    /// Create a connection half with a fresh id
    pub fn new(from_node_id: NodeId, to_node_id: NodeId, common_interest: impl Into<String>) -> Self {
        Self {
            id: ConnectionId::new(),
            from_node_id,
            to_node_id,
            common_interest: common_interest.into(),
        }
    }

    /// Build the mirror half (fresh id, endpoints swapped, same label)
    pub fn mirrored(&self) -> Self {
        Self::new(self.to_node_id, self.from_node_id, self.common_interest.clone())
    }

    /// Whether this half joins `a` and `b`, in either direction
    #[inline]
    pub fn joins(&self, a: NodeId, b: NodeId) -> bool {
        (self.from_node_id == a && self.to_node_id == b)
            || (self.from_node_id == b && self.to_node_id == a)
    }

    /// Whether `other` is this half's mirror
    pub fn is_mirror_of(&self, other: &Connection) -> bool {
        self.from_node_id == other.to_node_id
            && self.to_node_id == other.from_node_id
            && self.common_interest == other.common_interest
    }
}

/// Aggregate: a student in the classroom network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier
    pub id: NodeId,

    /// Display name
    pub name: String,

    /// Canvas position
    pub position: Position,

    /// Inactive nodes are excluded from path traversal
    pub is_active: bool,

    /// Outgoing halves; every entry has `from_node_id == id`
    pub connections: Vec<Connection>,
}

impl Node {
    /// Create an active node with a fresh id and no connections
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            id: NodeId::new(),
            name: name.into(),
            position,
            is_active: true,
            connections: Vec::new(),
        }
    }

    /// Strip the connection list, producing the persisted record shape
    pub fn record(&self) -> NodeRecord {
        NodeRecord {
            id: self.id,
            name: self.name.clone(),
            position: self.position,
            is_active: self.is_active,
        }
    }

    /// The half owned by this node that points at `to`
    pub fn connection_to(&self, to: NodeId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.to_node_id == to)
    }

    /// Ids of the nodes this node points at, in connection order
    pub fn neighbor_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.connections.iter().map(|c| c.to_node_id)
    }
}

/// A node without its connection list, as persisted and exported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Unique identifier
    pub id: NodeId,

    /// Display name
    pub name: String,

    /// Canvas position
    pub position: Position,

    /// Activity flag
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl From<NodeRecord> for Node {
    fn from(record: NodeRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            position: record.position,
            is_active: record.is_active,
            connections: Vec::new(),
        }
    }
}
