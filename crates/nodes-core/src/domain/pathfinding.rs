//! Connectivity paths through active nodes.
//!
//! A path is an ordered list of node ids from start to end. Traversal only
//! follows connections whose target is active and never visits a node twice
//! within one path. Both endpoints must be active themselves.

use std::collections::{HashMap, HashSet, VecDeque};

use super::graph::Graph;
use super::node::NodeId;

/// Ordered node ids from start to end
pub type Path = Vec<NodeId>;

/// Find paths from `start` to `end`.
///
/// Runs a breadth-first search first and returns its single result, the
/// first shortest path discovered in connection order. Only when that finds
/// nothing does it fall back to enumerating every simple path depth-first.
/// An empty result means the two nodes are not connected through active
/// nodes; callers wanting the route to display take the first entry.
pub fn find_paths(graph: &Graph, start: NodeId, end: NodeId) -> Vec<Path> {
    if let Some(path) = shortest_path(graph, start, end) {
        return vec![path];
    }
    all_simple_paths(graph, start, end)
}

/// Whether any path joins `start` and `end`
pub fn has_path(graph: &Graph, start: NodeId, end: NodeId) -> bool {
    !find_paths(graph, start, end).is_empty()
}

/// Shortest path by edge count, ties broken by discovery order
pub fn shortest_path(graph: &Graph, start: NodeId, end: NodeId) -> Option<Path> {
    if !graph.is_active(start) || !graph.is_active(end) {
        return None;
    }

    let mut parents: HashMap<NodeId, NodeId> = HashMap::new();
    let mut visited: HashSet<NodeId> = HashSet::from([start]);
    let mut queue: VecDeque<NodeId> = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        if current == end {
            return Some(reconstruct(&parents, start, end));
        }

        let Some(node) = graph.node(current) else {
            continue;
        };
        for next in node.neighbor_ids() {
            if visited.contains(&next) || !graph.is_active(next) {
                continue;
            }
            visited.insert(next);
            parents.insert(next, current);
            queue.push_back(next);
        }
    }

    None
}

/// Every simple path from `start` to `end`, in depth-first discovery order.
///
/// Exponential in the worst case; fine for classroom-sized graphs.
pub fn all_simple_paths(graph: &Graph, start: NodeId, end: NodeId) -> Vec<Path> {
    if !graph.is_active(start) || !graph.is_active(end) {
        return Vec::new();
    }

    let mut paths = Vec::new();
    let mut path = vec![start];
    let mut on_path = HashSet::from([start]);
    walk(graph, end, &mut path, &mut on_path, &mut paths);
    paths
}

fn walk(
    graph: &Graph,
    end: NodeId,
    path: &mut Path,
    on_path: &mut HashSet<NodeId>,
    paths: &mut Vec<Path>,
) {
    let Some(&current) = path.last() else {
        return;
    };
    if current == end {
        paths.push(path.clone());
        return;
    }
    let Some(node) = graph.node(current) else {
        return;
    };

    for next in node.neighbor_ids() {
        if on_path.contains(&next) || !graph.is_active(next) {
            continue;
        }
        path.push(next);
        on_path.insert(next);
        walk(graph, end, path, on_path, paths);
        on_path.remove(&next);
        path.pop();
    }
}

fn reconstruct(parents: &HashMap<NodeId, NodeId>, start: NodeId, end: NodeId) -> Path {
    let mut path = vec![end];
    let mut current = end;
    while current != start {
        match parents.get(&current) {
            Some(&parent) => {
                path.push(parent);
                current = parent;
            }
            None => break,
        }
    }
    path.reverse();
    path
}
