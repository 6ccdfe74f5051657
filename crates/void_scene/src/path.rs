//! Node paths
//!
//! A path is the sequence of node ids from the implicit world root
//! (exclusive) down to a node (inclusive). The empty path addresses the
//! world root itself. Paths are computed on demand and never cached past
//! a single operation.

use crate::graph::SceneGraph;
use crate::id::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Ordered ids from the world root to a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct NodePath(Vec<NodeId>);

impl NodePath {
    /// The path of the world root
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, id: NodeId) {
        self.0.push(id);
    }

    /// Path extended by one segment
    pub fn child(&self, id: NodeId) -> Self {
        let mut path = self.clone();
        path.push(id);
        path
    }

    /// Path of the parent, `None` for the root
    pub fn parent(&self) -> Option<NodePath> {
        let (_, parent) = self.0.split_last()?;
        Some(Self(parent.to_vec()))
    }

    /// Final segment, `None` for the root
    pub fn last(&self) -> Option<NodeId> {
        self.0.last().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeId> {
        self.0.iter()
    }

    pub fn segments(&self) -> &[NodeId] {
        &self.0
    }
}

impl From<Vec<NodeId>> for NodePath {
    fn from(ids: Vec<NodeId>) -> Self {
        Self(ids)
    }
}

impl FromIterator<NodeId> for NodePath {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for id in &self.0 {
            write!(f, "/{}", id)?;
        }
        Ok(())
    }
}

/// A path segment has no match among the children of its predecessor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("path not found: {path} (segment {depth} unresolved)")]
pub struct PathNotFound {
    pub path: NodePath,
    /// Index of the first segment that failed to resolve
    pub depth: usize,
}

/// Target of a resolved path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    /// The empty path
    Root,
    Node(NodeId),
}

impl Resolved {
    /// The node id, `None` for the world root
    pub fn node(self) -> Option<NodeId> {
        match self {
            Self::Root => None,
            Self::Node(id) => Some(id),
        }
    }
}

/// Walk `path` from the world root, matching each id against the direct
/// children of the current node.
pub fn resolve(graph: &SceneGraph, path: &NodePath) -> Result<Resolved, PathNotFound> {
    let mut current = None;
    for (depth, id) in path.iter().enumerate() {
        let children = graph.children_of(current).unwrap_or(&[]);
        if !children.contains(id) {
            return Err(PathNotFound {
                path: path.clone(),
                depth,
            });
        }
        current = Some(*id);
    }
    Ok(current.map_or(Resolved::Root, Resolved::Node))
}

/// Follow parent links from `id` up to the world root and return the
/// path. `None` if `id` is not in the graph.
pub fn path_from(graph: &SceneGraph, id: NodeId) -> Option<NodePath> {
    let mut ids = Vec::new();
    let mut current = Some(id);
    while let Some(next) = current {
        let node = graph.get(next)?;
        ids.push(next);
        current = node.parent();
    }
    ids.reverse();
    Some(NodePath(ids))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetRef, PrimitiveShape};
    use crate::node::SceneNode;

    fn cube(name: &str) -> SceneNode {
        SceneNode::new(AssetRef::Primitive(PrimitiveShape::Cube), name)
    }

    fn sample() -> (SceneGraph, Vec<NodeId>) {
        let leaf = cube("Leaf");
        let mid = cube("Mid").with_child(leaf.clone());
        let top = cube("Top").with_child(mid.clone());
        let other = cube("Other");
        let ids = vec![top.id, mid.id, leaf.id, other.id];
        (SceneGraph::from_nodes([top, other]).unwrap(), ids)
    }

    #[test]
    fn test_empty_path_is_root() {
        let (graph, _) = sample();
        assert_eq!(resolve(&graph, &NodePath::root()), Ok(Resolved::Root));
        assert_eq!(NodePath::root().to_string(), "/");
    }

    #[test]
    fn test_round_trip_for_every_node() {
        let (graph, ids) = sample();
        for id in ids {
            let path = path_from(&graph, id).unwrap();
            assert_eq!(resolve(&graph, &path), Ok(Resolved::Node(id)));
        }
    }

    #[test]
    fn test_segment_must_be_direct_child() {
        let (graph, ids) = sample();
        let skipping = NodePath::from(vec![ids[0], ids[2]]);
        let err = resolve(&graph, &skipping).unwrap_err();
        assert_eq!(err.depth, 1);

        let unknown = NodePath::from(vec![NodeId::new()]);
        assert_eq!(resolve(&graph, &unknown).unwrap_err().depth, 0);
        assert!(path_from(&graph, NodeId::new()).is_none());
    }

    #[test]
    fn test_parent_and_child_paths() {
        let a = NodeId::new();
        let b = NodeId::new();
        let path = NodePath::root().child(a).child(b);
        assert_eq!(path.len(), 2);
        assert_eq!(path.last(), Some(b));
        assert_eq!(path.parent(), Some(NodePath::from(vec![a])));
        assert_eq!(NodePath::root().parent(), None);
    }
}
