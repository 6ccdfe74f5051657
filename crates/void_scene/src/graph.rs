//! The live scene graph
//!
//! An arena of nodes keyed by [`NodeId`] with explicit parent links and
//! ordered child lists. The implicit world root is not a node: its
//! children are the graph's [`roots`](SceneGraph::roots).

use crate::asset::AssetRef;
use crate::error::{SceneError, SceneResult};
use crate::id::NodeId;
use crate::module::ModuleSet;
use crate::node::SceneNode;
use std::collections::{HashMap, HashSet};

/// A node stored in the graph.
#[derive(Debug, Clone)]
pub struct GraphNode {
    id: NodeId,
    asset: AssetRef,
    name: String,
    modules: ModuleSet,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl GraphNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The asset is fixed for the lifetime of the node
    pub fn asset(&self) -> &AssetRef {
        &self.asset
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn modules(&self) -> &ModuleSet {
        &self.modules
    }

    pub fn modules_mut(&mut self) -> &mut ModuleSet {
        &mut self.modules
    }

    /// Parent node, `None` for children of the world root
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Arena-backed scene tree.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: HashMap<NodeId, GraphNode>,
    roots: Vec<NodeId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from top-level value trees
    pub fn from_nodes(nodes: impl IntoIterator<Item = SceneNode>) -> SceneResult<Self> {
        let mut graph = Self::new();
        for node in nodes {
            graph.attach(None, node)?;
        }
        Ok(graph)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut GraphNode> {
        self.nodes.get_mut(&id)
    }

    /// Children of the world root, in order
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Child list of `parent`, where `None` is the world root
    pub fn children_of(&self, parent: Option<NodeId>) -> Option<&[NodeId]> {
        match parent {
            None => Some(&self.roots),
            Some(id) => self.nodes.get(&id).map(|n| n.children.as_slice()),
        }
    }

    /// Attach `node` and its nested children as the last child of `parent`.
    ///
    /// Nothing is attached if the parent is missing or any id in the
    /// subtree is already taken.
    pub fn attach(&mut self, parent: Option<NodeId>, node: SceneNode) -> SceneResult<()> {
        if let Some(parent_id) = parent {
            if !self.nodes.contains_key(&parent_id) {
                return Err(SceneError::NodeNotFound(parent_id));
            }
        }

        let mut seen = HashSet::new();
        for id in node.ids() {
            if self.nodes.contains_key(&id) || !seen.insert(id) {
                return Err(SceneError::DuplicateNode(id));
            }
        }

        let id = node.id;
        self.insert_subtree(parent, node);
        match parent {
            None => self.roots.push(id),
            Some(parent_id) => {
                if let Some(parent_node) = self.nodes.get_mut(&parent_id) {
                    parent_node.children.push(id);
                }
            }
        }
        Ok(())
    }

    fn insert_subtree(&mut self, parent: Option<NodeId>, node: SceneNode) {
        let SceneNode {
            id,
            asset,
            name,
            modules,
            children,
        } = node;

        let child_ids = children.iter().map(|c| c.id).collect();
        self.nodes.insert(
            id,
            GraphNode {
                id,
                asset,
                name,
                modules,
                parent,
                children: child_ids,
            },
        );
        for child in children {
            self.insert_subtree(Some(id), child);
        }
    }

    /// Remove the subtree rooted at `id` and return it as a value tree
    pub fn detach(&mut self, id: NodeId) -> SceneResult<SceneNode> {
        let parent = self.nodes.get(&id).ok_or(SceneError::NodeNotFound(id))?.parent;
        match parent {
            None => self.roots.retain(|r| *r != id),
            Some(parent_id) => {
                if let Some(parent_node) = self.nodes.get_mut(&parent_id) {
                    parent_node.children.retain(|c| *c != id);
                }
            }
        }
        self.take_subtree(id).ok_or(SceneError::NodeNotFound(id))
    }

    fn take_subtree(&mut self, id: NodeId) -> Option<SceneNode> {
        let node = self.nodes.remove(&id)?;
        let children = node
            .children
            .iter()
            .filter_map(|child| self.take_subtree(*child))
            .collect();
        Some(SceneNode {
            id: node.id,
            asset: node.asset,
            name: node.name,
            modules: node.modules,
            children,
        })
    }

    /// Clone the subtree rooted at `id` into a value tree
    pub fn node_value(&self, id: NodeId) -> Option<SceneNode> {
        let node = self.nodes.get(&id)?;
        Some(SceneNode {
            id: node.id,
            asset: node.asset.clone(),
            name: node.name.clone(),
            modules: node.modules.clone(),
            children: node
                .children
                .iter()
                .filter_map(|child| self.node_value(*child))
                .collect(),
        })
    }

    /// Export all top-level subtrees, in root order
    pub fn to_nodes(&self) -> Vec<SceneNode> {
        self.roots.iter().filter_map(|id| self.node_value(*id)).collect()
    }

    /// `id` and all of its descendants, in pre-order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.get(&next) {
                out.push(next);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
    }
}
