//! Scene node value trees
//!
//! [`SceneNode`] is the owned, self-contained form of a node and its
//! subtree. It is what insertions carry, what the codec writes, and what
//! snapshots and stored worlds decode back into. The live, addressable
//! tree is [`SceneGraph`](crate::graph::SceneGraph).

use crate::asset::AssetRef;
use crate::id::NodeId;
use crate::module::{default_modules_for, ModuleData, ModuleKind, ModuleSet};

/// A placed object and its children.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub id: NodeId,
    pub asset: AssetRef,
    pub name: String,
    pub modules: ModuleSet,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Create a node with a fresh id and the default modules for `asset`
    pub fn new(asset: AssetRef, name: impl Into<String>) -> Self {
        let modules = default_modules_for(&asset);
        Self {
            id: NodeId::new(),
            asset,
            name: name.into(),
            modules,
            children: Vec::new(),
        }
    }

    /// Create a node from explicit parts
    pub fn from_parts(id: NodeId, asset: AssetRef, name: impl Into<String>, modules: ModuleSet) -> Self {
        Self {
            id,
            asset,
            name: name.into(),
            modules,
            children: Vec::new(),
        }
    }

    /// Set a module value, replacing any module of the same kind in place
    pub fn with_module(mut self, data: impl Into<ModuleData>) -> Self {
        self.set_module(data.into());
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Replace the same-kind module's value, or append a new module
    pub fn set_module(&mut self, data: ModuleData) {
        self.modules.set(data);
    }

    pub fn module(&self, kind: ModuleKind) -> Option<&ModuleData> {
        self.modules.get(kind).map(|m| m.data())
    }

    /// Levels in this subtree. A leaf has height 1.
    pub fn height(&self) -> usize {
        1 + self.children.iter().map(SceneNode::height).max().unwrap_or(0)
    }

    /// Number of nodes in this subtree, including this one
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(SceneNode::subtree_len).sum::<usize>()
    }

    /// Ids of this subtree in pre-order
    pub fn ids(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.subtree_len());
        self.collect_ids(&mut out);
        out
    }

    fn collect_ids(&self, out: &mut Vec<NodeId>) {
        out.push(self.id);
        for child in &self.children {
            child.collect_ids(out);
        }
    }

    /// Deep copy in which every node of the subtree gets a fresh id
    pub fn duplicate(&self) -> SceneNode {
        SceneNode {
            id: NodeId::new(),
            asset: self.asset.clone(),
            name: self.name.clone(),
            modules: self.modules.uncommitted_copy(),
            children: self.children.iter().map(SceneNode::duplicate).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::PrimitiveShape;
    use crate::module::{Color, Transform};

    fn cube(name: &str) -> SceneNode {
        SceneNode::new(AssetRef::Primitive(PrimitiveShape::Cube), name)
    }

    #[test]
    fn test_with_module_replaces_in_place() {
        let node = cube("Cube").with_module(Color::RED);
        assert_eq!(node.modules.kinds(), vec![ModuleKind::Transform, ModuleKind::Color]);
        assert_eq!(node.module(ModuleKind::Color), Some(&ModuleData::Color(Color::RED)));
    }

    #[test]
    fn test_subtree_ids_pre_order() {
        let leaf = cube("Leaf");
        let mid = cube("Mid").with_child(leaf.clone());
        let mid_id = mid.id;
        let root = cube("Root").with_child(mid).with_child(cube("Other"));

        let ids = root.ids();
        assert_eq!(ids.len(), 4);
        assert_eq!(ids[0], root.id);
        assert_eq!(ids[1], mid_id);
        assert_eq!(ids[2], leaf.id);
    }

    #[test]
    fn test_duplicate_gets_fresh_ids() {
        let original = cube("Crate")
            .with_module(Transform::from_position(glam::Vec3::X))
            .with_child(cube("Lid"));
        let copy = original.duplicate();

        assert_ne!(copy.id, original.id);
        assert_ne!(copy.children[0].id, original.children[0].id);
        assert_eq!(copy.modules, original.modules);
        assert_eq!(copy.name, "Crate");
    }

    #[test]
    fn test_height_counts_levels() {
        assert_eq!(cube("Leaf").height(), 1);
        let tree = cube("Root")
            .with_child(cube("Shallow"))
            .with_child(cube("Mid").with_child(cube("Deep")));
        assert_eq!(tree.height(), 3);
    }
}
