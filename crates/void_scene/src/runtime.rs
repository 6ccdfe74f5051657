//! Live runtime binding
//!
//! The live runtime renders nodes and reports user manipulation. The
//! engine drives it through [`LiveRuntime`] and never holds runtime
//! objects directly, only opaque [`RuntimeHandle`]s.
//!
//! [`HeadlessRuntime`] keeps the live state in memory. An authority with
//! no renderer runs on it, and so do the tests.

use crate::asset::AssetRef;
use crate::id::NodeId;
use crate::module::{ModuleData, ModuleKind};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Opaque reference to a live runtime object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuntimeHandle(u64);

impl RuntimeHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// What the runtime needs to build the object for one node
#[derive(Debug, Clone, Copy)]
pub struct InstantiateRequest<'a> {
    pub id: NodeId,
    /// Live parent, `None` for children of the world root
    pub parent: Option<RuntimeHandle>,
    pub asset: &'a AssetRef,
    pub name: &'a str,
}

/// Live runtime failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// The asset could not be loaded or built
    #[error("failed to load asset {asset}: {reason}")]
    AssetLoad { asset: String, reason: String },

    /// The parent handle does not refer to a live object
    #[error("unknown parent handle {0:?}")]
    UnknownParent(RuntimeHandle),

    /// A node in the tree has no live object bound to it
    #[error("node {0} has no live object")]
    NotInstantiated(NodeId),
}

/// Binding to the runtime that shows the scene.
#[async_trait]
pub trait LiveRuntime: Send {
    /// Build the live object for a node. May wait on asset loading.
    async fn instantiate(&mut self, request: InstantiateRequest<'_>) -> Result<RuntimeHandle, RuntimeError>;

    /// Destroy a live object and its entire live subtree
    fn destroy(&mut self, handle: RuntimeHandle);

    /// Push a module value into the live object
    fn commit_module(&mut self, handle: RuntimeHandle, module: &ModuleData);

    /// Drop a module from the live object
    fn remove_module(&mut self, handle: RuntimeHandle, kind: ModuleKind);

    /// Update the displayed name
    fn set_name(&mut self, handle: RuntimeHandle, name: &str);

    /// Current live value of a module, as the user may have changed it
    fn read_live_module_state(&self, handle: RuntimeHandle, kind: ModuleKind) -> Option<ModuleData>;

    /// Find the live object bound to a node id
    fn resolve_by_runtime_id(&self, id: NodeId) -> Option<RuntimeHandle>;
}

/// A live object held by [`HeadlessRuntime`]
#[derive(Debug, Clone)]
pub struct LiveObject {
    pub node: Option<NodeId>,
    pub parent: Option<RuntimeHandle>,
    pub asset: Option<AssetRef>,
    pub name: String,
    pub modules: HashMap<ModuleKind, ModuleData>,
}

/// In-memory live runtime.
#[derive(Debug, Default)]
pub struct HeadlessRuntime {
    next_handle: u64,
    objects: HashMap<RuntimeHandle, LiveObject>,
    by_node: HashMap<NodeId, RuntimeHandle>,
    rejected_assets: HashSet<AssetRef>,
    instantiated: u64,
}

impl HeadlessRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later instantiation of `asset` fail
    pub fn reject_asset(&mut self, asset: AssetRef) {
        self.rejected_assets.insert(asset);
    }

    /// Allocate a live object that is not bound to any node
    pub fn spawn_detached(&mut self) -> RuntimeHandle {
        let handle = self.allocate();
        self.objects.insert(
            handle,
            LiveObject {
                node: None,
                parent: None,
                asset: None,
                name: String::new(),
                modules: HashMap::new(),
            },
        );
        handle
    }

    /// Change a live module value the way a user manipulation would
    pub fn set_live_module(&mut self, handle: RuntimeHandle, module: ModuleData) {
        if let Some(object) = self.objects.get_mut(&handle) {
            object.modules.insert(module.kind(), module);
        }
    }

    pub fn live_module(&self, handle: RuntimeHandle, kind: ModuleKind) -> Option<&ModuleData> {
        self.objects.get(&handle)?.modules.get(&kind)
    }

    pub fn object(&self, handle: RuntimeHandle) -> Option<&LiveObject> {
        self.objects.get(&handle)
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Total successful instantiations since creation
    pub fn instantiated_count(&self) -> u64 {
        self.instantiated
    }

    fn allocate(&mut self) -> RuntimeHandle {
        self.next_handle += 1;
        RuntimeHandle(self.next_handle)
    }
}

#[async_trait]
impl LiveRuntime for HeadlessRuntime {
    async fn instantiate(&mut self, request: InstantiateRequest<'_>) -> Result<RuntimeHandle, RuntimeError> {
        if self.rejected_assets.contains(request.asset) {
            return Err(RuntimeError::AssetLoad {
                asset: request.asset.to_string(),
                reason: "rejected".to_string(),
            });
        }
        if let Some(parent) = request.parent {
            if !self.objects.contains_key(&parent) {
                return Err(RuntimeError::UnknownParent(parent));
            }
        }

        let handle = self.allocate();
        self.objects.insert(
            handle,
            LiveObject {
                node: Some(request.id),
                parent: request.parent,
                asset: Some(request.asset.clone()),
                name: request.name.to_string(),
                modules: HashMap::new(),
            },
        );
        self.by_node.insert(request.id, handle);
        self.instantiated += 1;
        Ok(handle)
    }

    fn destroy(&mut self, handle: RuntimeHandle) {
        let mut doomed = vec![handle];
        let mut index = 0;
        while index < doomed.len() {
            let current = doomed[index];
            doomed.extend(
                self.objects
                    .iter()
                    .filter(|(_, object)| object.parent == Some(current))
                    .map(|(child, _)| *child),
            );
            index += 1;
        }

        for handle in doomed {
            if let Some(object) = self.objects.remove(&handle) {
                if let Some(node) = object.node {
                    if self.by_node.get(&node) == Some(&handle) {
                        self.by_node.remove(&node);
                    }
                }
            }
        }
    }

    fn commit_module(&mut self, handle: RuntimeHandle, module: &ModuleData) {
        self.set_live_module(handle, module.clone());
    }

    fn remove_module(&mut self, handle: RuntimeHandle, kind: ModuleKind) {
        if let Some(object) = self.objects.get_mut(&handle) {
            object.modules.remove(&kind);
        }
    }

    fn set_name(&mut self, handle: RuntimeHandle, name: &str) {
        if let Some(object) = self.objects.get_mut(&handle) {
            object.name = name.to_string();
        }
    }

    fn read_live_module_state(&self, handle: RuntimeHandle, kind: ModuleKind) -> Option<ModuleData> {
        self.live_module(handle, kind).cloned()
    }

    fn resolve_by_runtime_id(&self, id: NodeId) -> Option<RuntimeHandle> {
        self.by_node.get(&id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::PrimitiveShape;
    use crate::module::Color;

    const CUBE: AssetRef = AssetRef::Primitive(PrimitiveShape::Cube);

    #[tokio::test]
    async fn test_instantiate_and_destroy_subtree() {
        let mut runtime = HeadlessRuntime::new();
        let parent_id = NodeId::new();
        let child_id = NodeId::new();

        let parent = runtime
            .instantiate(InstantiateRequest { id: parent_id, parent: None, asset: &CUBE, name: "Parent" })
            .await
            .unwrap();
        runtime
            .instantiate(InstantiateRequest { id: child_id, parent: Some(parent), asset: &CUBE, name: "Child" })
            .await
            .unwrap();
        assert_eq!(runtime.len(), 2);
        assert_eq!(runtime.resolve_by_runtime_id(parent_id), Some(parent));

        runtime.destroy(parent);
        assert!(runtime.is_empty());
        assert_eq!(runtime.resolve_by_runtime_id(child_id), None);
    }

    #[tokio::test]
    async fn test_rejected_asset_fails() {
        let mut runtime = HeadlessRuntime::new();
        runtime.reject_asset(CUBE);
        let result = runtime
            .instantiate(InstantiateRequest { id: NodeId::new(), parent: None, asset: &CUBE, name: "Cube" })
            .await;
        assert!(matches!(result, Err(RuntimeError::AssetLoad { .. })));
        assert!(runtime.is_empty());
    }

    #[test]
    fn test_module_commit_and_read_back() {
        let mut runtime = HeadlessRuntime::new();
        let handle = runtime.spawn_detached();
        runtime.commit_module(handle, &Color::RED.into());
        assert_eq!(
            runtime.read_live_module_state(handle, ModuleKind::Color),
            Some(ModuleData::Color(Color::RED))
        );
        runtime.remove_module(handle, ModuleKind::Color);
        assert_eq!(runtime.read_live_module_state(handle, ModuleKind::Color), None);
    }
}
