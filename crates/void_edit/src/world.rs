//! The editable world
//!
//! [`World`] is the explicit context every change is applied against. It
//! owns the scene graph, the live-runtime binding and the undo history of
//! one replica. Authorities and observers both run one, and apply the
//! same changes in the same order.

use crate::change::{Change, Patch, PatchMode};
use crate::config::EditConfig;
use crate::error::{EditError, Result};
use crate::history::{Snapshot, SnapshotHash, UndoHistory};
use std::collections::{HashMap, HashSet};
use void_scene::{
    path_from, resolve, CodecError, InstantiateRequest, LiveRuntime, ModuleSet, NodeId, NodePath, PathNotFound,
    PropertyModule, Resolved, RuntimeError, RuntimeHandle, SceneError, SceneGraph, SceneNode, MAX_DEPTH,
};

/// Result of a successful [`World::apply`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The tree changed and listeners were notified
    Applied,
    /// A rollback named a hash this replica's history does not hold.
    /// The tree is unchanged and listeners were not notified.
    RollbackIgnored,
}

/// Callback run after each applied change
pub type WorldListener = Box<dyn FnMut(&Change) + Send>;

/// One replica of the shared world.
pub struct World<R: LiveRuntime> {
    graph: SceneGraph,
    handles: HashMap<NodeId, RuntimeHandle>,
    runtime: R,
    history: UndoHistory,
    config: EditConfig,
    listeners: Vec<WorldListener>,
}

impl<R: LiveRuntime> World<R> {
    /// Create an empty world bound to `runtime`
    pub fn new(runtime: R, config: EditConfig) -> Self {
        Self {
            graph: SceneGraph::new(),
            handles: HashMap::new(),
            runtime,
            history: UndoHistory::with_capacity(config.history_capacity),
            config,
            listeners: Vec::new(),
        }
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Mutable runtime access, for adapters feeding user manipulation in
    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    pub fn config(&self) -> &EditConfig {
        &self.config
    }

    /// Live object bound to a node
    pub fn handle_of(&self, id: NodeId) -> Option<RuntimeHandle> {
        self.handles.get(&id).copied()
    }

    /// Export the top-level value trees
    pub fn nodes(&self) -> Vec<SceneNode> {
        self.graph.to_nodes()
    }

    pub fn path_of(&self, id: NodeId) -> Option<NodePath> {
        path_from(&self.graph, id)
    }

    pub fn resolve(&self, path: &NodePath) -> std::result::Result<Resolved, PathNotFound> {
        resolve(&self.graph, path)
    }

    /// Hash of the current tree, computed the way undo snapshots are
    pub fn content_hash(&self) -> Result<SnapshotHash> {
        self.snapshot().map(|snapshot| snapshot.hash())
    }

    /// Register a listener for applied changes
    pub fn on_world_changed(&mut self, listener: impl FnMut(&Change) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Replace the whole tree with decoded nodes, e.g. from storage.
    ///
    /// Nothing is recorded in history, and any existing history is
    /// dropped. On failure the previous tree stays in place.
    pub async fn load(&mut self, nodes: Vec<SceneNode>) -> Result<()> {
        let count = nodes.len();
        self.replace_tree(nodes).await?;
        self.history.clear();
        log::info!("Loaded world with {} top-level nodes ({} total)", count, self.graph.len());
        Ok(())
    }

    /// Apply one change.
    ///
    /// Errors leave the tree untouched. Every change other than a
    /// rollback first snapshots the tree and records the snapshot once
    /// the change succeeds.
    pub async fn apply(&mut self, change: &Change) -> Result<ApplyOutcome> {
        let before = match change {
            Change::RollbackRequest { .. } => None,
            _ if self.config.snapshot_on_change => self.capture_for_history(),
            _ => None,
        };

        let outcome = match change {
            Change::Insertion { parent, node } => {
                self.apply_insertion(parent, node).await?;
                ApplyOutcome::Applied
            }
            Change::Deletion { path } => {
                self.apply_deletion(path)?;
                ApplyOutcome::Applied
            }
            Change::Patch(patch) => {
                self.apply_patch(patch)?;
                ApplyOutcome::Applied
            }
            Change::RollbackRequest { hash } => self.apply_rollback(*hash).await?,
        };

        if let Some(snapshot) = before {
            self.history.record(snapshot);
        }
        if outcome == ApplyOutcome::Applied {
            log::debug!("Applied {} ({} nodes)", change.kind_name(), self.graph.len());
            for listener in &mut self.listeners {
                listener(change);
            }
        }
        Ok(outcome)
    }

    /// Step back in history. Returns the rollback to submit, or `None`
    /// when there is nothing older.
    pub fn request_undo(&mut self) -> Option<Change> {
        let graph = &self.graph;
        self.history
            .request_undo(|| Snapshot::capture(&graph.to_nodes()))
            .map(Change::rollback)
    }

    /// Step forward in history. Returns the rollback to submit, or `None`
    /// when nothing has been undone.
    pub fn request_redo(&mut self) -> Option<Change> {
        self.history.request_redo().map(Change::rollback)
    }

    /// Pull live module state for `id` and build an incremental patch of
    /// whatever changed since the last commit. `None` if nothing did.
    ///
    /// The tree keeps its committed values until the patch is applied, so
    /// the undo snapshot taken then still holds the state from before the
    /// manipulation.
    pub fn collect_patch(&self, id: NodeId) -> Result<Option<Change>> {
        let path = self.path_or_missing(id)?;
        let handle = self.live_handle(id)?;
        let node = self.graph.get(id).ok_or_else(|| missing(id))?;

        let dirty: Vec<_> = node
            .modules()
            .iter()
            .filter_map(|module| {
                let mut scratch = module.clone();
                scratch.check_state(&self.runtime, handle).then(|| scratch.into_data())
            })
            .collect();
        if dirty.is_empty() {
            return Ok(None);
        }
        Ok(Some(Change::Patch(Patch::incremental(path, dirty))))
    }

    /// Build a complete patch carrying every module of `id`
    pub fn complete_patch(&self, id: NodeId) -> Result<Change> {
        let path = self.path_or_missing(id)?;
        let node = self.graph.get(id).ok_or_else(|| missing(id))?;
        Ok(Change::Patch(Patch::complete(path, node.modules().to_data())))
    }

    /// Build an insertion of a deep copy of `id`, with fresh ids, under
    /// the same parent
    pub fn duplicate(&self, id: NodeId) -> Result<Change> {
        let node = self.graph.node_value(id).ok_or_else(|| missing(id))?;
        let parent = match self.graph.get(id).and_then(|n| n.parent()) {
            Some(parent) => self.path_or_missing(parent)?,
            None => NodePath::root(),
        };
        Ok(Change::insertion(parent, node.duplicate()))
    }

    // ========================================================================
    // Change application
    // ========================================================================

    async fn apply_insertion(&mut self, parent: &NodePath, node: &SceneNode) -> Result<()> {
        let parent_id = self.resolve(parent)?.node();

        let depth = parent.len() + node.height();
        if depth > MAX_DEPTH {
            return Err(EditError::TooDeep { depth });
        }

        let mut seen = HashSet::new();
        for id in node.ids() {
            if self.graph.contains(id) || !seen.insert(id) {
                return Err(EditError::DuplicateNodeId(id));
            }
        }
        let parent_handle = match parent_id {
            Some(parent_id) => Some(self.live_handle(parent_id)?),
            None => None,
        };

        let id = node.id;
        self.graph.attach(parent_id, node.clone()).map_err(scene_error(id))?;

        let mut created = HashMap::new();
        let built = instantiate_subtree(&mut self.runtime, &mut self.graph, id, parent_handle, &mut created).await;
        if let Err(err) = built {
            destroy_all(&mut self.runtime, &created);
            if let Err(detach) = self.graph.detach(id) {
                log::error!("Failed to detach {} after instantiation error: {}", id, detach);
            }
            return Err(err.into());
        }
        self.handles.extend(created);
        Ok(())
    }

    fn apply_deletion(&mut self, path: &NodePath) -> Result<()> {
        let id = self.resolve_node(path)?;
        let doomed = self.graph.descendants(id);
        self.graph.detach(id).map_err(scene_error(id))?;

        if let Some(handle) = self.handles.get(&id) {
            self.runtime.destroy(*handle);
        }
        for doomed_id in doomed {
            self.handles.remove(&doomed_id);
        }
        Ok(())
    }

    fn apply_patch(&mut self, patch: &Patch) -> Result<()> {
        let id = self.resolve_node(&patch.path)?;
        let handle = self.live_handle(id)?;
        let node = self.graph.get_mut(id).ok_or_else(|| missing(id))?;

        let mut kinds = HashSet::new();
        for module in &patch.modules {
            if !kinds.insert(module.kind()) {
                return Err(EditError::DuplicateModuleKind(module.kind()));
            }
        }

        match patch.mode {
            PatchMode::Incremental => {
                if let Some(absent) = patch.modules.iter().find(|m| !node.modules().contains(m.kind())) {
                    return Err(EditError::ModuleKindMismatch { node: id, kind: absent.kind() });
                }
                for data in &patch.modules {
                    if let Some(module) = node.modules_mut().get_mut(data.kind()) {
                        module.replace_values(data).map_err(scene_error(id))?;
                        module.commit_state(&mut self.runtime, handle);
                    }
                }
            }
            PatchMode::Complete => {
                if let Some(kept) = node
                    .modules()
                    .iter()
                    .find(|m| !kinds.contains(&m.kind()) && !m.is_removable(node.asset()))
                {
                    return Err(EditError::MandatoryModule { node: id, kind: kept.kind() });
                }

                // Build the new set first so a failure leaves the node as it was.
                let mut previous = node.modules().clone();
                let mut next = ModuleSet::new();
                for data in &patch.modules {
                    let module = match previous.remove(data.kind()) {
                        Some(mut existing) => {
                            existing.replace_values(data).map_err(scene_error(id))?;
                            existing
                        }
                        None => PropertyModule::new(data.clone()),
                    };
                    next.insert(module).map_err(scene_error(id))?;
                }

                for dropped in previous.iter() {
                    self.runtime.remove_module(handle, dropped.kind());
                }
                for module in next.iter_mut() {
                    module.commit_state(&mut self.runtime, handle);
                }
                *node.modules_mut() = next;
            }
        }

        if let Some(name) = &patch.rename {
            node.set_name(name.as_str());
            self.runtime.set_name(handle, name);
        }
        Ok(())
    }

    async fn apply_rollback(&mut self, hash: SnapshotHash) -> Result<ApplyOutcome> {
        if !self.history.contains(hash) {
            log::warn!("Ignoring rollback to {}: not in local history", hash);
            return Ok(ApplyOutcome::RollbackIgnored);
        }
        let live = if self.history.is_navigating() {
            None
        } else {
            self.capture_for_history()
        };
        let nodes = match self.history.find_nearest(hash).and_then(|index| self.history.get(index)) {
            Some(snapshot) => snapshot.decode_nodes()?,
            None => return Ok(ApplyOutcome::RollbackIgnored),
        };

        // The live entry is only kept once the target tree is in place.
        self.replace_tree(nodes).await?;
        if let Some(live) = live {
            self.history.push_live(live);
        }
        match self.history.find_nearest(hash) {
            Some(index) => {
                self.history.navigate_to(index);
                log::info!("Rolled back to {} (history entry {})", hash, index);
            }
            None => log::warn!("Rolled back to {}, but it was evicted from local history", hash),
        }
        Ok(ApplyOutcome::Applied)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Build the new tree and its live objects, then tear the old ones
    /// down. If any instantiation fails the new objects are destroyed and
    /// the old tree stays.
    async fn replace_tree(&mut self, nodes: Vec<SceneNode>) -> Result<()> {
        let mut graph = SceneGraph::new();
        for node in nodes {
            let id = node.id;
            graph.attach(None, node).map_err(scene_error(id))?;
        }
        let mut handles = HashMap::new();

        for root in graph.roots().to_vec() {
            if let Err(err) = instantiate_subtree(&mut self.runtime, &mut graph, root, None, &mut handles).await {
                destroy_all(&mut self.runtime, &handles);
                return Err(err.into());
            }
        }

        for root in self.graph.roots() {
            if let Some(handle) = self.handles.get(root) {
                self.runtime.destroy(*handle);
            }
        }
        self.graph = graph;
        self.handles = handles;
        Ok(())
    }

    fn snapshot(&self) -> Result<Snapshot> {
        Snapshot::capture(&self.graph.to_nodes()).map_err(EditError::SerializationFailure)
    }

    fn capture_for_history(&self) -> Option<Snapshot> {
        match self.snapshot() {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                log::warn!("Skipping undo snapshot: {}", err);
                None
            }
        }
    }

    fn resolve_node(&self, path: &NodePath) -> Result<NodeId> {
        if path.is_root() {
            return Err(EditError::RootNotEditable);
        }
        match self.resolve(path)? {
            Resolved::Node(id) => Ok(id),
            Resolved::Root => Err(EditError::RootNotEditable),
        }
    }

    fn path_or_missing(&self, id: NodeId) -> Result<NodePath> {
        self.path_of(id).ok_or_else(|| missing(id))
    }

    fn live_handle(&self, id: NodeId) -> Result<RuntimeHandle> {
        self.handle_of(id)
            .ok_or(EditError::Runtime(RuntimeError::NotInstantiated(id)))
    }
}

/// Instantiate `root` and its descendants, parents first, committing every
/// module. Created handles are added to `handles` even on failure so the
/// caller can destroy them.
async fn instantiate_subtree<R: LiveRuntime>(
    runtime: &mut R,
    graph: &mut SceneGraph,
    root: NodeId,
    parent: Option<RuntimeHandle>,
    handles: &mut HashMap<NodeId, RuntimeHandle>,
) -> std::result::Result<(), RuntimeError> {
    for id in graph.descendants(root) {
        let Some(node) = graph.get_mut(id) else {
            continue;
        };
        let live_parent = if id == root {
            parent
        } else {
            node.parent().and_then(|p| handles.get(&p).copied())
        };

        let handle = runtime
            .instantiate(InstantiateRequest {
                id,
                parent: live_parent,
                asset: node.asset(),
                name: node.name(),
            })
            .await?;
        handles.insert(id, handle);

        for module in node.modules_mut().iter_mut() {
            module.commit_state(runtime, handle);
        }
    }
    Ok(())
}

fn destroy_all<R: LiveRuntime>(runtime: &mut R, handles: &HashMap<NodeId, RuntimeHandle>) {
    for handle in handles.values() {
        runtime.destroy(*handle);
    }
}

fn missing(id: NodeId) -> EditError {
    EditError::PathNotFound(PathNotFound {
        path: NodePath::root().child(id),
        depth: 0,
    })
}

/// Map a structural error raised while editing `node`
fn scene_error(node: NodeId) -> impl FnOnce(SceneError) -> EditError {
    move |err| match err {
        SceneError::DuplicateModule(kind) => EditError::DuplicateModuleKind(kind),
        SceneError::DuplicateNode(id) => EditError::DuplicateNodeId(id),
        SceneError::NodeNotFound(id) => missing(id),
        SceneError::UnknownTag { entity, tag } => EditError::Codec(CodecError::UnknownVariantTag { entity, tag }),
        SceneError::KindMismatch { found, .. } => EditError::ModuleKindMismatch { node, kind: found },
    }
}
