//! Integration tests for void_edit (worlds, history, bus and storage)

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use void_edit::*;
use void_scene::{
    decode_world, encode_world, AssetRef, Color, HeadlessRuntime, LiveRuntime, ModuleData, ModuleKind, NodeId,
    NodePath, PrimitiveShape, Resolved, RuntimeError, SceneNode, Transform, Vec3, MAX_DEPTH,
};

const CUBE: AssetRef = AssetRef::Primitive(PrimitiveShape::Cube);

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn new_world() -> World<HeadlessRuntime> {
    init_logging();
    World::new(HeadlessRuntime::new(), EditConfig::testing())
}

fn cube(name: &str) -> SceneNode {
    SceneNode::new(CUBE, name)
}

/// Two rooms, one holding a table with a lamp on it
fn sample_world() -> Vec<SceneNode> {
    let lamp = SceneNode::new(AssetRef::kit_item("Qm-furniture", "lamp"), "Lamp");
    let table = SceneNode::new(AssetRef::kit_item("Qm-furniture", "table"), "Table").with_child(lamp);
    vec![
        SceneNode::new(AssetRef::embedded("Qm-room-a"), "Room A").with_child(table),
        SceneNode::new(AssetRef::embedded("Qm-room-b"), "Room B").with_child(cube("Crate")),
    ]
}

fn live_color(world: &World<HeadlessRuntime>, id: NodeId) -> Option<ModuleData> {
    let handle = world.handle_of(id)?;
    world.runtime().read_live_module_state(handle, ModuleKind::Color)
}

// ============================================================================
// Paths
// ============================================================================

#[tokio::test]
async fn test_path_round_trip_for_every_node() {
    let mut world = new_world();
    world.load(sample_world()).await.unwrap();

    let ids: Vec<NodeId> = world
        .graph()
        .roots()
        .iter()
        .flat_map(|root| world.graph().descendants(*root))
        .collect();
    assert_eq!(ids.len(), 5);

    for id in ids {
        let path = world.path_of(id).unwrap();
        assert_eq!(world.resolve(&path).unwrap(), Resolved::Node(id));
    }
    assert_eq!(world.resolve(&NodePath::root()).unwrap(), Resolved::Root);
}

// ============================================================================
// Insertion and deletion
// ============================================================================

#[tokio::test]
async fn test_insert_then_delete_restores_parent() {
    let mut world = new_world();
    world.load(sample_world()).await.unwrap();
    let room = world.graph().roots()[0];
    let before = world.graph().node_value(room).unwrap();
    let live_before = world.runtime().len();

    let chair = SceneNode::new(AssetRef::kit_item("Qm-furniture", "chair"), "Chair").with_child(cube("Cushion"));
    let chair_id = chair.id;
    world
        .apply(&Change::insertion(world.path_of(room).unwrap(), chair))
        .await
        .unwrap();
    assert_eq!(world.graph().get(room).unwrap().children().last(), Some(&chair_id));
    assert_eq!(world.runtime().len(), live_before + 2);

    let path = world.path_of(chair_id).unwrap();
    world.apply(&Change::deletion(path)).await.unwrap();
    assert_eq!(world.graph().node_value(room).unwrap(), before);
    assert_eq!(world.runtime().len(), live_before);
}

#[tokio::test]
async fn test_insertion_commits_modules_to_runtime() {
    let mut world = new_world();
    let node = cube("Cube").with_module(Transform::from_position(Vec3::new(0.0, 1.0, 5.0)));
    let id = node.id;
    world.apply(&Change::insertion(NodePath::root(), node)).await.unwrap();

    let handle = world.handle_of(id).unwrap();
    let object = world.runtime().object(handle).unwrap();
    assert_eq!(object.name, "Cube");
    assert_eq!(object.modules.len(), 2);
    assert_eq!(live_color(&world, id), Some(ModuleData::Color(Color::GRAY)));
}

#[tokio::test]
async fn test_stale_deletion_is_reported() {
    let mut world = new_world();
    let node = cube("Cube");
    let path = NodePath::root().child(node.id);
    world.apply(&Change::insertion(NodePath::root(), node)).await.unwrap();

    world.apply(&Change::deletion(path.clone())).await.unwrap();
    let err = world.apply(&Change::deletion(path)).await.unwrap_err();
    assert!(matches!(err, EditError::PathNotFound(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_insertion_errors_leave_tree_untouched() {
    let mut world = new_world();
    let node = cube("Cube");
    world.apply(&Change::insertion(NodePath::root(), node.clone())).await.unwrap();
    let hash = world.content_hash().unwrap();

    let err = world.apply(&Change::insertion(NodePath::root(), node)).await.unwrap_err();
    assert!(matches!(err, EditError::DuplicateNodeId(_)));

    let orphan_parent = NodePath::root().child(NodeId::new());
    let err = world
        .apply(&Change::insertion(orphan_parent, cube("Orphan")))
        .await
        .unwrap_err();
    assert!(matches!(err, EditError::PathNotFound(_)));

    assert_eq!(world.content_hash().unwrap(), hash);
    assert_eq!(world.runtime().len(), 1);
}

#[tokio::test]
async fn test_failed_instantiation_rolls_back_insertion() {
    let mut world = new_world();
    let broken = AssetRef::embedded("Qm-broken");
    world.runtime_mut().reject_asset(broken.clone());

    let parent = cube("Parent").with_child(SceneNode::new(broken, "Broken"));
    let err = world.apply(&Change::insertion(NodePath::root(), parent)).await.unwrap_err();
    assert!(matches!(err, EditError::Runtime(RuntimeError::AssetLoad { .. })));
    assert!(world.graph().is_empty());
    assert!(world.runtime().is_empty());
    assert!(world.history().is_empty());
}

// ============================================================================
// Patches
// ============================================================================

/// A chain of `levels` nodes, returned with the id of its deepest node
fn chain(levels: usize) -> (SceneNode, NodeId) {
    let mut node = cube("Link");
    let deepest = node.id;
    for _ in 1..levels {
        node = cube("Link").with_child(node);
    }
    (node, deepest)
}

#[tokio::test]
async fn test_insertion_depth_is_bounded() {
    let mut world = new_world();
    let (tower, _) = chain(MAX_DEPTH + 1);
    let err = world.apply(&Change::insertion(NodePath::root(), tower)).await.unwrap_err();
    assert!(matches!(err, EditError::TooDeep { depth } if depth == MAX_DEPTH + 1));
    assert!(world.graph().is_empty());

    let (tower, deepest) = chain(MAX_DEPTH - 1);
    world.apply(&Change::insertion(NodePath::root(), tower)).await.unwrap();
    let h1 = world.content_hash().unwrap();

    let top = cube("Top");
    let top_id = top.id;
    world.apply(&Change::insertion(world.path_of(deepest).unwrap(), top)).await.unwrap();
    let err = world
        .apply(&Change::insertion(world.path_of(top_id).unwrap(), cube("Overflow")))
        .await
        .unwrap_err();
    assert!(matches!(err, EditError::TooDeep { .. }));
    assert!(!err.is_retryable());
    assert_eq!(world.graph().len(), MAX_DEPTH);

    // Everything that could be inserted can be saved, loaded and rolled back to.
    let bytes = encode_world(&world.nodes()).unwrap();
    assert_eq!(decode_world(&bytes).unwrap(), world.nodes());
    assert_eq!(world.apply(&Change::rollback(h1)).await.unwrap(), ApplyOutcome::Applied);
    assert_eq!(world.content_hash().unwrap(), h1);
}

#[tokio::test]
async fn test_complete_patch_is_idempotent() {
    let mut world = new_world();
    let node = cube("Cube");
    let id = node.id;
    world.apply(&Change::insertion(NodePath::root(), node)).await.unwrap();

    let patch = Change::Patch(Patch::complete(
        world.path_of(id).unwrap(),
        vec![
            Transform::from_position(Vec3::new(2.0, 0.0, 0.0)).into(),
            Color::BLUE.into(),
            void_scene::Light::default().into(),
        ],
    ));
    world.apply(&patch).await.unwrap();
    let once_hash = world.content_hash().unwrap();
    let handle = world.handle_of(id).unwrap();
    let once_live = world.runtime().object(handle).unwrap().modules.clone();

    world.apply(&patch).await.unwrap();
    assert_eq!(world.content_hash().unwrap(), once_hash);
    assert_eq!(world.runtime().object(handle).unwrap().modules, once_live);
    assert_eq!(once_live.len(), 3);
}

#[tokio::test]
async fn test_complete_patch_adds_and_removes_modules() {
    let mut world = new_world();
    let node = cube("Cube").with_module(void_scene::Physics::default());
    let id = node.id;
    world.apply(&Change::insertion(NodePath::root(), node)).await.unwrap();
    let path = world.path_of(id).unwrap();

    let modules = vec![
        Transform::default().into(),
        Color::GRAY.into(),
        void_scene::RigidBody::default().into(),
    ];
    world.apply(&Change::Patch(Patch::complete(path, modules))).await.unwrap();

    let kinds = world.graph().get(id).unwrap().modules().kinds();
    assert_eq!(kinds, vec![ModuleKind::Transform, ModuleKind::Color, ModuleKind::RigidBody]);
    let handle = world.handle_of(id).unwrap();
    assert!(world.runtime().live_module(handle, ModuleKind::Physics).is_none());
    assert!(world.runtime().live_module(handle, ModuleKind::RigidBody).is_some());
}

#[tokio::test]
async fn test_patch_validation() {
    let mut world = new_world();
    let node = cube("Cube");
    let id = node.id;
    world.apply(&Change::insertion(NodePath::root(), node)).await.unwrap();
    let path = world.path_of(id).unwrap();
    let hash = world.content_hash().unwrap();

    let missing_kind = Patch::incremental(path.clone(), vec![void_scene::Light::default().into()]);
    let err = world.apply(&Change::Patch(missing_kind)).await.unwrap_err();
    assert!(matches!(err, EditError::ModuleKindMismatch { kind: ModuleKind::Light, .. }));

    let drops_color = Patch::complete(path.clone(), vec![Transform::default().into()]);
    let err = world.apply(&Change::Patch(drops_color)).await.unwrap_err();
    assert!(matches!(err, EditError::MandatoryModule { kind: ModuleKind::Color, .. }));

    let twice = Patch::incremental(path, vec![Color::RED.into(), Color::BLUE.into()]);
    let err = world.apply(&Change::Patch(twice)).await.unwrap_err();
    assert!(matches!(err, EditError::DuplicateModuleKind(ModuleKind::Color)));

    let root = Patch::incremental(NodePath::root(), vec![Color::RED.into()]);
    let err = world.apply(&Change::Patch(root)).await.unwrap_err();
    assert!(matches!(err, EditError::RootNotEditable));

    assert_eq!(world.content_hash().unwrap(), hash);
}

#[tokio::test]
async fn test_rename_patch() {
    let mut world = new_world();
    let node = cube("Cube");
    let id = node.id;
    world.apply(&Change::insertion(NodePath::root(), node)).await.unwrap();

    let rename = Patch::incremental(world.path_of(id).unwrap(), Vec::new()).with_rename("Box");
    world.apply(&Change::Patch(rename)).await.unwrap();
    assert_eq!(world.graph().get(id).unwrap().name(), "Box");
    let handle = world.handle_of(id).unwrap();
    assert_eq!(world.runtime().object(handle).unwrap().name, "Box");
}

#[tokio::test]
async fn test_collect_patch_from_live_manipulation() {
    let mut world = new_world();
    let node = cube("Cube");
    let id = node.id;
    world.apply(&Change::insertion(NodePath::root(), node)).await.unwrap();
    assert_eq!(world.collect_patch(id).unwrap(), None);

    let handle = world.handle_of(id).unwrap();
    world.runtime_mut().set_live_module(handle, Color::RED.into());

    let change = world.collect_patch(id).unwrap().unwrap();
    match &change {
        Change::Patch(patch) => {
            assert_eq!(patch.mode, PatchMode::Incremental);
            assert_eq!(patch.modules, vec![ModuleData::Color(Color::RED)]);
        }
        other => panic!("expected patch, got {:?}", other),
    }

    let before = world.content_hash().unwrap();
    world.apply(&change).await.unwrap();
    assert_eq!(world.collect_patch(id).unwrap(), None);
    assert_eq!(
        world.graph().get(id).unwrap().modules().get(ModuleKind::Color).unwrap().data(),
        &ModuleData::Color(Color::RED)
    );

    // The undo entry holds the pre-manipulation color.
    let undo = world.request_undo().unwrap();
    assert_eq!(undo, Change::rollback(before));
}

#[tokio::test]
async fn test_duplicate_gets_fresh_ids() {
    let mut world = new_world();
    world.load(sample_world()).await.unwrap();
    let room = world.graph().roots()[0];
    let table = world.graph().get(room).unwrap().children()[0];

    let copy = world.duplicate(table).unwrap();
    let Change::Insertion { parent, node } = &copy else {
        panic!("expected insertion");
    };
    assert_eq!(parent, &world.path_of(room).unwrap());
    assert_ne!(node.id, table);
    assert_eq!(node.subtree_len(), 2);

    world.apply(&copy).await.unwrap();
    assert_eq!(world.graph().get(room).unwrap().children().len(), 2);
    assert_eq!(world.graph().len(), 7);
}

// ============================================================================
// History
// ============================================================================

#[tokio::test]
async fn test_undo_redo_hashes() {
    let mut world = new_world();
    world.load(vec![cube("Cube")]).await.unwrap();
    let id = world.graph().roots()[0];
    let hash_a = world.content_hash().unwrap();

    let patch = Patch::incremental(world.path_of(id).unwrap(), vec![Color::GREEN.into()]);
    world.apply(&Change::Patch(patch)).await.unwrap();
    let hash_b = world.content_hash().unwrap();
    assert_ne!(hash_a, hash_b);

    let undo = world.request_undo().unwrap();
    world.apply(&undo).await.unwrap();
    assert_eq!(world.content_hash().unwrap(), hash_a);

    let redo = world.request_redo().unwrap();
    world.apply(&redo).await.unwrap();
    assert_eq!(world.content_hash().unwrap(), hash_b);
    assert_eq!(world.request_redo(), None);

    let undo = world.request_undo().unwrap();
    world.apply(&undo).await.unwrap();
    assert_eq!(world.request_undo(), None);
    assert_eq!(world.content_hash().unwrap(), hash_a);
}

#[tokio::test]
async fn test_hash_is_deterministic() {
    let mut world = new_world();
    world.load(sample_world()).await.unwrap();
    let nodes = world.nodes();

    assert_eq!(world.content_hash().unwrap(), world.content_hash().unwrap());
    assert_eq!(void_scene::encode_world(&nodes).unwrap(), void_scene::encode_world(&world.nodes()).unwrap());
    assert_eq!(Snapshot::capture(&nodes).unwrap().hash(), world.content_hash().unwrap());
}

#[tokio::test]
async fn test_cube_color_rollback_scenario() {
    let mut world = new_world();
    let node = cube("Cube")
        .with_module(Transform::from_position(Vec3::new(0.0, 1.0, 5.0)))
        .with_module(Color::GRAY);
    let id = node.id;
    world.apply(&Change::insertion(NodePath::root(), node)).await.unwrap();
    let h1 = world.content_hash().unwrap();

    let patch = Patch::incremental(world.path_of(id).unwrap(), vec![Color::RED.into()]);
    world.apply(&Change::Patch(patch)).await.unwrap();
    let h2 = world.content_hash().unwrap();
    assert_ne!(h1, h2);

    world.apply(&Change::rollback(h1)).await.unwrap();
    assert_eq!(live_color(&world, id), Some(ModuleData::Color(Color::GRAY)));
    assert_eq!(world.content_hash().unwrap(), h1);

    world.apply(&Change::rollback(h2)).await.unwrap();
    assert_eq!(live_color(&world, id), Some(ModuleData::Color(Color::RED)));
    assert_eq!(world.content_hash().unwrap(), h2);
    assert_eq!(world.runtime().len(), 1);
}

#[tokio::test]
async fn test_unknown_rollback_is_ignored() {
    let mut world = new_world();
    world.load(sample_world()).await.unwrap();
    let hash = world.content_hash().unwrap();

    let notified = Arc::new(AtomicUsize::new(0));
    let counter = notified.clone();
    world.on_world_changed(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let foreign = Snapshot::capture(&[cube("Elsewhere")]).unwrap().hash();
    let outcome = world.apply(&Change::rollback(foreign)).await.unwrap();
    assert_eq!(outcome, ApplyOutcome::RollbackIgnored);
    assert_eq!(world.content_hash().unwrap(), hash);
    assert_eq!(notified.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failed_rollback_keeps_current_tree() {
    let mut world = new_world();
    let node = cube("Cube");
    let id = node.id;
    world.apply(&Change::insertion(NodePath::root(), node)).await.unwrap();
    let h1 = world.content_hash().unwrap();
    let patch = Patch::incremental(world.path_of(id).unwrap(), vec![Color::RED.into()]);
    world.apply(&Change::Patch(patch)).await.unwrap();
    let h2 = world.content_hash().unwrap();

    let entries = world.history().len();

    world.runtime_mut().reject_asset(CUBE);
    let err = world.apply(&Change::rollback(h1)).await.unwrap_err();
    assert!(matches!(err, EditError::Runtime(_)));

    assert_eq!(world.history().len(), entries);
    assert!(!world.history().is_navigating());
    assert_eq!(world.content_hash().unwrap(), h2);
    assert_eq!(world.runtime().len(), 1);
    assert_eq!(live_color(&world, id), Some(ModuleData::Color(Color::RED)));
}

#[tokio::test]
async fn test_listeners_see_applied_changes() {
    let mut world = new_world();
    let notified = Arc::new(AtomicUsize::new(0));
    let counter = notified.clone();
    world.on_world_changed(move |change| {
        assert!(!change.is_rollback());
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let node = cube("Cube");
    let path = NodePath::root().child(node.id);
    world.apply(&Change::insertion(NodePath::root(), node)).await.unwrap();
    world.apply(&Change::deletion(path.clone())).await.unwrap();
    assert!(world.apply(&Change::deletion(path)).await.is_err());
    assert_eq!(notified.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_history_capacity_from_config() {
    init_logging();
    let config = EditConfig {
        history_capacity: 3,
        ..EditConfig::testing()
    };
    let mut world = World::new(HeadlessRuntime::new(), config);
    for index in 0..6 {
        let name = format!("Cube {}", index);
        world.apply(&Change::insertion(NodePath::root(), cube(&name))).await.unwrap();
    }
    assert_eq!(world.history().len(), 3);
}

// ============================================================================
// Replication
// ============================================================================

#[tokio::test]
async fn test_authority_replicates_to_observer() {
    init_logging();
    let config = EditConfig::testing();
    let bus = ChangeBus::new(config.bus_capacity);
    let mut authority = Authority::new(World::new(HeadlessRuntime::new(), config.clone()), bus);
    let feed = authority.subscribe();
    let client = authority.submitter();
    let mut observer = World::new(HeadlessRuntime::new(), config);

    let node = cube("Cube");
    let path = NodePath::root().child(node.id);
    client.submit(&Change::insertion(NodePath::root(), node)).unwrap();
    client
        .submit(&Change::Patch(Patch::incremental(path.clone(), vec![Color::RED.into()])))
        .unwrap();
    client.submit(&Change::deletion(NodePath::root().child(NodeId::new()))).unwrap();

    let outcomes = authority.pump().await;
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].is_ok());
    assert!(outcomes[1].is_ok());
    assert!(matches!(outcomes[2], Err(EditError::PathNotFound(_))));

    let received = feed.drain();
    assert_eq!(received.len(), 2);
    for change in &received {
        observer.apply(change).await.unwrap();
    }
    assert_eq!(observer.content_hash().unwrap(), authority.world().content_hash().unwrap());

    // An undo requested by the authority lands on the same state everywhere.
    let undo = authority.world_mut().request_undo().unwrap();
    authority.apply_local(&undo).await.unwrap();
    let change = feed.try_next().unwrap().unwrap();
    assert_eq!(observer.apply(&change).await.unwrap(), ApplyOutcome::Applied);
    assert_eq!(observer.content_hash().unwrap(), authority.world().content_hash().unwrap());
}

#[tokio::test]
async fn test_observer_requested_undo_and_redo() {
    init_logging();
    let config = EditConfig::testing();
    let mut authority = Authority::new(
        World::new(HeadlessRuntime::new(), config.clone()),
        ChangeBus::new(config.bus_capacity),
    );
    let feed = authority.subscribe();
    let client = authority.submitter();
    let mut observer = World::new(HeadlessRuntime::new(), config);

    let node = cube("Cube");
    let path = NodePath::root().child(node.id);
    client.submit(&Change::insertion(NodePath::root(), node)).unwrap();
    client
        .submit(&Change::Patch(Patch::incremental(path, vec![Color::RED.into()])))
        .unwrap();
    authority.pump().await;
    for change in feed.drain() {
        observer.apply(&change).await.unwrap();
    }
    let red = observer.content_hash().unwrap();

    // The observer only submits. The tree moves once the authority echoes it back.
    let undo = observer.request_undo().unwrap();
    assert_eq!(observer.content_hash().unwrap(), red);
    client.submit(&undo).unwrap();
    let outcomes = authority.pump().await;
    assert!(matches!(outcomes[..], [Ok(ApplyOutcome::Applied)]));

    let echoed = feed.try_next().unwrap().unwrap();
    assert_eq!(echoed, undo);
    assert_eq!(observer.apply(&echoed).await.unwrap(), ApplyOutcome::Applied);
    let gray = authority.world().content_hash().unwrap();
    assert_ne!(gray, red);
    assert_eq!(observer.content_hash().unwrap(), gray);

    let redo = observer.request_redo().unwrap();
    client.submit(&redo).unwrap();
    authority.pump().await;
    for change in feed.drain() {
        assert_eq!(observer.apply(&change).await.unwrap(), ApplyOutcome::Applied);
    }
    assert_eq!(authority.world().content_hash().unwrap(), red);
    assert_eq!(observer.content_hash().unwrap(), red);
}

#[tokio::test]
async fn test_late_joiner_ignores_rollback_outside_its_history() {
    init_logging();
    let config = EditConfig::testing();
    let mut authority = Authority::new(
        World::new(HeadlessRuntime::new(), config.clone()),
        ChangeBus::new(config.bus_capacity),
    );
    let node = cube("Cube");
    let path = NodePath::root().child(node.id);
    authority.apply_local(&Change::insertion(NodePath::root(), node)).await.unwrap();
    authority
        .apply_local(&Change::Patch(Patch::incremental(path, vec![Color::RED.into()])))
        .await
        .unwrap();

    // Joins with the current tree and an empty history.
    let feed = authority.subscribe();
    let mut late = World::new(HeadlessRuntime::new(), config);
    late.load(authority.world().nodes()).await.unwrap();
    let joined = late.content_hash().unwrap();
    assert_eq!(joined, authority.world().content_hash().unwrap());

    let undo = authority.world_mut().request_undo().unwrap();
    authority.apply_local(&undo).await.unwrap();
    let change = feed.try_next().unwrap().unwrap();
    assert_eq!(late.apply(&change).await.unwrap(), ApplyOutcome::RollbackIgnored);
    assert_eq!(late.content_hash().unwrap(), joined);
    assert!(late.history().is_empty());

    // Later changes still apply.
    let extra = cube("Extra");
    authority.apply_local(&Change::insertion(NodePath::root(), extra)).await.unwrap();
    let change = feed.try_next().unwrap().unwrap();
    assert_eq!(late.apply(&change).await.unwrap(), ApplyOutcome::Applied);
    assert_eq!(late.graph().len(), 2);
}

// ============================================================================
// Storage
// ============================================================================

#[tokio::test]
async fn test_fs_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FsWorldStore::new(dir.path().join("worlds")).unwrap();

    let mut world = new_world();
    world.load(sample_world()).await.unwrap();
    let id = store.save_world(&world.nodes()).unwrap();
    assert!(store.contains(&id));
    assert_eq!(store.save_world(&world.nodes()).unwrap(), id);

    let mut late_joiner = new_world();
    late_joiner.load(store.load_world(&id).unwrap()).await.unwrap();
    assert_eq!(late_joiner.content_hash().unwrap(), world.content_hash().unwrap());
    assert_eq!(late_joiner.runtime().len(), 5);
}

#[test]
fn test_fs_store_detects_corruption() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FsWorldStore::new(dir.path()).unwrap();
    let id = store.save_world(&[cube("Cube")]).unwrap();

    let path = dir.path().join(format!("{}.vwld", id));
    let mut bytes = std::fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    std::fs::write(&path, bytes).unwrap();

    assert!(matches!(store.load_world(&id), Err(StoreError::Corrupt(_))));
    let unknown = ContentId::of_document(b"unknown");
    assert!(matches!(store.load_world(&unknown), Err(StoreError::NotFound(_))));
}
