//! # Void Scene - Scene Nodes & Scene Codec
//!
//! Owned scene values shared by every participant of a collaborative
//! editing session, and the binary codec that moves them between peers.
//!
//! ## Architecture
//!
//! ```text
//! SceneNode (value tree) ──► codec ──► bytes ──► codec ──► SceneNode
//!        │
//!        └──► SceneGraph (live tree) ──► LiveRuntime (rendered objects)
//! ```
//!
//! ## Key Concepts
//!
//! - **SceneNode**: An owned node value with its modules and children
//! - **PropertyModule**: A typed bundle of state with a dirty flag
//! - **NodePath**: Node ids from the world root down to a node
//! - **SceneGraph**: The editable tree, indexed by id with parent links
//! - **LiveRuntime**: The boundary to whatever displays the scene

pub mod asset;
pub mod codec;
pub mod error;
pub mod graph;
pub mod id;
pub mod module;
pub mod node;
pub mod path;
pub mod runtime;

pub use asset::{AssetRef, PrimitiveShape};
pub use codec::{
    decode_world, encode_world, node_from_bytes, node_to_bytes, CodecError, CodecResult, Decoder, Encoder,
    FORMAT_VERSION, MAX_DEPTH, WORLD_MAGIC,
};
pub use error::{SceneError, SceneResult};
pub use graph::{GraphNode, SceneGraph};
pub use id::NodeId;
pub use module::{
    default_modules_for, ColliderShape, Color, Light, LightKind, ModuleData, ModuleKind, ModuleSet, Physics,
    PropertyModule, RigidBody, SpawnPoint, Spawner, TeleportButton, TeleportMarker, TeleportSurface, Transform,
};
pub use node::SceneNode;
pub use path::{path_from, resolve, NodePath, PathNotFound, Resolved};
pub use runtime::{HeadlessRuntime, InstantiateRequest, LiveObject, LiveRuntime, RuntimeError, RuntimeHandle};

pub use glam::{Quat, Vec3};
