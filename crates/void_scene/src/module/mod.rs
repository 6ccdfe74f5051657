//! Property modules
//!
//! A property module is a typed bundle of state attached to a scene node.
//! The set of kinds is closed: every kind has a stable wire tag, and a new
//! kind gets a new tag. Tags are never reused.
//!
//! Each [`PropertyModule`] keeps the value it last committed to the live
//! runtime next to its editable value. Comparing the two is how local
//! edits become dirty and later turn into incremental patches.

mod color;
mod light;
mod physics;
mod spawn;
mod teleport;
mod transform;

pub use color::Color;
pub use light::{Light, LightKind};
pub use physics::{ColliderShape, Physics, RigidBody};
pub use spawn::{SpawnPoint, Spawner};
pub use teleport::{TeleportButton, TeleportMarker, TeleportSurface};
pub use transform::Transform;

use crate::asset::AssetRef;
use crate::error::{SceneError, SceneResult};
use crate::runtime::{LiveRuntime, RuntimeHandle};
use std::fmt;

/// Discriminant of a property module.
///
/// The discriminants are wire tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ModuleKind {
    Transform = 1,
    Color = 2,
    Physics = 3,
    RigidBody = 4,
    Light = 5,
    Spawner = 6,
    SpawnPoint = 7,
    TeleportMarker = 8,
    TeleportButton = 9,
    TeleportSurface = 10,
}

impl ModuleKind {
    /// Every registered kind, in tag order
    pub const ALL: [ModuleKind; 10] = [
        Self::Transform,
        Self::Color,
        Self::Physics,
        Self::RigidBody,
        Self::Light,
        Self::Spawner,
        Self::SpawnPoint,
        Self::TeleportMarker,
        Self::TeleportButton,
        Self::TeleportSurface,
    ];

    /// Wire tag
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Look up a kind by wire tag
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.tag() == tag)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Transform => "Transform",
            Self::Color => "Color",
            Self::Physics => "Physics",
            Self::RigidBody => "RigidBody",
            Self::Light => "Light",
            Self::Spawner => "Spawner",
            Self::SpawnPoint => "SpawnPoint",
            Self::TeleportMarker => "TeleportMarker",
            Self::TeleportButton => "TeleportButton",
            Self::TeleportSurface => "TeleportSurface",
        }
    }

    /// Whether users are barred from removing this kind from a node
    /// showing `asset`.
    pub fn is_mandatory_on(self, asset: &AssetRef) -> bool {
        match self {
            Self::Transform | Self::SpawnPoint => true,
            Self::Color => asset.is_primitive(),
            _ => false,
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The value fields of one module.
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleData {
    Transform(Transform),
    Color(Color),
    Physics(Physics),
    RigidBody(RigidBody),
    Light(Light),
    Spawner(Spawner),
    SpawnPoint(SpawnPoint),
    TeleportMarker(TeleportMarker),
    TeleportButton(TeleportButton),
    TeleportSurface(TeleportSurface),
}

impl ModuleData {
    pub fn kind(&self) -> ModuleKind {
        match self {
            Self::Transform(_) => ModuleKind::Transform,
            Self::Color(_) => ModuleKind::Color,
            Self::Physics(_) => ModuleKind::Physics,
            Self::RigidBody(_) => ModuleKind::RigidBody,
            Self::Light(_) => ModuleKind::Light,
            Self::Spawner(_) => ModuleKind::Spawner,
            Self::SpawnPoint(_) => ModuleKind::SpawnPoint,
            Self::TeleportMarker(_) => ModuleKind::TeleportMarker,
            Self::TeleportButton(_) => ModuleKind::TeleportButton,
            Self::TeleportSurface(_) => ModuleKind::TeleportSurface,
        }
    }

    /// Default value for a kind
    pub fn default_for(kind: ModuleKind) -> Self {
        match kind {
            ModuleKind::Transform => Self::Transform(Transform::default()),
            ModuleKind::Color => Self::Color(Color::default()),
            ModuleKind::Physics => Self::Physics(Physics::default()),
            ModuleKind::RigidBody => Self::RigidBody(RigidBody::default()),
            ModuleKind::Light => Self::Light(Light::default()),
            ModuleKind::Spawner => Self::Spawner(Spawner::default()),
            ModuleKind::SpawnPoint => Self::SpawnPoint(SpawnPoint::default()),
            ModuleKind::TeleportMarker => Self::TeleportMarker(TeleportMarker::default()),
            ModuleKind::TeleportButton => Self::TeleportButton(TeleportButton::default()),
            ModuleKind::TeleportSurface => Self::TeleportSurface(TeleportSurface::default()),
        }
    }
}

impl From<Transform> for ModuleData {
    fn from(value: Transform) -> Self {
        Self::Transform(value)
    }
}

impl From<Color> for ModuleData {
    fn from(value: Color) -> Self {
        Self::Color(value)
    }
}

impl From<Physics> for ModuleData {
    fn from(value: Physics) -> Self {
        Self::Physics(value)
    }
}

impl From<RigidBody> for ModuleData {
    fn from(value: RigidBody) -> Self {
        Self::RigidBody(value)
    }
}

impl From<Light> for ModuleData {
    fn from(value: Light) -> Self {
        Self::Light(value)
    }
}

impl From<Spawner> for ModuleData {
    fn from(value: Spawner) -> Self {
        Self::Spawner(value)
    }
}

impl From<SpawnPoint> for ModuleData {
    fn from(value: SpawnPoint) -> Self {
        Self::SpawnPoint(value)
    }
}

impl From<TeleportMarker> for ModuleData {
    fn from(value: TeleportMarker) -> Self {
        Self::TeleportMarker(value)
    }
}

impl From<TeleportButton> for ModuleData {
    fn from(value: TeleportButton) -> Self {
        Self::TeleportButton(value)
    }
}

impl From<TeleportSurface> for ModuleData {
    fn from(value: TeleportSurface) -> Self {
        Self::TeleportSurface(value)
    }
}

/// A module instance on a node: its editable value, the value last
/// pushed to the live runtime, and the dirty flag relating the two.
#[derive(Debug, Clone)]
pub struct PropertyModule {
    data: ModuleData,
    committed: Option<ModuleData>,
    dirty: bool,
}

impl PropertyModule {
    /// Create a module that has never been committed (and is therefore dirty)
    pub fn new(data: impl Into<ModuleData>) -> Self {
        Self {
            data: data.into(),
            committed: None,
            dirty: true,
        }
    }

    pub fn kind(&self) -> ModuleKind {
        self.data.kind()
    }

    pub fn data(&self) -> &ModuleData {
        &self.data
    }

    /// Mutable access for local edits. Marks the module dirty.
    pub fn data_mut(&mut self) -> &mut ModuleData {
        self.dirty = true;
        &mut self.data
    }

    pub fn into_data(self) -> ModuleData {
        self.data
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Push the current value into the live runtime and clear the dirty flag.
    pub fn commit_state<R: LiveRuntime + ?Sized>(&mut self, runtime: &mut R, handle: RuntimeHandle) {
        runtime.commit_module(handle, &self.data);
        self.committed = Some(self.data.clone());
        self.dirty = false;
    }

    /// Pull the live runtime's value back in.
    ///
    /// The module becomes dirty when the live value differs from the last
    /// committed one. Returns the dirty flag.
    pub fn check_state<R: LiveRuntime + ?Sized>(&mut self, runtime: &R, handle: RuntimeHandle) -> bool {
        if let Some(live) = runtime.read_live_module_state(handle, self.kind()) {
            if live.kind() == self.kind() && self.committed.as_ref() != Some(&live) {
                self.data = live;
                self.dirty = true;
            }
        }
        self.dirty
    }

    /// Overwrite this module's fields from another value of the same kind.
    ///
    /// The runtime binding and commit history are kept, so the next
    /// [`commit_state`](Self::commit_state) pushes the new value.
    pub fn replace_values(&mut self, other: &ModuleData) -> SceneResult<()> {
        if other.kind() != self.kind() {
            return Err(SceneError::KindMismatch {
                expected: self.kind(),
                found: other.kind(),
            });
        }
        self.overwrite(other.clone());
        Ok(())
    }

    fn overwrite(&mut self, data: ModuleData) {
        self.data = data;
        self.dirty = self.committed.as_ref() != Some(&self.data);
    }

    /// Same value with no commit history, as if never instantiated
    pub fn uncommitted(&self) -> Self {
        Self::new(self.data.clone())
    }

    /// Whether a user may remove this module from a node showing `asset`
    pub fn is_removable(&self, asset: &AssetRef) -> bool {
        !self.kind().is_mandatory_on(asset)
    }
}

impl PartialEq for PropertyModule {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl From<ModuleData> for PropertyModule {
    fn from(data: ModuleData) -> Self {
        Self::new(data)
    }
}

/// Ordered modules of one node, at most one per kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleSet {
    modules: Vec<PropertyModule>,
}

impl ModuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from values, rejecting duplicate kinds
    pub fn from_data(data: impl IntoIterator<Item = ModuleData>) -> SceneResult<Self> {
        let mut set = Self::new();
        for module in data {
            set.insert(PropertyModule::new(module))?;
        }
        Ok(set)
    }

    /// Append a module. Fails if the kind is already present.
    pub fn insert(&mut self, module: PropertyModule) -> SceneResult<()> {
        if self.contains(module.kind()) {
            return Err(SceneError::DuplicateModule(module.kind()));
        }
        self.modules.push(module);
        Ok(())
    }

    /// Overwrite the module of the same kind, or append one
    pub fn set(&mut self, data: ModuleData) {
        match self.get_mut(data.kind()) {
            Some(existing) => existing.overwrite(data),
            None => self.modules.push(PropertyModule::new(data)),
        }
    }

    /// Copy of every module with commit history dropped
    pub fn uncommitted_copy(&self) -> Self {
        Self {
            modules: self.modules.iter().map(PropertyModule::uncommitted).collect(),
        }
    }

    pub fn get(&self, kind: ModuleKind) -> Option<&PropertyModule> {
        self.modules.iter().find(|m| m.kind() == kind)
    }

    pub fn get_mut(&mut self, kind: ModuleKind) -> Option<&mut PropertyModule> {
        self.modules.iter_mut().find(|m| m.kind() == kind)
    }

    pub fn remove(&mut self, kind: ModuleKind) -> Option<PropertyModule> {
        let index = self.modules.iter().position(|m| m.kind() == kind)?;
        Some(self.modules.remove(index))
    }

    pub fn contains(&self, kind: ModuleKind) -> bool {
        self.get(kind).is_some()
    }

    /// Kinds in insertion order
    pub fn kinds(&self) -> Vec<ModuleKind> {
        self.modules.iter().map(|m| m.kind()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PropertyModule> {
        self.modules.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PropertyModule> {
        self.modules.iter_mut()
    }

    pub fn dirty_modules(&self) -> impl Iterator<Item = &PropertyModule> {
        self.modules.iter().filter(|m| m.is_dirty())
    }

    /// Values in insertion order
    pub fn to_data(&self) -> Vec<ModuleData> {
        self.modules.iter().map(|m| m.data().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Modules a freshly created node starts with.
///
/// Primitives get a Transform and a gray Color. Other assets get a
/// Transform only.
pub fn default_modules_for(asset: &AssetRef) -> ModuleSet {
    let mut set = ModuleSet::new();
    set.modules.push(PropertyModule::new(Transform::default()));
    if asset.is_primitive() {
        set.modules.push(PropertyModule::new(Color::GRAY));
    }
    set
}
