//! Collision and rigid-body settings
//!
//! The engine only stores these values. Simulating them is the live
//! runtime's job.

use crate::error::SceneError;
use serde::{Deserialize, Serialize};

/// Collision volume used by [`Physics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum ColliderShape {
    Box = 0,
    Sphere = 1,
    Capsule = 2,
    /// Exact mesh of the node's asset
    Mesh = 3,
    /// Convex hull of the node's asset
    Convex = 4,
}

impl ColliderShape {
    /// All shapes, in wire order
    pub const ALL: [ColliderShape; 5] = [Self::Box, Self::Sphere, Self::Capsule, Self::Mesh, Self::Convex];

    pub fn to_byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.get(byte as usize).copied()
    }
}

impl From<ColliderShape> for u8 {
    fn from(shape: ColliderShape) -> Self {
        shape.to_byte()
    }
}

impl TryFrom<u8> for ColliderShape {
    type Error = SceneError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Self::from_byte(tag).ok_or(SceneError::UnknownTag { entity: "collider shape", tag })
    }
}

/// Collider configuration. `collider` leads the payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Physics {
    pub collider: ColliderShape,
    /// Triggers report overlaps but do not collide
    pub is_trigger: bool,
    pub friction: f32,
    pub bounciness: f32,
}

impl Default for Physics {
    fn default() -> Self {
        Self {
            collider: ColliderShape::Box,
            is_trigger: false,
            friction: 0.6,
            bounciness: 0.0,
        }
    }
}

/// Dynamic body settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidBody {
    /// Mass in kilograms
    pub mass: f32,
    pub drag: f32,
    pub angular_drag: f32,
    pub use_gravity: bool,
    /// Kinematic bodies are moved by grabs, not by forces
    pub is_kinematic: bool,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            mass: 1.0,
            drag: 0.0,
            angular_drag: 0.05,
            use_gravity: true,
            is_kinematic: false,
        }
    }
}
