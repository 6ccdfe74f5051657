//! Light sources

use crate::error::SceneError;
use serde::{Deserialize, Serialize};

/// Light type, written as a one-byte wire tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum LightKind {
    Point = 0,
    Spot = 1,
    Directional = 2,
}

impl LightKind {
    /// All kinds, in wire order
    pub const ALL: [LightKind; 3] = [Self::Point, Self::Spot, Self::Directional];

    pub fn to_byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.get(byte as usize).copied()
    }
}

impl From<LightKind> for u8 {
    fn from(kind: LightKind) -> Self {
        kind.to_byte()
    }
}

impl TryFrom<u8> for LightKind {
    type Error = SceneError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Self::from_byte(tag).ok_or(SceneError::UnknownTag { entity: "light kind", tag })
    }
}

/// A light attached to a node.
///
/// `kind` leads the payload so decoders can check its tag first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub kind: LightKind,
    /// Linear RGB
    pub color: [f32; 3],
    pub intensity: f32,
    /// Falloff distance (ignored for directional lights)
    pub range: f32,
    /// Cone angle in degrees (spot lights only)
    pub spot_angle: f32,
    pub cast_shadows: bool,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            kind: LightKind::Point,
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
            range: 10.0,
            spot_angle: 30.0,
            cast_shadows: false,
        }
    }
}
