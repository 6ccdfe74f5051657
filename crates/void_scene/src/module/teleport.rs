//! Teleport targets, triggers and walkable surfaces
//!
//! Buttons find their marker by label, not by node reference, so a
//! module never points at another node.

use serde::{Deserialize, Serialize};

/// A named destination.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TeleportMarker {
    pub label: String,
}

/// Clicking the node teleports the user to the marker with `target_label`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeleportButton {
    pub target_label: String,
    pub cooldown_secs: f32,
}

impl Default for TeleportButton {
    fn default() -> Self {
        Self {
            target_label: String::new(),
            cooldown_secs: 1.0,
        }
    }
}

/// Surface users may point-and-teleport onto.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeleportSurface {
    pub enabled: bool,
    pub max_distance: f32,
}

impl Default for TeleportSurface {
    fn default() -> Self {
        Self {
            enabled: true,
            max_distance: 20.0,
        }
    }
}
