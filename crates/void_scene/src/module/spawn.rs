//! Object spawners and avatar spawn points

use serde::{Deserialize, Serialize};

/// Periodically spawns copies of an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spawner {
    /// Opaque content id of the spawned asset
    pub content_id: String,
    pub interval_secs: f32,
    /// Upper bound on simultaneously alive spawns
    pub max_alive: u32,
    pub active: bool,
}

impl Default for Spawner {
    fn default() -> Self {
        Self {
            content_id: String::new(),
            interval_secs: 5.0,
            max_alive: 8,
            active: true,
        }
    }
}

/// Where avatars appear when they join the world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// Avatars are scattered within this radius
    pub radius: f32,
    /// Initial heading around the up axis
    pub facing_degrees: f32,
}

impl Default for SpawnPoint {
    fn default() -> Self {
        Self {
            radius: 1.0,
            facing_degrees: 0.0,
        }
    }
}
