//! Tint applied to a node's material

use serde::{Deserialize, Serialize};

/// Linear RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub rgba: [f32; 4],
}

impl Color {
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const GRAY: Self = Self::rgb(0.5, 0.5, 0.5);
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Self = Self::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Self = Self::rgb(0.0, 0.0, 1.0);

    /// Opaque color from components
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { rgba: [r, g, b, 1.0] }
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.rgba[3] = alpha;
        self
    }

    pub fn alpha(&self) -> f32 {
        self.rgba[3]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::GRAY
    }
}
