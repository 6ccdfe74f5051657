//! Asset references
//!
//! A node points at the thing it displays through an [`AssetRef`]. The
//! engine never decodes assets; content ids are opaque strings handed to
//! the live runtime. An asset reference is fixed at creation: swapping
//! the underlying asset is a delete followed by an insert.

use std::fmt;

/// Built-in primitive shapes.
///
/// The discriminants are wire values and must never be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PrimitiveShape {
    Cube = 0,
    Sphere = 1,
    Cylinder = 2,
    Capsule = 3,
    Plane = 4,
    Quad = 5,
}

impl PrimitiveShape {
    /// All shapes, in wire order
    pub const ALL: [PrimitiveShape; 6] = [
        Self::Cube,
        Self::Sphere,
        Self::Cylinder,
        Self::Capsule,
        Self::Plane,
        Self::Quad,
    ];

    /// Wire value
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Look up a shape by wire value
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.get(byte as usize).copied()
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            Self::Cube => "Cube",
            Self::Sphere => "Sphere",
            Self::Cylinder => "Cylinder",
            Self::Capsule => "Capsule",
            Self::Plane => "Plane",
            Self::Quad => "Quad",
        }
    }
}

/// What a scene node renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetRef {
    /// Geometry stored in content-addressed storage
    Embedded {
        /// Opaque content id of the geometry blob
        content_id: String,
    },
    /// A named item inside a kit archive
    KitItem {
        /// Content id of the archive
        archive_id: String,
        /// Item name within the archive
        item: String,
    },
    /// A built-in primitive
    Primitive(PrimitiveShape),
}

impl AssetRef {
    /// Wire tag of the embedded-geometry variant
    pub const TAG_EMBEDDED: u8 = 1;
    /// Wire tag of the kit-item variant
    pub const TAG_KIT_ITEM: u8 = 2;
    /// Wire tag of the primitive variant
    pub const TAG_PRIMITIVE: u8 = 3;

    /// Reference embedded geometry
    pub fn embedded(content_id: impl Into<String>) -> Self {
        Self::Embedded {
            content_id: content_id.into(),
        }
    }

    /// Reference an item in a kit archive
    pub fn kit_item(archive_id: impl Into<String>, item: impl Into<String>) -> Self {
        Self::KitItem {
            archive_id: archive_id.into(),
            item: item.into(),
        }
    }

    /// Wire tag of this variant
    pub fn tag(&self) -> u8 {
        match self {
            Self::Embedded { .. } => Self::TAG_EMBEDDED,
            Self::KitItem { .. } => Self::TAG_KIT_ITEM,
            Self::Primitive(_) => Self::TAG_PRIMITIVE,
        }
    }

    /// Check if this is a built-in primitive
    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Primitive(_))
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedded { content_id } => write!(f, "embedded:{}", content_id),
            Self::KitItem { archive_id, item } => write!(f, "kit:{}#{}", archive_id, item),
            Self::Primitive(shape) => write!(f, "primitive:{}", shape.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_bytes() {
        for shape in PrimitiveShape::ALL {
            assert_eq!(PrimitiveShape::from_byte(shape.to_byte()), Some(shape));
        }
        assert_eq!(PrimitiveShape::from_byte(200), None);
    }

    #[test]
    fn test_asset_tags() {
        assert_eq!(AssetRef::embedded("Qm1").tag(), 1);
        assert_eq!(AssetRef::kit_item("Qm2", "chair").tag(), 2);
        assert_eq!(AssetRef::Primitive(PrimitiveShape::Cube).tag(), 3);
        assert!(AssetRef::Primitive(PrimitiveShape::Quad).is_primitive());
        assert!(!AssetRef::embedded("Qm1").is_primitive());
    }
}
