//! Error types for scene data

use crate::id::NodeId;
use crate::module::ModuleKind;
use thiserror::Error;

/// Structural errors raised while building or editing scene data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    /// A module value was offered to a module of another kind
    #[error("module kind mismatch: expected {expected}, found {found}")]
    KindMismatch { expected: ModuleKind, found: ModuleKind },

    /// A node would carry two modules of the same kind
    #[error("duplicate {0} module")]
    DuplicateModule(ModuleKind),

    /// A node id is already present in the graph
    #[error("node {0} already exists")]
    DuplicateNode(NodeId),

    /// A node id is not present in the graph
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// A wire value outside a closed enum's registered set
    #[error("unknown {entity} tag {tag}")]
    UnknownTag { entity: &'static str, tag: u8 },
}

/// Result type for scene operations
pub type SceneResult<T> = std::result::Result<T, SceneError>;
