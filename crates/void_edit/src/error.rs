//! Error types for scene editing

use thiserror::Error;
use void_scene::{CodecError, ModuleKind, NodeId, PathNotFound, RuntimeError};

/// Errors returned when applying a change
#[derive(Debug, Error)]
pub enum EditError {
    /// A path segment did not resolve. Usually a concurrent edit got there first.
    #[error(transparent)]
    PathNotFound(#[from] PathNotFound),

    /// An incremental patch names a module kind the node does not have
    #[error("node {node} has no {kind} module")]
    ModuleKindMismatch { node: NodeId, kind: ModuleKind },

    /// A payload lists the same module kind twice
    #[error("duplicate {0} module in payload")]
    DuplicateModuleKind(ModuleKind),

    /// An insertion reuses an id already present in the tree
    #[error("node {0} already exists")]
    DuplicateNodeId(NodeId),

    /// A complete patch would drop a module the node must keep
    #[error("{kind} module cannot be removed from node {node}")]
    MandatoryModule { node: NodeId, kind: ModuleKind },

    /// An insertion would nest nodes deeper than the codec can write
    #[error("insertion would nest nodes {depth} levels deep (limit {})", void_scene::MAX_DEPTH)]
    TooDeep { depth: usize },

    /// Deletions and patches must address a node, not the world root
    #[error("the world root cannot be deleted or patched")]
    RootNotEditable,

    #[error("live runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Building a snapshot failed
    #[error("snapshot serialization failed: {0}")]
    SerializationFailure(CodecError),
}

impl EditError {
    /// Soft failures the user can retry after the tree refreshes
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PathNotFound(_))
    }

    /// The input came from a newer feature set than this build knows
    pub fn is_version_skew(&self) -> bool {
        match self {
            Self::Codec(err) | Self::SerializationFailure(err) => err.is_version_skew(),
            _ => false,
        }
    }
}

/// Result type for editing operations
pub type Result<T> = std::result::Result<T, EditError>;
