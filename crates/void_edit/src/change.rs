//! Change operations
//!
//! A change is a self-contained, path-addressed mutation. Changes are
//! plain values: the live-runtime adapter builds them, the transport
//! carries them as change documents, and every replica applies them
//! through [`World::apply`](crate::World::apply).
//!
//! # Change document
//!
//! ```text
//! change   := "VCHG" version:u16 tag:u8 payload
//! path     := count:u32 id[16]*
//! insert   := path node
//! delete   := path
//! patch    := path mode:u8 modules rename:(0 | 1 str)
//! rollback := hash[32]
//! ```

use crate::history::SnapshotHash;
use void_scene::codec::{decode_modules, decode_node, encode_modules, encode_node};
use void_scene::{CodecError, CodecResult, Decoder, Encoder, ModuleData, NodePath, SceneNode};

/// Magic bytes of a change document
pub const CHANGE_MAGIC: [u8; 4] = *b"VCHG";

/// How a patch's module list relates to the target's modules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PatchMode {
    /// Replace only the listed modules, each of which must already exist
    Incremental = 1,
    /// The list is the node's full module set. Absent kinds are removed
    /// and new kinds are added.
    Complete = 2,
}

impl PatchMode {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::Incremental),
            2 => Some(Self::Complete),
            _ => None,
        }
    }
}

/// Module replacement on one node
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    /// Path ending at the target node
    pub path: NodePath,
    pub mode: PatchMode,
    pub modules: Vec<ModuleData>,
    /// New display name, if any
    pub rename: Option<String>,
}

impl Patch {
    pub fn incremental(path: NodePath, modules: Vec<ModuleData>) -> Self {
        Self {
            path,
            mode: PatchMode::Incremental,
            modules,
            rename: None,
        }
    }

    pub fn complete(path: NodePath, modules: Vec<ModuleData>) -> Self {
        Self {
            path,
            mode: PatchMode::Complete,
            modules,
            rename: None,
        }
    }

    pub fn with_rename(mut self, name: impl Into<String>) -> Self {
        self.rename = Some(name.into());
        self
    }
}

/// A path-addressed mutation command
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Add `node` (with any nested children) as the last child of `parent`
    Insertion { parent: NodePath, node: SceneNode },
    /// Remove the subtree at `path`
    Deletion { path: NodePath },
    Patch(Patch),
    /// Restore the history entry with this hash
    RollbackRequest { hash: SnapshotHash },
}

impl Change {
    pub const TAG_INSERTION: u8 = 1;
    pub const TAG_DELETION: u8 = 2;
    pub const TAG_PATCH: u8 = 3;
    pub const TAG_ROLLBACK: u8 = 4;

    pub fn insertion(parent: NodePath, node: SceneNode) -> Self {
        Self::Insertion { parent, node }
    }

    pub fn deletion(path: NodePath) -> Self {
        Self::Deletion { path }
    }

    pub fn rollback(hash: SnapshotHash) -> Self {
        Self::RollbackRequest { hash }
    }

    pub fn tag(&self) -> u8 {
        match self {
            Self::Insertion { .. } => Self::TAG_INSERTION,
            Self::Deletion { .. } => Self::TAG_DELETION,
            Self::Patch(_) => Self::TAG_PATCH,
            Self::RollbackRequest { .. } => Self::TAG_ROLLBACK,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Insertion { .. } => "insertion",
            Self::Deletion { .. } => "deletion",
            Self::Patch(_) => "patch",
            Self::RollbackRequest { .. } => "rollback",
        }
    }

    pub fn is_rollback(&self) -> bool {
        matches!(self, Self::RollbackRequest { .. })
    }

    /// Encode as a change document
    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        let mut enc = Encoder::new();
        enc.put_header(CHANGE_MAGIC);
        enc.put_u8(self.tag());
        match self {
            Self::Insertion { parent, node } => {
                encode_path(&mut enc, parent)?;
                encode_node(&mut enc, node)?;
            }
            Self::Deletion { path } => encode_path(&mut enc, path)?,
            Self::Patch(patch) => {
                encode_path(&mut enc, &patch.path)?;
                enc.put_u8(patch.mode as u8);
                encode_modules(&mut enc, patch.modules.iter())?;
                match &patch.rename {
                    None => enc.put_u8(0),
                    Some(name) => {
                        enc.put_u8(1);
                        enc.put_str(name)?;
                    }
                }
            }
            Self::RollbackRequest { hash } => enc.put_bytes(hash.as_bytes()),
        }
        Ok(enc.into_bytes())
    }

    /// Decode a change document
    pub fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let mut dec = Decoder::new(bytes);
        dec.expect_header(CHANGE_MAGIC)?;
        let tag = dec.u8()?;
        let change = match tag {
            Self::TAG_INSERTION => {
                let parent = decode_path(&mut dec)?;
                let node = decode_node(&mut dec)?;
                Self::Insertion { parent, node }
            }
            Self::TAG_DELETION => Self::Deletion {
                path: decode_path(&mut dec)?,
            },
            Self::TAG_PATCH => {
                let path = decode_path(&mut dec)?;
                let byte = dec.u8()?;
                let mode = PatchMode::from_byte(byte).ok_or(CodecError::UnknownVariantTag {
                    entity: "patch mode",
                    tag: byte,
                })?;
                let modules = decode_modules(&mut dec)?;
                let rename = match dec.u8()? {
                    0 => None,
                    1 => Some(dec.str()?),
                    other => {
                        return Err(CodecError::UnknownVariantTag {
                            entity: "rename flag",
                            tag: other,
                        })
                    }
                };
                Self::Patch(Patch {
                    path,
                    mode,
                    modules,
                    rename,
                })
            }
            Self::TAG_ROLLBACK => {
                let mut hash = [0u8; SnapshotHash::LEN];
                hash.copy_from_slice(dec.bytes(SnapshotHash::LEN)?);
                Self::RollbackRequest {
                    hash: SnapshotHash::from_bytes(hash),
                }
            }
            _ => return Err(CodecError::UnknownVariantTag { entity: "change", tag }),
        };
        dec.finish()?;
        Ok(change)
    }
}

fn encode_path(enc: &mut Encoder, path: &NodePath) -> CodecResult<()> {
    enc.put_len(path.len())?;
    for id in path.iter() {
        enc.put_id(*id);
    }
    Ok(())
}

fn decode_path(dec: &mut Decoder<'_>) -> CodecResult<NodePath> {
    let count = dec.length()?;
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        ids.push(dec.id()?);
    }
    Ok(NodePath::from(ids))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::Snapshot;
    use void_scene::{AssetRef, Color, NodeId, PrimitiveShape, Transform, Vec3};

    #[test]
    fn test_each_variant_round_trips() {
        let node_path = NodePath::from(vec![NodeId::new(), NodeId::new()]);
        let cube = SceneNode::new(AssetRef::Primitive(PrimitiveShape::Cube), "Cube");
        let hash = Snapshot::capture(std::slice::from_ref(&cube)).unwrap().hash();

        let changes = vec![
            Change::insertion(NodePath::root(), cube),
            Change::deletion(node_path.clone()),
            Change::Patch(
                Patch::incremental(node_path.clone(), vec![Color::RED.into()]).with_rename("Red cube"),
            ),
            Change::Patch(Patch::complete(
                node_path,
                vec![Transform::from_position(Vec3::new(0.0, 1.0, 5.0)).into(), Color::GRAY.into()],
            )),
            Change::rollback(hash),
        ];

        for change in changes {
            let bytes = change.encode().unwrap();
            assert_eq!(&bytes[..4], &CHANGE_MAGIC);
            assert_eq!(Change::decode(&bytes).unwrap(), change);
        }
    }

    #[test]
    fn test_unknown_change_tag() {
        let mut bytes = Change::deletion(NodePath::root()).encode().unwrap();
        bytes[6] = 77;
        let err = Change::decode(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::UnknownVariantTag { entity: "change", tag: 77 }));
    }

    #[test]
    fn test_unknown_patch_mode() {
        let mut bytes = Change::Patch(Patch::incremental(NodePath::root(), Vec::new())).encode().unwrap();
        // header(6) + tag(1) + empty path count(4)
        bytes[11] = 9;
        let err = Change::decode(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::UnknownVariantTag { entity: "patch mode", tag: 9 }));
    }

    #[test]
    fn test_world_document_is_not_a_change() {
        let bytes = void_scene::encode_world(&[]).unwrap();
        assert!(matches!(Change::decode(&bytes), Err(CodecError::BadMagic { .. })));
    }
}
