//! Binary scene codec
//!
//! Every polymorphic value is written as a one-byte tag followed by the
//! fields of that variant. Tags come from a closed registry
//! ([`ModuleKind`], [`AssetRef`] tags, [`PrimitiveShape`], [`LightKind`]
//! and [`ColliderShape`] bytes) and a
//! decoder rejects anything outside it with
//! [`CodecError::UnknownVariantTag`]. No language-level type names ever
//! reach the wire.
//!
//! # Layout
//!
//! ```text
//! node     := id[16] asset name:str modules children
//! asset    := tag:u8 fields
//! modules  := count:u32 (tag:u8 payload)*
//! children := count:u32 node*
//! str      := len:u32 utf8[len]
//! world    := "VWLD" version:u16 count:u32 node*
//! ```
//!
//! Integers are little-endian. Module payloads are the bincode encoding
//! (fixed-width integers) of the variant's field struct. The encoding is
//! a pure function of the value, which is what makes snapshot hashes
//! stable.

use crate::asset::{AssetRef, PrimitiveShape};
use crate::error::SceneError;
use crate::id::NodeId;
use crate::module::{ColliderShape, LightKind, ModuleData, ModuleKind, ModuleSet};
use crate::node::SceneNode;
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Magic bytes of a world document
pub const WORLD_MAGIC: [u8; 4] = *b"VWLD";

/// Current document format version
pub const FORMAT_VERSION: u16 = 1;

/// Deepest node nesting the decoder accepts
pub const MAX_DEPTH: usize = 256;

/// Codec failures
#[derive(Debug, Error)]
pub enum CodecError {
    /// A tag outside the registered set, from a corrupt or newer payload
    #[error("unknown {entity} tag {tag}")]
    UnknownVariantTag { entity: &'static str, tag: u8 },

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("bad magic, expected {expected:?}")]
    BadMagic { expected: [u8; 4] },

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u16),

    /// A length prefix claims more bytes than remain, or does not fit u32
    #[error("length {len} exceeds {limit}")]
    LengthOverflow { len: usize, limit: usize },

    #[error("invalid utf-8 in string field")]
    InvalidUtf8,

    #[error("node nesting deeper than {}", MAX_DEPTH)]
    TooDeep,

    /// Decoded data breaks a scene invariant
    #[error("invalid scene data: {0}")]
    Scene(#[from] SceneError),

    /// Module payload failed to encode or decode
    #[error("payload error: {0}")]
    Payload(#[from] bincode::Error),

    #[error("{0} trailing bytes after document")]
    TrailingBytes(usize),
}

impl CodecError {
    /// Whether the input was most likely written by a newer version
    pub fn is_version_skew(&self) -> bool {
        matches!(self, Self::UnknownVariantTag { .. } | Self::UnsupportedVersion(_))
    }
}

/// Result type for codec operations
pub type CodecResult<T> = std::result::Result<T, CodecError>;

fn payload_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .allow_trailing_bytes()
}

/// Appends encoded values to a byte buffer.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn put_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a length or count as u32
    pub fn put_len(&mut self, len: usize) -> CodecResult<()> {
        let len32 = u32::try_from(len).map_err(|_| CodecError::LengthOverflow {
            len,
            limit: u32::MAX as usize,
        })?;
        self.put_u32(len32);
        Ok(())
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn put_str(&mut self, value: &str) -> CodecResult<()> {
        self.put_len(value.len())?;
        self.put_bytes(value.as_bytes());
        Ok(())
    }

    pub fn put_id(&mut self, id: NodeId) {
        self.put_bytes(&id.to_bytes());
    }

    /// Write a document header
    pub fn put_header(&mut self, magic: [u8; 4]) {
        self.put_bytes(&magic);
        self.put_u16(FORMAT_VERSION);
    }

    /// Write a variant payload
    pub fn put_payload<T: Serialize>(&mut self, value: &T) -> CodecResult<()> {
        payload_options().serialize_into(&mut self.buf, value)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads encoded values from a byte slice.
#[derive(Debug)]
pub struct Decoder<'a> {
    input: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input }
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.input.len()
    }

    fn take(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        if len > self.input.len() {
            return Err(CodecError::UnexpectedEof);
        }
        let (head, tail) = self.input.split_at(len);
        self.input = tail;
        Ok(head)
    }

    fn array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> CodecResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn u16(&mut self) -> CodecResult<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub fn u32(&mut self) -> CodecResult<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    /// Read a length or count. Every counted item takes at least one
    /// byte, so anything larger than the remaining input is rejected
    /// before allocation.
    pub fn length(&mut self) -> CodecResult<usize> {
        let len = self.u32()? as usize;
        if len > self.input.len() {
            return Err(CodecError::LengthOverflow {
                len,
                limit: self.input.len(),
            });
        }
        Ok(len)
    }

    pub fn bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        self.take(len)
    }

    pub fn str(&mut self) -> CodecResult<String> {
        let len = self.length()?;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }

    pub fn id(&mut self) -> CodecResult<NodeId> {
        Ok(NodeId::from_bytes(self.array()?))
    }

    /// Read and check a document header, returning its version
    pub fn expect_header(&mut self, magic: [u8; 4]) -> CodecResult<u16> {
        let found: [u8; 4] = self.array()?;
        if found != magic {
            return Err(CodecError::BadMagic { expected: magic });
        }
        let version = self.u16()?;
        if version == 0 || version > FORMAT_VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }
        Ok(version)
    }

    /// Read a variant payload
    pub fn payload<T: DeserializeOwned>(&mut self) -> CodecResult<T> {
        let limit = self.input.len() as u64;
        let value = payload_options()
            .with_limit(limit)
            .deserialize_from(&mut self.input)?;
        Ok(value)
    }

    /// Check the tag byte of a closed enum that leads the next payload.
    /// Empty input is left for the payload read to report.
    pub fn expect_leading_tag(&self, entity: &'static str, known: impl Fn(u8) -> bool) -> CodecResult<()> {
        match self.input.first() {
            Some(&tag) if !known(tag) => Err(CodecError::UnknownVariantTag { entity, tag }),
            _ => Ok(()),
        }
    }

    /// Fail unless all input was consumed
    pub fn finish(self) -> CodecResult<()> {
        if self.input.is_empty() {
            Ok(())
        } else {
            Err(CodecError::TrailingBytes(self.input.len()))
        }
    }
}

// ============================================================================
// Variant encodings
// ============================================================================

pub fn encode_asset(enc: &mut Encoder, asset: &AssetRef) -> CodecResult<()> {
    enc.put_u8(asset.tag());
    match asset {
        AssetRef::Embedded { content_id } => enc.put_str(content_id)?,
        AssetRef::KitItem { archive_id, item } => {
            enc.put_str(archive_id)?;
            enc.put_str(item)?;
        }
        AssetRef::Primitive(shape) => enc.put_u8(shape.to_byte()),
    }
    Ok(())
}

pub fn decode_asset(dec: &mut Decoder<'_>) -> CodecResult<AssetRef> {
    let tag = dec.u8()?;
    match tag {
        AssetRef::TAG_EMBEDDED => Ok(AssetRef::Embedded {
            content_id: dec.str()?,
        }),
        AssetRef::TAG_KIT_ITEM => {
            let archive_id = dec.str()?;
            let item = dec.str()?;
            Ok(AssetRef::KitItem { archive_id, item })
        }
        AssetRef::TAG_PRIMITIVE => {
            let byte = dec.u8()?;
            let shape = PrimitiveShape::from_byte(byte).ok_or(CodecError::UnknownVariantTag {
                entity: "primitive shape",
                tag: byte,
            })?;
            Ok(AssetRef::Primitive(shape))
        }
        _ => Err(CodecError::UnknownVariantTag { entity: "asset", tag }),
    }
}

pub fn encode_module(enc: &mut Encoder, module: &ModuleData) -> CodecResult<()> {
    enc.put_u8(module.kind().tag());
    match module {
        ModuleData::Transform(m) => enc.put_payload(m),
        ModuleData::Color(m) => enc.put_payload(m),
        ModuleData::Physics(m) => enc.put_payload(m),
        ModuleData::RigidBody(m) => enc.put_payload(m),
        ModuleData::Light(m) => enc.put_payload(m),
        ModuleData::Spawner(m) => enc.put_payload(m),
        ModuleData::SpawnPoint(m) => enc.put_payload(m),
        ModuleData::TeleportMarker(m) => enc.put_payload(m),
        ModuleData::TeleportButton(m) => enc.put_payload(m),
        ModuleData::TeleportSurface(m) => enc.put_payload(m),
    }
}

pub fn decode_module(dec: &mut Decoder<'_>) -> CodecResult<ModuleData> {
    let tag = dec.u8()?;
    let kind = ModuleKind::from_tag(tag).ok_or(CodecError::UnknownVariantTag { entity: "module", tag })?;
    let module = match kind {
        ModuleKind::Transform => ModuleData::Transform(dec.payload()?),
        ModuleKind::Color => ModuleData::Color(dec.payload()?),
        ModuleKind::Physics => {
            dec.expect_leading_tag("collider shape", |tag| ColliderShape::from_byte(tag).is_some())?;
            ModuleData::Physics(dec.payload()?)
        }
        ModuleKind::RigidBody => ModuleData::RigidBody(dec.payload()?),
        ModuleKind::Light => {
            dec.expect_leading_tag("light kind", |tag| LightKind::from_byte(tag).is_some())?;
            ModuleData::Light(dec.payload()?)
        }
        ModuleKind::Spawner => ModuleData::Spawner(dec.payload()?),
        ModuleKind::SpawnPoint => ModuleData::SpawnPoint(dec.payload()?),
        ModuleKind::TeleportMarker => ModuleData::TeleportMarker(dec.payload()?),
        ModuleKind::TeleportButton => ModuleData::TeleportButton(dec.payload()?),
        ModuleKind::TeleportSurface => ModuleData::TeleportSurface(dec.payload()?),
    };
    Ok(module)
}

/// Write a count-prefixed module list
pub fn encode_modules<'m>(
    enc: &mut Encoder,
    modules: impl ExactSizeIterator<Item = &'m ModuleData>,
) -> CodecResult<()> {
    enc.put_len(modules.len())?;
    for module in modules {
        encode_module(enc, module)?;
    }
    Ok(())
}

/// Read a count-prefixed module list
pub fn decode_modules(dec: &mut Decoder<'_>) -> CodecResult<Vec<ModuleData>> {
    let count = dec.length()?;
    let mut modules = Vec::with_capacity(count);
    for _ in 0..count {
        modules.push(decode_module(dec)?);
    }
    Ok(modules)
}

/// Write a node subtree. Trees nested deeper than [`MAX_DEPTH`] are
/// refused so that everything written can be read back.
pub fn encode_node(enc: &mut Encoder, node: &SceneNode) -> CodecResult<()> {
    encode_node_at(enc, node, 0)
}

fn encode_node_at(enc: &mut Encoder, node: &SceneNode, depth: usize) -> CodecResult<()> {
    if depth >= MAX_DEPTH {
        return Err(CodecError::TooDeep);
    }
    enc.put_id(node.id);
    encode_asset(enc, &node.asset)?;
    enc.put_str(&node.name)?;
    encode_modules(enc, node.modules.iter().map(|m| m.data()))?;
    enc.put_len(node.children.len())?;
    for child in &node.children {
        encode_node_at(enc, child, depth + 1)?;
    }
    Ok(())
}

pub fn decode_node(dec: &mut Decoder<'_>) -> CodecResult<SceneNode> {
    decode_node_at(dec, 0)
}

fn decode_node_at(dec: &mut Decoder<'_>, depth: usize) -> CodecResult<SceneNode> {
    if depth >= MAX_DEPTH {
        return Err(CodecError::TooDeep);
    }
    let id = dec.id()?;
    let asset = decode_asset(dec)?;
    let name = dec.str()?;
    let modules = ModuleSet::from_data(decode_modules(dec)?)?;
    let mut node = SceneNode::from_parts(id, asset, name, modules);

    let count = dec.length()?;
    node.children.reserve(count);
    for _ in 0..count {
        node.children.push(decode_node_at(dec, depth + 1)?);
    }
    Ok(node)
}

// ============================================================================
// Documents
// ============================================================================

/// Encode a single node subtree with no header
pub fn node_to_bytes(node: &SceneNode) -> CodecResult<Vec<u8>> {
    let mut enc = Encoder::new();
    encode_node(&mut enc, node)?;
    Ok(enc.into_bytes())
}

/// Decode a single headerless node subtree
pub fn node_from_bytes(bytes: &[u8]) -> CodecResult<SceneNode> {
    let mut dec = Decoder::new(bytes);
    let node = decode_node(&mut dec)?;
    dec.finish()?;
    Ok(node)
}

/// Encode top-level nodes as a world document
pub fn encode_world(nodes: &[SceneNode]) -> CodecResult<Vec<u8>> {
    let mut enc = Encoder::new();
    enc.put_header(WORLD_MAGIC);
    enc.put_len(nodes.len())?;
    for node in nodes {
        encode_node(&mut enc, node)?;
    }
    Ok(enc.into_bytes())
}

/// Decode a world document
pub fn decode_world(bytes: &[u8]) -> CodecResult<Vec<SceneNode>> {
    let mut dec = Decoder::new(bytes);
    dec.expect_header(WORLD_MAGIC)?;
    let count = dec.length()?;
    let mut nodes = Vec::with_capacity(count);
    for _ in 0..count {
        nodes.push(decode_node(&mut dec)?);
    }
    dec.finish()?;
    log::debug!("Decoded world document with {} top-level nodes", nodes.len());
    Ok(nodes)
}
