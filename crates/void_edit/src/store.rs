//! Durable world storage
//!
//! Whole worlds are stored as world documents addressed by the SHA-256
//! of their bytes. Storage sits outside the undo history: saving and
//! loading never touch it.

use crate::config::EditConfig;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use void_scene::{decode_world, encode_world, CodecError, SceneNode};

/// Content address of a stored world document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId(String);

impl ContentId {
    /// Address of an encoded document
    pub fn of_document(bytes: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(bytes)))
    }

    /// Accept 64 lowercase hex digits
    pub fn parse(text: &str) -> Option<Self> {
        let mut digest = [0u8; 32];
        hex::decode_to_slice(text, &mut digest).ok()?;
        let id = hex::encode(digest);
        (id == text).then_some(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// World storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("world {0} not found")]
    NotFound(ContentId),

    /// Stored bytes no longer hash to their address
    #[error("world {0} is corrupt")]
    Corrupt(ContentId),

    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("world codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Content-addressed storage for whole worlds
pub trait WorldStore {
    /// Store top-level nodes and return their address
    fn save_world(&mut self, nodes: &[SceneNode]) -> Result<ContentId, StoreError>;

    /// Load the top-level nodes stored under `id`
    fn load_world(&self, id: &ContentId) -> Result<Vec<SceneNode>, StoreError>;

    fn contains(&self, id: &ContentId) -> bool;
}

/// World store backed by a map
#[derive(Debug, Default)]
pub struct MemoryWorldStore {
    documents: HashMap<ContentId, Vec<u8>>,
}

impl MemoryWorldStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl WorldStore for MemoryWorldStore {
    fn save_world(&mut self, nodes: &[SceneNode]) -> Result<ContentId, StoreError> {
        let bytes = encode_world(nodes)?;
        let id = ContentId::of_document(&bytes);
        self.documents.entry(id.clone()).or_insert(bytes);
        Ok(id)
    }

    fn load_world(&self, id: &ContentId) -> Result<Vec<SceneNode>, StoreError> {
        let bytes = self.documents.get(id).ok_or_else(|| StoreError::NotFound(id.clone()))?;
        Ok(decode_world(bytes)?)
    }

    fn contains(&self, id: &ContentId) -> bool {
        self.documents.contains_key(id)
    }
}

/// World store writing one `<id>.vwld` file per world
#[derive(Debug, Clone)]
pub struct FsWorldStore {
    dir: PathBuf,
}

impl FsWorldStore {
    /// Open a store in `dir`, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Open the store named by `config.store_dir`
    pub fn from_config(config: &EditConfig) -> Result<Self, StoreError> {
        Self::new(config.store_dir.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &ContentId) -> PathBuf {
        self.dir.join(format!("{}.vwld", id))
    }
}

impl WorldStore for FsWorldStore {
    fn save_world(&mut self, nodes: &[SceneNode]) -> Result<ContentId, StoreError> {
        let bytes = encode_world(nodes)?;
        let id = ContentId::of_document(&bytes);
        let final_path = self.path_for(&id);
        if final_path.exists() {
            log::debug!("World {} already stored", id);
            return Ok(id);
        }

        // Write to a temp file, then rename into place
        let temp_path = self.dir.join(format!(".{}.vwld.tmp", id));
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &final_path)?;

        log::info!("Saved world {} ({} bytes)", id, bytes.len());
        Ok(id)
    }

    fn load_world(&self, id: &ContentId) -> Result<Vec<SceneNode>, StoreError> {
        let bytes = match fs::read(self.path_for(id)) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Err(StoreError::NotFound(id.clone())),
            Err(err) => return Err(err.into()),
        };
        if ContentId::of_document(&bytes) != *id {
            return Err(StoreError::Corrupt(id.clone()));
        }
        let nodes = decode_world(&bytes)?;
        log::info!("Loaded world {} ({} top-level nodes)", id, nodes.len());
        Ok(nodes)
    }

    fn contains(&self, id: &ContentId) -> bool {
        self.path_for(id).exists()
    }
}
