//! Content-hashed undo history
//!
//! Every entry is a full snapshot of the top-level tree, identified by
//! the SHA-256 of its encoded nodes. Undo and redo requests travel as
//! hashes rather than stack positions, so a participant whose local
//! stack has a different depth still lands on the same content.
//!
//! The history is linear. Recording a change while navigating drops
//! every entry above the cursor.

use sha2::{Digest, Sha256};
use std::fmt;
use void_scene::{node_from_bytes, node_to_bytes, CodecResult, SceneNode};

/// SHA-256 of a snapshot's node blobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotHash([u8; 32]);

impl SnapshotHash {
    pub const LEN: usize = 32;

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse 64 hex digits, either case
    pub fn from_hex(text: &str) -> Option<Self> {
        let mut bytes = [0u8; Self::LEN];
        hex::decode_to_slice(text, &mut bytes).ok()?;
        Some(Self(bytes))
    }

    /// Hash of an ordered list of node blobs
    pub fn of_blobs<B: AsRef<[u8]>>(blobs: &[B]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((blobs.len() as u64).to_le_bytes());
        for blob in blobs {
            let blob = blob.as_ref();
            hasher.update((blob.len() as u64).to_le_bytes());
            hasher.update(blob);
        }
        let digest = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }
}

impl fmt::Display for SnapshotHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Encoded top-level nodes at one point in history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    hash: SnapshotHash,
    blobs: Vec<Vec<u8>>,
}

impl Snapshot {
    /// Encode each top-level node and hash the blobs in order
    pub fn capture(nodes: &[SceneNode]) -> CodecResult<Self> {
        let blobs = nodes.iter().map(node_to_bytes).collect::<CodecResult<Vec<_>>>()?;
        Ok(Self {
            hash: SnapshotHash::of_blobs(&blobs),
            blobs,
        })
    }

    pub fn hash(&self) -> SnapshotHash {
        self.hash
    }

    pub fn blobs(&self) -> &[Vec<u8>] {
        &self.blobs
    }

    /// Encoded size in bytes
    pub fn size(&self) -> usize {
        self.blobs.iter().map(Vec::len).sum()
    }

    /// Decode the stored nodes back into value trees
    pub fn decode_nodes(&self) -> CodecResult<Vec<SceneNode>> {
        self.blobs.iter().map(|blob| node_from_bytes(blob)).collect()
    }
}

/// Linear history of snapshots with a navigation cursor.
///
/// With no cursor the history is live: the displayed tree is newer than
/// every entry. With a cursor the displayed tree is the entry at that
/// index.
#[derive(Debug, Clone)]
pub struct UndoHistory {
    entries: Vec<Snapshot>,
    cursor: Option<usize>,
    capacity: usize,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoHistory {
    /// Default maximum history size.
    pub const DEFAULT_CAPACITY: usize = 100;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the displayed tree is a history entry
    pub fn is_navigating(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn can_undo(&self) -> bool {
        match self.cursor {
            None => !self.entries.is_empty(),
            Some(index) => index > 0,
        }
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.cursor, Some(index) if index + 1 < self.entries.len())
    }

    /// Hash of the entry under the cursor, `None` while live
    pub fn current_hash(&self) -> Option<SnapshotHash> {
        self.cursor.and_then(|index| self.entries.get(index)).map(Snapshot::hash)
    }

    pub fn contains(&self, hash: SnapshotHash) -> bool {
        self.entries.iter().any(|entry| entry.hash == hash)
    }

    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    /// Record the state from before a change.
    ///
    /// Entries above the cursor are discarded and the history goes live.
    pub fn record(&mut self, snapshot: Snapshot) {
        if let Some(index) = self.cursor.take() {
            self.entries.truncate(index);
        }
        self.push(snapshot);
    }

    /// Record the live state before navigating away from it.
    /// Does nothing while already navigating.
    pub fn push_live(&mut self, snapshot: Snapshot) {
        if self.cursor.is_none() {
            self.push(snapshot);
        }
    }

    fn push(&mut self, snapshot: Snapshot) {
        if self.entries.last().map(Snapshot::hash) == Some(snapshot.hash) {
            log::debug!("Skipping duplicate snapshot {}", snapshot.hash);
            return;
        }
        log::debug!("Pushing snapshot {} ({} bytes)", snapshot.hash, snapshot.size());
        self.entries.push(snapshot);

        while self.entries.len() > self.capacity {
            self.entries.remove(0);
            if let Some(index) = self.cursor.as_mut() {
                *index = index.saturating_sub(1);
            }
        }
    }

    /// Step one entry older and return its hash.
    ///
    /// When live, the current state is captured first so the step can be
    /// redone. If capturing fails nothing changes.
    pub fn request_undo(&mut self, live: impl FnOnce() -> CodecResult<Snapshot>) -> Option<SnapshotHash> {
        if self.entries.is_empty() {
            return None;
        }
        if self.cursor.is_none() {
            match live() {
                Ok(snapshot) => self.push(snapshot),
                Err(err) => {
                    log::warn!("Undo aborted, live state could not be captured: {}", err);
                    return None;
                }
            }
            self.cursor = Some(self.entries.len() - 1);
        }

        let index = self.cursor?;
        if index == 0 {
            return None;
        }
        self.cursor = Some(index - 1);
        self.current_hash()
    }

    /// Step one entry newer and return its hash
    pub fn request_redo(&mut self) -> Option<SnapshotHash> {
        let index = self.cursor?;
        if index + 1 >= self.entries.len() {
            return None;
        }
        self.cursor = Some(index + 1);
        self.current_hash()
    }

    /// Index of the entry with `hash` closest to the cursor.
    /// Ties go to the newer entry.
    pub fn find_nearest(&self, hash: SnapshotHash) -> Option<usize> {
        let origin = self.cursor.unwrap_or(self.entries.len());
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.hash == hash)
            .map(|(index, _)| index)
            .min_by_key(|index| (index.abs_diff(origin), std::cmp::Reverse(*index)))
    }

    /// Move the cursor to an existing entry
    pub fn navigate_to(&mut self, index: usize) {
        if index < self.entries.len() {
            self.cursor = Some(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use void_scene::{AssetRef, Color, PrimitiveShape};

    fn snapshot(name: &str) -> Snapshot {
        let node = SceneNode::new(AssetRef::Primitive(PrimitiveShape::Cube), name);
        Snapshot::capture(&[node]).unwrap()
    }

    #[test]
    fn test_hash_hex_round_trip() {
        let hash = snapshot("A").hash();
        let text = hash.to_string();
        assert_eq!(text.len(), 64);
        assert_eq!(text, text.to_lowercase());
        assert_eq!(SnapshotHash::from_hex(&text), Some(hash));
        assert_eq!(SnapshotHash::from_hex(&text.to_uppercase()), Some(hash));
        assert_eq!(SnapshotHash::from_hex("abc"), None);
        assert_eq!(SnapshotHash::from_hex(&"zz".repeat(32)), None);
    }

    #[test]
    fn test_hash_is_order_sensitive() {
        let a = SceneNode::new(AssetRef::Primitive(PrimitiveShape::Cube), "A");
        let b = SceneNode::new(AssetRef::Primitive(PrimitiveShape::Cube), "B").with_module(Color::RED);
        let ab = Snapshot::capture(&[a.clone(), b.clone()]).unwrap();
        let ba = Snapshot::capture(&[b, a]).unwrap();
        assert_ne!(ab.hash(), ba.hash());
        assert_ne!(Snapshot::capture(&[]).unwrap().hash(), ab.hash());
    }

    #[test]
    fn test_snapshot_decodes_back() {
        let node = SceneNode::new(AssetRef::embedded("Qm-statue"), "Statue");
        let snap = Snapshot::capture(std::slice::from_ref(&node)).unwrap();
        assert_eq!(snap.decode_nodes().unwrap(), vec![node]);
    }

    #[test]
    fn test_undo_redo_navigation() {
        let (a, b) = (snapshot("A"), snapshot("B"));
        let mut history = UndoHistory::new();
        assert_eq!(history.request_undo(|| Ok(a.clone())), None);

        history.record(a.clone());
        assert!(history.can_undo());
        assert!(!history.can_redo());

        assert_eq!(history.request_undo(|| Ok(b.clone())), Some(a.hash()));
        assert_eq!(history.len(), 2);
        assert!(history.is_navigating());
        assert_eq!(history.request_undo(|| unreachable!()), None);

        assert_eq!(history.request_redo(), Some(b.hash()));
        assert_eq!(history.request_redo(), None);
        assert_eq!(history.request_undo(|| unreachable!()), Some(a.hash()));
    }

    #[test]
    fn test_record_while_navigating_truncates() {
        let (a, b, c) = (snapshot("A"), snapshot("B"), snapshot("C"));
        let mut history = UndoHistory::new();
        history.record(a.clone());
        history.record(b.clone());
        history.request_undo(|| Ok(c.clone()));
        assert_eq!(history.cursor(), Some(1));

        history.record(b.clone());
        assert!(!history.is_navigating());
        assert_eq!(history.len(), 2);
        assert!(!history.contains(c.hash()));
    }

    #[test]
    fn test_duplicate_and_capacity() {
        let mut history = UndoHistory::with_capacity(2);
        let (a, b, c) = (snapshot("A"), snapshot("B"), snapshot("C"));
        history.record(a.clone());
        history.record(a.clone());
        assert_eq!(history.len(), 1);

        history.record(b);
        history.record(c.clone());
        assert_eq!(history.len(), 2);
        assert!(!history.contains(a.hash()));
        assert_eq!(history.get(1).map(Snapshot::hash), Some(c.hash()));
    }

    #[test]
    fn test_find_nearest_prefers_entry_closest_to_cursor() {
        let (a, b) = (snapshot("A"), snapshot("B"));
        let mut history = UndoHistory::new();
        history.record(a.clone());
        history.record(b.clone());
        history.record(a.clone());
        assert_eq!(history.find_nearest(a.hash()), Some(2));

        history.navigate_to(0);
        assert_eq!(history.find_nearest(a.hash()), Some(0));
        assert_eq!(history.find_nearest(snapshot("Z").hash()), None);
    }
}
