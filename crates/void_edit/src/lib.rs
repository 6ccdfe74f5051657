//! # Void Edit - Collaborative Scene Editing
//!
//! Path-addressed changes, a content-hashed undo history and the change
//! bus that keeps every replica of a shared world in step.
//!
//! ## Architecture
//!
//! ```text
//! Live runtime ──► Change ──► SubmitHandle ──► Authority ──► World::apply
//!                                                 │
//!                                                 └──► ObserverFeed ──► World::apply
//! ```
//!
//! ## Key Concepts
//!
//! - **Change**: An insertion, deletion, patch or rollback request
//! - **World**: One replica's tree, live-runtime binding and history
//! - **UndoHistory**: Snapshots addressed by content hash
//! - **ChangeBus**: Bounded inbox to the authority and observer fan-out
//! - **WorldStore**: Content-addressed persistence for whole worlds

pub mod bus;
pub mod change;
pub mod config;
pub mod error;
pub mod history;
pub mod store;
pub mod world;

pub use bus::{Authority, BusError, ChangeBus, ObserverFeed, SubmitHandle};
pub use change::{Change, Patch, PatchMode, CHANGE_MAGIC};
pub use config::{ConfigError, EditConfig};
pub use error::{EditError, Result};
pub use history::{Snapshot, SnapshotHash, UndoHistory};
pub use store::{ContentId, FsWorldStore, MemoryWorldStore, StoreError, WorldStore};
pub use world::{ApplyOutcome, World, WorldListener};
