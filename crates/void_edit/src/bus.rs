//! Change bus - transport between submitters, the authority and observers
//!
//! Submitters encode changes into a bounded inbox. The authority drains
//! the inbox in FIFO order, applies each change to its own world, and
//! broadcasts the ones that applied to every observer feed. Observers
//! apply what they receive in the order it arrives.
//!
//! ```text
//! SubmitHandle ──┐
//!                ├──► inbox ──► Authority::pump ──► World::apply
//! SubmitHandle ──┘                    │
//!                                     └──► broadcast ──► ObserverFeed*
//! ```

use crate::change::Change;
use crate::error::Result as EditResult;
use crate::world::{ApplyOutcome, World};
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use parking_lot::Mutex;
use thiserror::Error;
use void_scene::{CodecError, LiveRuntime};

/// Errors from the change bus
#[derive(Debug, Error)]
pub enum BusError {
    /// The receiving queue is at capacity
    #[error("change queue is full")]
    Full,

    /// The other end of the channel is gone
    #[error("change channel disconnected")]
    Disconnected,

    #[error("change codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Bounded inbox to the authority plus the list of observer feeds
pub struct ChangeBus {
    capacity: usize,
    inbox_tx: Sender<Vec<u8>>,
    inbox_rx: Receiver<Vec<u8>>,
    observers: Mutex<Vec<Sender<Vec<u8>>>>,
}

impl ChangeBus {
    /// Create a bus whose inbox and observer feeds hold `capacity` changes
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (inbox_tx, inbox_rx) = bounded(capacity);
        Self {
            capacity,
            inbox_tx,
            inbox_rx,
            observers: Mutex::new(Vec::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Handle for submitting changes to the authority
    pub fn submitter(&self) -> SubmitHandle {
        SubmitHandle {
            sender: self.inbox_tx.clone(),
        }
    }

    /// Register a new observer feed
    pub fn subscribe(&self) -> ObserverFeed {
        let (sender, receiver) = bounded(self.capacity);
        self.observers.lock().push(sender);
        ObserverFeed { receiver }
    }

    /// Number of connected observers
    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }

    /// Changes waiting in the inbox
    pub fn pending(&self) -> usize {
        self.inbox_rx.len()
    }

    /// Take every pending change in FIFO order. Undecodable payloads are
    /// logged and skipped.
    pub fn drain(&self) -> Vec<Change> {
        self.inbox_rx
            .try_iter()
            .filter_map(|bytes| match Change::decode(&bytes) {
                Ok(change) => Some(change),
                Err(err) => {
                    log::warn!("Dropping undecodable submitted change: {}", err);
                    None
                }
            })
            .collect()
    }

    /// Send a change to every observer. Disconnected observers are pruned.
    /// Returns the number of observers reached.
    pub fn broadcast(&self, change: &Change) -> std::result::Result<usize, BusError> {
        let bytes = change.encode()?;
        let mut observers = self.observers.lock();
        let mut reached = 0;
        observers.retain(|observer| match observer.try_send(bytes.clone()) {
            Ok(()) => {
                reached += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                log::warn!("Observer feed full, dropping {}", change.kind_name());
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
        Ok(reached)
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

/// Sending side of the authority inbox
#[derive(Clone)]
pub struct SubmitHandle {
    sender: Sender<Vec<u8>>,
}

impl SubmitHandle {
    /// Encode and submit a change
    pub fn submit(&self, change: &Change) -> std::result::Result<(), BusError> {
        let bytes = change.encode()?;
        self.sender.try_send(bytes).map_err(|err| match err {
            TrySendError::Full(_) => BusError::Full,
            TrySendError::Disconnected(_) => BusError::Disconnected,
        })
    }
}

/// Receiving side of one observer's broadcast feed
pub struct ObserverFeed {
    receiver: Receiver<Vec<u8>>,
}

impl ObserverFeed {
    /// Next broadcast change, `None` if nothing is waiting
    pub fn try_next(&self) -> std::result::Result<Option<Change>, BusError> {
        match self.receiver.try_recv() {
            Ok(bytes) => Ok(Some(Change::decode(&bytes)?)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(BusError::Disconnected),
        }
    }

    /// Every waiting change, in arrival order. Undecodable payloads are
    /// logged and skipped.
    pub fn drain(&self) -> Vec<Change> {
        self.receiver
            .try_iter()
            .filter_map(|bytes| match Change::decode(&bytes) {
                Ok(change) => Some(change),
                Err(err) => {
                    log::warn!("Dropping undecodable broadcast change: {}", err);
                    None
                }
            })
            .collect()
    }
}

/// The participant whose applied order is canonical
pub struct Authority<R: LiveRuntime> {
    world: World<R>,
    bus: ChangeBus,
}

impl<R: LiveRuntime> Authority<R> {
    pub fn new(world: World<R>, bus: ChangeBus) -> Self {
        Self { world, bus }
    }

    pub fn world(&self) -> &World<R> {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World<R> {
        &mut self.world
    }

    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    pub fn submitter(&self) -> SubmitHandle {
        self.bus.submitter()
    }

    pub fn subscribe(&self) -> ObserverFeed {
        self.bus.subscribe()
    }

    /// Apply a change made on the authority itself and broadcast it
    pub async fn apply_local(&mut self, change: &Change) -> EditResult<ApplyOutcome> {
        let outcome = self.world.apply(change).await?;
        self.publish(change, outcome);
        Ok(outcome)
    }

    /// Apply every submitted change in order and broadcast the ones that
    /// changed the tree. Returns one outcome per drained change.
    pub async fn pump(&mut self) -> Vec<EditResult<ApplyOutcome>> {
        let changes = self.bus.drain();
        let mut outcomes = Vec::with_capacity(changes.len());
        for change in changes {
            let outcome = self.world.apply(&change).await;
            match &outcome {
                Ok(applied) => self.publish(&change, *applied),
                Err(err) => log::warn!("Rejected submitted {}: {}", change.kind_name(), err),
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    fn publish(&self, change: &Change, outcome: ApplyOutcome) {
        if outcome != ApplyOutcome::Applied {
            return;
        }
        if let Err(err) = self.bus.broadcast(change) {
            log::warn!("Failed to broadcast {}: {}", change.kind_name(), err);
        }
    }
}
