//! Queue registry: finds or creates the queue for a room.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dibs_protocol::RoomName;

use crate::RoomQueue;

/// Handle to one room's queue and its exclusive section.
///
/// Cheap to clone. Every read or write of the queue, including a grace
/// timer's re-check, goes through [`lock`](Self::lock).
#[derive(Debug, Clone, Default)]
pub struct SharedQueue {
    inner: Arc<Mutex<RoomQueue>>,
}

impl SharedQueue {
    /// Enters the room's exclusive section.
    ///
    /// A poisoned lock is recovered: queue operations leave the line in a
    /// consistent state before anything that could panic.
    pub fn lock(&self) -> MutexGuard<'_, RoomQueue> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Maps room names to their queues.
///
/// Queues are created on first reference and live as long as the
/// registry. The map has its own lock, held only for lookup and insert,
/// so work in one room never waits on another.
#[derive(Debug, Default)]
pub struct QueueRegistry {
    rooms: Mutex<HashMap<RoomName, SharedQueue>>,
}

impl QueueRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the queue for `room`, creating it if this is the first
    /// reference.
    pub fn queue(&self, room: &RoomName) -> SharedQueue {
        let mut rooms = self.rooms();
        if let Some(queue) = rooms.get(room) {
            return queue.clone();
        }

        let queue = SharedQueue::default();
        rooms.insert(room.clone(), queue.clone());
        tracing::info!(%room, "room queue created");
        queue
    }

    /// Returns the queue for `room` without creating one.
    pub fn get(&self, room: &RoomName) -> Option<SharedQueue> {
        self.rooms().get(room).cloned()
    }

    /// Number of rooms seen so far.
    pub fn room_count(&self) -> usize {
        self.rooms().len()
    }

    /// Names of all rooms seen so far, in no particular order.
    pub fn room_names(&self) -> Vec<RoomName> {
        self.rooms().keys().cloned().collect()
    }

    fn rooms(&self) -> MutexGuard<'_, HashMap<RoomName, SharedQueue>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
