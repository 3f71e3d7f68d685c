//! Per-conversation write serialization.
//!
//! Every operation that reads an order index or a version number and then
//! writes based on it holds the conversation's lock for the whole
//! read-modify-write, including the gateway call. Locks for different
//! conversations are independent.
//!
//! Entries live only while someone holds or waits on them: the last guard
//! to go removes its conversation from the registry.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

type Registry = DashMap<Uuid, Arc<Mutex<()>>>;

/// Registry of async mutexes keyed by conversation id.
#[derive(Clone, Default)]
pub struct ConversationLocks {
    locks: Arc<Registry>,
}

impl ConversationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `conversation_id`.
    ///
    /// The returned guard releases the lock on drop.
    pub async fn acquire(&self, conversation_id: Uuid) -> ConversationGuard {
        // Clone the Arc out so the map shard is not held across the await.
        let lock = self
            .locks
            .entry(conversation_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        // Built before the await so a cancelled waiter still cleans up.
        let mut guard = ConversationGuard {
            conversation_id,
            registry: Arc::clone(&self.locks),
            held: None,
        };
        guard.held = Some(lock.lock_owned().await);
        guard
    }

    /// Number of conversations currently locked or waited on.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Exclusive access to one conversation.
pub struct ConversationGuard {
    conversation_id: Uuid,
    registry: Arc<Registry>,
    held: Option<OwnedMutexGuard<()>>,
}

impl Drop for ConversationGuard {
    fn drop(&mut self) {
        // Release first so our own reference no longer counts.
        self.held.take();
        self.registry
            .remove_if(&self.conversation_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl std::fmt::Debug for ConversationGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationGuard")
            .field("conversation_id", &self.conversation_id)
            .field("held", &self.held.is_some())
            .finish()
    }
}

impl std::fmt::Debug for ConversationLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationLocks")
            .field("tracked", &self.locks.len())
            .finish()
    }
}
