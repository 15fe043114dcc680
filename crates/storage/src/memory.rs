//! In-memory memory source implementation
//!
//! Holds per-conversation memory records for tests and embedders without a database

use async_trait::async_trait;
use memrank_core::{ConversationId, MemoryId, MemoryRecord};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::trait_::{MemorySource, SharedMemorySource, StorageError};

/// In-memory memory store
#[derive(Debug, Default)]
pub struct InMemoryMemoryStore {
    conversations: RwLock<HashMap<ConversationId, Vec<MemoryRecord>>>,
}

impl InMemoryMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite (by id) a record in a conversation
    pub fn insert(&self, conversation: &ConversationId, record: MemoryRecord) {
        let mut conversations = self.conversations.write();
        let records = conversations.entry(conversation.clone()).or_default();
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
    }

    /// Replace all records of a conversation
    pub fn replace(&self, conversation: &ConversationId, records: Vec<MemoryRecord>) {
        debug!(
            "Replacing {} memories for conversation {}",
            records.len(),
            conversation
        );
        self.conversations
            .write()
            .insert(conversation.clone(), records);
    }

    /// Remove a single record
    pub fn remove(&self, conversation: &ConversationId, id: &MemoryId) -> bool {
        let mut conversations = self.conversations.write();
        match conversations.get_mut(conversation) {
            Some(records) => {
                let before = records.len();
                records.retain(|r| &r.id != id);
                records.len() != before
            }
            None => false,
        }
    }

    pub fn clear_conversation(&self, conversation: &ConversationId) {
        self.conversations.write().remove(conversation);
    }

    pub fn len(&self, conversation: &ConversationId) -> usize {
        self.conversations
            .read()
            .get(conversation)
            .map_or(0, Vec::len)
    }

    pub fn is_empty(&self, conversation: &ConversationId) -> bool {
        self.len(conversation) == 0
    }
}

#[async_trait]
impl MemorySource for InMemoryMemoryStore {
    async fn memories(
        &self,
        conversation: &ConversationId,
    ) -> Result<Vec<MemoryRecord>, StorageError> {
        Ok(self
            .conversations
            .read()
            .get(conversation)
            .cloned()
            .unwrap_or_default())
    }
}

/// Create a new shared in-memory store
pub fn create_memory_store() -> (Arc<InMemoryMemoryStore>, SharedMemorySource) {
    let store = Arc::new(InMemoryMemoryStore::new());
    let shared: SharedMemorySource = store.clone();
    (store, shared)
}
