//! Memory source trait definition
//!
//! Read-only interface the relevance engine consumes; producers own the data.

use async_trait::async_trait;
use memrank_core::{ConversationId, MemoryRecord};
use std::sync::Arc;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Supplies the memories of one conversation
#[async_trait]
pub trait MemorySource: Send + Sync {
    async fn memories(&self, conversation: &ConversationId)
        -> Result<Vec<MemoryRecord>, StorageError>;
}

/// Shared memory source reference
pub type SharedMemorySource = Arc<dyn MemorySource>;
