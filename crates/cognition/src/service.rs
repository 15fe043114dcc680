//! Relevance Service - 异步召回服务
//!
//! 在阻塞线程池中执行排序，并用超时包住整次调用。
//! 任何失败（存储出错、任务异常、超时）都按"没有相关记忆"处理。

use crate::engine::RelevanceEngine;
use memrank_core::{ConversationId, MemoryRecord};
use memrank_storage::SharedMemorySource;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// 召回服务
#[derive(Clone)]
pub struct RelevanceService {
    engine: Arc<RelevanceEngine>,
    source: SharedMemorySource,
}

impl RelevanceService {
    pub fn new(engine: Arc<RelevanceEngine>, source: SharedMemorySource) -> Self {
        Self { engine, source }
    }

    pub fn engine(&self) -> &Arc<RelevanceEngine> {
        &self.engine
    }

    fn rank_timeout(&self) -> Duration {
        Duration::from_millis(self.engine.config().rank_timeout_ms)
    }

    /// 读取会话记忆并排序
    pub async fn recall(
        &self,
        conversation: &ConversationId,
        query: &str,
        limit: usize,
    ) -> Vec<MemoryRecord> {
        let memories = match self.source.memories(conversation).await {
            Ok(memories) => memories,
            Err(e) => {
                warn!("Failed to load memories for {}: {}", conversation, e);
                return Vec::new();
            }
        };
        debug!("Loaded {} memories for {}", memories.len(), conversation);

        self.rank_detached(query, memories, limit).await
    }

    /// 对调用方提供的记忆排序
    pub async fn rank_detached(
        &self,
        query: &str,
        memories: Vec<MemoryRecord>,
        limit: usize,
    ) -> Vec<MemoryRecord> {
        if memories.is_empty() {
            return Vec::new();
        }

        let engine = Arc::clone(&self.engine);
        let query = query.to_string();
        let task = tokio::task::spawn_blocking(move || engine.rank(&query, &memories, limit));

        match timeout(self.rank_timeout(), task).await {
            Ok(Ok(ranked)) => ranked,
            Ok(Err(e)) => {
                warn!("Ranking task failed: {}", e);
                Vec::new()
            }
            Err(_) => {
                warn!(
                    "Ranking timed out after {}ms, returning no memories",
                    self.engine.config().rank_timeout_ms
                );
                Vec::new()
            }
        }
    }
}
