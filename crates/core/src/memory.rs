//! Memory records - 记忆记录
//!
//! 记忆由外部存储产生（对话摘要），引擎只读取，不回写。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 重要度下限
pub const MIN_IMPORTANCE: i32 = 1;

/// 重要度上限
pub const MAX_IMPORTANCE: i32 = 10;

/// Unique identifier for a memory record (uses UUID for compatibility)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemoryId(pub Uuid);

impl MemoryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MemoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MemoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 会话标识（记忆按会话分组）
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 记忆记录
///
/// `importance` 由生产方限制在 [1,10]，但引擎读取时仍会再次截断，
/// 越界值不会导致记录被拒绝。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// 记忆 ID
    pub id: MemoryId,

    /// 摘要内容
    pub content: String,

    /// 生成时间
    pub timestamp: DateTime<Utc>,

    /// 分类（如 "健康医疗"）
    pub category: String,

    /// 重要度 [1,10]
    pub importance: i32,

    /// 关键词（有序）
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl MemoryRecord {
    /// 创建新记忆（默认分类 "other"，重要度 5，时间为当前）
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: MemoryId::new(),
            content: content.into(),
            timestamp: Utc::now(),
            category: "other".to_string(),
            importance: 5,
            keywords: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_importance(mut self, importance: i32) -> Self {
        self.importance = importance;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// 截断到 [1,10] 的重要度
    pub fn clamped_importance(&self) -> i32 {
        self.importance.clamp(MIN_IMPORTANCE, MAX_IMPORTANCE)
    }

    /// 记忆年龄（天，含小数；未来时间按 0 处理）
    pub fn age_days(&self, now: DateTime<Utc>) -> f64 {
        let seconds = (now - self.timestamp).num_seconds().max(0);
        seconds as f64 / 86_400.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_importance_is_clamped() {
        let high = MemoryRecord::new("x").with_importance(12);
        let low = MemoryRecord::new("x").with_importance(-3);
        let normal = MemoryRecord::new("x").with_importance(7);

        assert_eq!(high.clamped_importance(), 10);
        assert_eq!(low.clamped_importance(), 1);
        assert_eq!(normal.clamped_importance(), 7);
    }

    #[test]
    fn test_age_days() {
        let now = Utc::now();
        let record = MemoryRecord::new("x").with_timestamp(now - Duration::hours(36));
        assert!((record.age_days(now) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_future_timestamp_has_zero_age() {
        let now = Utc::now();
        let record = MemoryRecord::new("x").with_timestamp(now + Duration::days(3));
        assert_eq!(record.age_days(now), 0.0);
    }

    #[test]
    fn test_record_deserializes_without_keywords() {
        let json = r#"{
            "id": "6f1c2a3e-0000-4000-8000-000000000001",
            "content": "最近睡不好",
            "timestamp": "2026-01-02T03:04:05Z",
            "category": "健康医疗",
            "importance": 8
        }"#;

        let record: MemoryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.category, "健康医疗");
        assert!(record.keywords.is_empty());
    }
}
