//! Candidate Prefilter - 候选预筛选
//!
//! 记忆较多时，先按查询意图粗筛出值得精细打分的子集：
//! 1. 提到"最近" → 按时间取较新的一半
//! 2. 情感类查询 → 情感类分类的记忆优先
//! 3. 有预测分类 → 同分类的记忆优先
//! 4. 其他 → 重要度与新近度的综合分取前三分之一
//!
//! 结果不足 `min_candidates` 时用高重要度记忆补足。

use crate::decay::recency_weight;
use crate::lexicon::Lexicon;
use chrono::{DateTime, Utc};
use memrank_core::{MemoryId, MemoryRecord, PrefilterConfig, TextInfo};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// 预筛选分支
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefilterBranch {
    /// 记忆数量不多，全部保留
    All,
    Recent,
    Emotional,
    Category,
    General,
}

/// 候选预筛选器
#[derive(Debug, Clone)]
pub struct CandidatePrefilter {
    config: PrefilterConfig,
    lexicon: Arc<Lexicon>,
}

impl CandidatePrefilter {
    pub fn new(config: PrefilterConfig, lexicon: Arc<Lexicon>) -> Self {
        Self { config, lexicon }
    }

    /// 查询会走的分支
    pub fn branch(&self, query: &TextInfo, memory_count: usize) -> PrefilterBranch {
        if memory_count <= self.config.narrow_above {
            PrefilterBranch::All
        } else if query.is_recent_reference {
            PrefilterBranch::Recent
        } else if query.is_emotional_query {
            PrefilterBranch::Emotional
        } else if !query.categories.is_empty() {
            PrefilterBranch::Category
        } else {
            PrefilterBranch::General
        }
    }

    /// 预筛选
    pub fn prefilter<'a>(
        &self,
        query: &TextInfo,
        memories: &'a [MemoryRecord],
        now: DateTime<Utc>,
    ) -> Vec<&'a MemoryRecord> {
        let branch = self.branch(query, memories.len());

        let mut candidates = match branch {
            PrefilterBranch::All => return memories.iter().collect(),
            PrefilterBranch::Recent => {
                let mut sorted: Vec<&MemoryRecord> = memories.iter().collect();
                sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
                sorted.truncate(memories.len() / 2);
                sorted
            }
            PrefilterBranch::Emotional => self.partition(memories, |record| {
                self.lexicon.is_emotional_category(&record.category)
            }),
            PrefilterBranch::Category => {
                self.partition(memories, |record| query.has_category(&record.category))
            }
            PrefilterBranch::General => self.general(memories, now),
        };

        self.pad(&mut candidates, memories);

        debug!(
            "Prefilter {:?}: {} of {} memories kept",
            branch,
            candidates.len(),
            memories.len()
        );
        candidates
    }

    /// 命中分区足够多时只用分区，否则补上其余记忆中重要度最高的若干条
    fn partition<'a, F>(&self, memories: &'a [MemoryRecord], matches: F) -> Vec<&'a MemoryRecord>
    where
        F: Fn(&MemoryRecord) -> bool,
    {
        let (mut matched, mut rest): (Vec<&MemoryRecord>, Vec<&MemoryRecord>) =
            memories.iter().partition(|record| matches(*record));

        if matched.len() < self.config.partition_min {
            rest.sort_by(|a, b| by_importance(a, b));
            rest.truncate(self.config.rest_top_k);
            matched.extend(rest);
            dedup_by_id(&mut matched);
        }

        matched.sort_by(|a, b| by_importance(a, b));
        matched
    }

    fn general<'a>(&self, memories: &'a [MemoryRecord], now: DateTime<Utc>) -> Vec<&'a MemoryRecord> {
        let mut scored: Vec<(&MemoryRecord, f64)> = memories
            .iter()
            .map(|record| (record, self.hybrid_score(record, now)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let keep = (memories.len() / 3).max(1);
        scored.into_iter().take(keep).map(|(record, _)| record).collect()
    }

    /// 综合分：重要度与新近度加权
    pub fn hybrid_score(&self, record: &MemoryRecord, now: DateTime<Utc>) -> f64 {
        let importance = f64::from(record.clamped_importance()) / 10.0;
        let recency = recency_weight(record.timestamp, now, self.config.recency_horizon_days);
        self.config.importance_weight * importance + self.config.recency_weight * recency
    }

    fn pad<'a>(&self, candidates: &mut Vec<&'a MemoryRecord>, memories: &'a [MemoryRecord]) {
        let min = self.config.min_candidates;
        if candidates.len() >= min || memories.len() <= min {
            return;
        }

        let included: HashSet<MemoryId> = candidates.iter().map(|record| record.id).collect();
        let mut extra: Vec<&MemoryRecord> = memories
            .iter()
            .filter(|record| !included.contains(&record.id))
            .collect();
        extra.sort_by(|a, b| by_importance(a, b));

        let missing = min - candidates.len();
        candidates.extend(extra.into_iter().take(missing));
        dedup_by_id(candidates);
    }
}

/// 重要度降序，同重要度时较新的在前
fn by_importance(a: &MemoryRecord, b: &MemoryRecord) -> Ordering {
    b.clamped_importance()
        .cmp(&a.clamped_importance())
        .then_with(|| b.timestamp.cmp(&a.timestamp))
}

fn dedup_by_id(records: &mut Vec<&MemoryRecord>) {
    let mut seen = HashSet::new();
    records.retain(|record| seen.insert(record.id));
}
