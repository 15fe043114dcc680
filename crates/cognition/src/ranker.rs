//! Relevance Ranker - 排序编排
//!
//! 流程：分析查询 → 预筛选 → 逐条打分 → 阈值过滤 → 排序 → 截断

use crate::analyzer::TextAnalyzer;
use crate::prefilter::CandidatePrefilter;
use crate::scoring::ScoringEngine;
use chrono::{DateTime, Utc};
use memrank_core::MemoryRecord;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

/// 带分数的候选记忆（只在排序过程中存在）
#[derive(Debug, Clone, Copy)]
pub struct ScoredCandidate<'a> {
    pub record: &'a MemoryRecord,
    pub score: f64,
}

impl ScoredCandidate<'_> {
    /// 分数降序，同分时较新的在前
    pub fn rank_order(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| other.record.timestamp.cmp(&self.record.timestamp))
    }
}

/// 相关性排序器
#[derive(Debug)]
pub struct RelevanceRanker {
    analyzer: Arc<TextAnalyzer>,
    prefilter: CandidatePrefilter,
    scoring: ScoringEngine,
    threshold: f64,
    min_query_chars: usize,
}

impl RelevanceRanker {
    pub fn new(
        analyzer: Arc<TextAnalyzer>,
        prefilter: CandidatePrefilter,
        scoring: ScoringEngine,
        threshold: f64,
        min_query_chars: usize,
    ) -> Self {
        Self {
            analyzer,
            prefilter,
            scoring,
            threshold,
            min_query_chars,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// 排序并返回最相关的至多 `limit` 条记忆
    pub fn rank<'a>(
        &self,
        query: &str,
        memories: &'a [MemoryRecord],
        limit: usize,
        now: DateTime<Utc>,
    ) -> Vec<&'a MemoryRecord> {
        let mut scored = self.score_candidates(query, memories, now);
        scored.retain(|candidate| candidate.score >= self.threshold);
        scored.sort_by(|a, b| a.rank_order(b));
        scored.truncate(limit);

        debug!(
            "Ranked {} memories, returning {} (threshold {})",
            memories.len(),
            scored.len(),
            self.threshold
        );
        scored.into_iter().map(|candidate| candidate.record).collect()
    }

    /// 对预筛选后的候选逐条打分（不过滤、不排序）
    pub fn score_candidates<'a>(
        &self,
        query: &str,
        memories: &'a [MemoryRecord],
        now: DateTime<Utc>,
    ) -> Vec<ScoredCandidate<'a>> {
        if memories.is_empty() || query.trim().chars().count() < self.min_query_chars {
            return Vec::new();
        }

        let query_info = self.analyzer.analyze(query);
        let flags = query_info.flags();
        let candidates = self.prefilter.prefilter(&query_info, memories, now);

        candidates
            .into_iter()
            .map(|record| {
                let candidate_info = self.analyzer.analyze(&record.content);
                let score = self
                    .scoring
                    .score(&query_info, &candidate_info, record, flags, now);
                ScoredCandidate { record, score }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decay::TimeDecayModel;
    use crate::lexicon::Lexicon;
    use crate::segmenter::DictionarySegmenter;
    use chrono::Duration;
    use memrank_core::{AnalyzerConfig, PrefilterConfig, ScoringWeights};

    fn ranker(threshold: f64) -> RelevanceRanker {
        let lexicon = Arc::new(Lexicon::builtin());
        let segmenter = Arc::new(DictionarySegmenter::from_lexicon(&lexicon));
        let analyzer = Arc::new(TextAnalyzer::new(
            segmenter,
            Arc::clone(&lexicon),
            AnalyzerConfig::default(),
        ));
        RelevanceRanker::new(
            analyzer,
            CandidatePrefilter::new(PrefilterConfig::default(), Arc::clone(&lexicon)),
            ScoringEngine::new(ScoringWeights::default(), lexicon, TimeDecayModel::default()),
            threshold,
            3,
        )
    }

    #[test]
    fn test_rank_order_breaks_ties_by_timestamp() {
        let now = Utc::now();
        let old = MemoryRecord::new("a").with_timestamp(now - Duration::days(3));
        let new = MemoryRecord::new("b").with_timestamp(now);

        let a = ScoredCandidate { record: &old, score: 0.5 };
        let b = ScoredCandidate { record: &new, score: 0.5 };
        let c = ScoredCandidate { record: &old, score: 0.9 };

        let mut list = vec![a, b, c];
        list.sort_by(|x, y| x.rank_order(y));
        assert_eq!(list[0].score, 0.9);
        assert_eq!(list[1].record.id, new.id);
        assert_eq!(list[2].record.id, old.id);
    }

    #[test]
    fn test_guards_return_empty() {
        let ranker = ranker(0.0);
        let now = Utc::now();
        let memories = vec![MemoryRecord::new("今天去看电影了")];

        assert!(ranker.rank("看电影", &[], 3, now).is_empty());
        assert!(ranker.rank("电影", &memories, 3, now).is_empty());
        assert!(ranker.rank("  ab  ", &memories, 3, now).is_empty());
    }

    #[test]
    fn test_threshold_filters() {
        let now = Utc::now();
        let memories = vec![
            MemoryRecord::new("周末和朋友去看电影").with_timestamp(now),
            MemoryRecord::new("买了新的信用卡").with_timestamp(now),
        ];

        let strict = ranker(0.3).rank("最近看了什么电影", &memories, 3, now);
        assert_eq!(strict.len(), 1);
        assert_eq!(strict[0].id, memories[0].id);

        let lenient = ranker(0.0).rank("最近看了什么电影", &memories, 3, now);
        assert_eq!(lenient.len(), 2);
    }

    #[test]
    fn test_scores_are_exposed_for_all_candidates() {
        let now = Utc::now();
        let memories: Vec<_> = (0..4)
            .map(|i| MemoryRecord::new(format!("第{i}次开会讨论项目")).with_timestamp(now))
            .collect();

        let scored = ranker(0.3).score_candidates("项目会议怎么样", &memories, now);
        assert_eq!(scored.len(), 4);
        assert!(scored.iter().all(|c| c.score.is_finite() && c.score >= 0.0));
    }

    #[test]
    fn test_limit_zero() {
        let now = Utc::now();
        let memories = vec![MemoryRecord::new("周末去看电影").with_timestamp(now)];
        assert!(ranker(0.0).rank("周末看电影", &memories, 0, now).is_empty());
    }
}
