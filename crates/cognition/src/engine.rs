//! Relevance Engine - 相关性引擎
//!
//! 构造一次，持有配置、词表、分词器和分析缓存，对外只暴露 `rank`。
//! 没有进程级全局状态：需要几套配置就构造几个引擎。

use crate::analyzer::TextAnalyzer;
use crate::cache::CacheStats;
use crate::decay::TimeDecayModel;
use crate::lexicon::Lexicon;
use crate::prefilter::CandidatePrefilter;
use crate::ranker::{RelevanceRanker, ScoredCandidate};
use crate::scoring::ScoringEngine;
use crate::segmenter::{DictionarySegmenter, Segmenter};
use chrono::{DateTime, Utc};
use memrank_core::{MemoryRecord, RelevanceConfig, TextInfo};
use std::sync::Arc;
use tracing::info;

/// 相关性引擎
#[derive(Debug)]
pub struct RelevanceEngine {
    config: RelevanceConfig,
    lexicon: Arc<Lexicon>,
    segmenter: Arc<dyn Segmenter>,
    analyzer: Arc<TextAnalyzer>,
    ranker: RelevanceRanker,
}

impl RelevanceEngine {
    /// 使用内置词表创建引擎
    pub fn new(config: RelevanceConfig, segmenter: Arc<dyn Segmenter>) -> Self {
        Self::with_lexicon(config, segmenter, Arc::new(Lexicon::builtin()))
    }

    /// 使用内置词表和内置词典分词器创建引擎
    pub fn with_builtin_segmenter(config: RelevanceConfig) -> Self {
        let lexicon = Arc::new(Lexicon::builtin());
        let segmenter = Arc::new(DictionarySegmenter::from_lexicon(&lexicon));
        Self::with_lexicon(config, segmenter, lexicon)
    }

    pub fn with_lexicon(
        config: RelevanceConfig,
        segmenter: Arc<dyn Segmenter>,
        lexicon: Arc<Lexicon>,
    ) -> Self {
        let (analyzer, ranker) = build_pipeline(&config, &segmenter, &lexicon);
        info!(
            "Relevance engine ready (threshold {}, cache capacity {})",
            config.relevance_threshold, config.analyzer.cache_capacity
        );
        Self {
            config,
            lexicon,
            segmenter,
            analyzer,
            ranker,
        }
    }

    /// 排序：返回最相关的至多 `limit` 条记忆
    pub fn rank(&self, query: &str, memories: &[MemoryRecord], limit: usize) -> Vec<MemoryRecord> {
        self.rank_at(query, memories, limit, Utc::now())
    }

    /// 使用配置中的默认数量排序
    pub fn rank_default(&self, query: &str, memories: &[MemoryRecord]) -> Vec<MemoryRecord> {
        self.rank(query, memories, self.config.default_limit)
    }

    /// 以指定时间为"现在"排序
    pub fn rank_at(
        &self,
        query: &str,
        memories: &[MemoryRecord],
        limit: usize,
        now: DateTime<Utc>,
    ) -> Vec<MemoryRecord> {
        self.ranker
            .rank(query, memories, limit, now)
            .into_iter()
            .cloned()
            .collect()
    }

    /// 预筛选后的候选及其分数（未过滤、未排序）
    pub fn score_candidates<'a>(
        &self,
        query: &str,
        memories: &'a [MemoryRecord],
        now: DateTime<Utc>,
    ) -> Vec<ScoredCandidate<'a>> {
        self.ranker.score_candidates(query, memories, now)
    }

    pub fn analyze(&self, text: &str) -> Arc<TextInfo> {
        self.analyzer.analyze(text)
    }

    pub fn config(&self) -> &RelevanceConfig {
        &self.config
    }

    pub fn lexicon(&self) -> &Arc<Lexicon> {
        &self.lexicon
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.analyzer.cache_stats()
    }

    pub fn clear_cache(&self) {
        self.analyzer.clear_cache();
        info!("TextInfo cache cleared");
    }

    /// 替换配置并重建各组件；分析缓存随之清空
    pub fn reconfigure(&mut self, config: RelevanceConfig) {
        self.analyzer.clear_cache();
        let (analyzer, ranker) = build_pipeline(&config, &self.segmenter, &self.lexicon);
        self.analyzer = analyzer;
        self.ranker = ranker;
        self.config = config;
        info!(
            "Relevance engine reconfigured (threshold {})",
            self.config.relevance_threshold
        );
    }
}

fn build_pipeline(
    config: &RelevanceConfig,
    segmenter: &Arc<dyn Segmenter>,
    lexicon: &Arc<Lexicon>,
) -> (Arc<TextAnalyzer>, RelevanceRanker) {
    let analyzer = Arc::new(TextAnalyzer::new(
        Arc::clone(segmenter),
        Arc::clone(lexicon),
        config.analyzer.clone(),
    ));
    let scoring = ScoringEngine::new(
        config.scoring.clone(),
        Arc::clone(lexicon),
        TimeDecayModel::new(config.decay.clone()),
    );
    let ranker = RelevanceRanker::new(
        Arc::clone(&analyzer),
        CandidatePrefilter::new(config.prefilter.clone(), Arc::clone(lexicon)),
        scoring,
        config.relevance_threshold,
        config.min_query_chars,
    );
    (analyzer, ranker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmenter::UnavailableSegmenter;
    use chrono::Duration;

    #[test]
    fn test_rank_returns_owned_records() {
        let engine = RelevanceEngine::with_builtin_segmenter(RelevanceConfig::default());
        let memories = vec![MemoryRecord::new("周末和朋友去看电影").with_category("兴趣爱好")];

        let ranked = engine.rank("周末想看电影", &memories, 3);
        assert_eq!(ranked, memories);
    }

    #[test]
    fn test_rank_default_uses_configured_limit() {
        let engine = RelevanceEngine::with_builtin_segmenter(RelevanceConfig {
            relevance_threshold: 0.0,
            default_limit: 2,
            ..Default::default()
        });
        let memories: Vec<_> = (0..5).map(|i| MemoryRecord::new(format!("电影 {i}"))).collect();

        assert_eq!(engine.rank_default("看电影吧", &memories).len(), 2);
    }

    #[test]
    fn test_cache_stats_and_reconfigure() {
        let mut engine = RelevanceEngine::with_builtin_segmenter(RelevanceConfig::default());
        let memories = vec![MemoryRecord::new("周末和朋友去看电影")];

        engine.rank("周末想看电影", &memories, 3);
        engine.rank("周末想看电影", &memories, 3);
        let stats = engine.cache_stats();
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.len, 2);

        engine.reconfigure(RelevanceConfig::auxiliary());
        assert_eq!(engine.config().relevance_threshold, 0.22);
        let stats = engine.cache_stats();
        assert_eq!(stats.len, 0);
        assert_eq!(stats.hits + stats.misses, 0);
    }

    #[test]
    fn test_clear_cache() {
        let engine = RelevanceEngine::with_builtin_segmenter(RelevanceConfig::default());
        engine.analyze("今天心情不错");
        assert_eq!(engine.cache_stats().len, 1);
        engine.clear_cache();
        assert_eq!(engine.cache_stats().len, 0);
    }

    #[test]
    fn test_unavailable_segmenter_still_ranks() {
        let engine = RelevanceEngine::new(
            RelevanceConfig::default(),
            Arc::new(UnavailableSegmenter::new("not loaded")),
        );
        let now = Utc::now();
        let memories = vec![
            MemoryRecord::new("最近工作压力很大，经常焦虑")
                .with_category("健康医疗")
                .with_importance(8)
                .with_timestamp(now - Duration::days(2)),
            MemoryRecord::new("买了一台新电脑").with_timestamp(now - Duration::days(300)),
        ];

        let ranked = engine.rank_at("我最近好焦虑，工作压力好大", &memories, 3, now);
        assert_eq!(ranked.first().map(|r| r.id), Some(memories[0].id));
    }
}
