//! Scoring Engine - 相关性打分
//!
//! 最终分数 = (各子分数加权和 + 各项奖励) × 重要度因子 × 时间因子
//!
//! 子分数：
//! - bag_similarity: 加权词袋余弦相似度
//! - keyword / entity / number: 关键词、专名、数字的重合度
//! - emotional / slang: 情感词、流行语的重合度
//!
//! 奖励：同分类、关键词精确命中、情感类查询命中情感类分类。

use crate::decay::{DecayMode, TimeDecayModel};
use crate::lexicon::Lexicon;
use chrono::{DateTime, Utc};
use memrank_core::{MemoryRecord, QueryFlags, ScoringWeights, TextInfo};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// 打分明细
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreBreakdown {
    pub bag_similarity: f64,
    pub keyword: f64,
    pub entity: f64,
    pub number: f64,
    pub emotional: f64,
    pub slang: f64,
    pub category_bonus: f64,
    pub exact_keyword_bonus: f64,
    pub emotional_category_bonus: f64,
    pub importance_factor: f64,
    pub time_factor: f64,
}

impl ScoreBreakdown {
    /// 按权重合成最终分数
    pub fn total(&self, weights: &ScoringWeights) -> f64 {
        let weighted = self.bag_similarity * weights.bag_similarity
            + self.keyword * weights.keyword
            + self.entity * weights.entity
            + self.number * weights.number
            + self.emotional * weights.emotional
            + self.slang * weights.slang;
        let bonuses = self.category_bonus + self.exact_keyword_bonus + self.emotional_category_bonus;
        (weighted + bonuses) * self.importance_factor * self.time_factor
    }
}

/// 打分引擎
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    weights: ScoringWeights,
    lexicon: Arc<Lexicon>,
    decay: TimeDecayModel,
}

impl ScoringEngine {
    pub fn new(weights: ScoringWeights, lexicon: Arc<Lexicon>, decay: TimeDecayModel) -> Self {
        Self {
            weights,
            lexicon,
            decay,
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// 计算候选记忆的最终分数；非有限值按 0 处理
    pub fn score(
        &self,
        query: &TextInfo,
        candidate: &TextInfo,
        record: &MemoryRecord,
        flags: QueryFlags,
        now: DateTime<Utc>,
    ) -> f64 {
        let score = self.breakdown(query, candidate, record, flags, now).total(&self.weights);
        if score.is_finite() {
            score
        } else {
            warn!("Non-finite score for memory {}, skipping", record.id);
            0.0
        }
    }

    /// 计算打分明细
    pub fn breakdown(
        &self,
        query: &TextInfo,
        candidate: &TextInfo,
        record: &MemoryRecord,
        flags: QueryFlags,
        now: DateTime<Utc>,
    ) -> ScoreBreakdown {
        let w = &self.weights;

        let emotional = if flags.is_emotional_query {
            overlap_ratio(&query.emotional_words, &candidate.emotional_words)
        } else {
            0.0
        };

        let category_bonus = if query.has_category(&record.category) {
            w.category_bonus
        } else {
            0.0
        };

        let exact_keyword_bonus = if self.has_exact_keyword(query, record) {
            w.exact_keyword_bonus
        } else {
            0.0
        };

        let emotional_category_bonus =
            if flags.is_emotional_query && self.lexicon.is_emotional_category(&record.category) {
                w.emotional_category_bonus
            } else {
                0.0
            };

        ScoreBreakdown {
            bag_similarity: self.bag_similarity(&query.tokens, &candidate.tokens),
            keyword: self.keyword_score(&query.keywords, &candidate.keywords),
            entity: self.entity_score(&query.entities, &candidate.entities),
            number: self.number_score(&query.numbers, &candidate.numbers),
            emotional,
            slang: self.slang_score(&query.slang_words, &candidate.slang_words),
            category_bonus,
            exact_keyword_bonus,
            emotional_category_bonus,
            importance_factor: importance_factor(record),
            time_factor: self
                .decay
                .decay(record.timestamp, DecayMode::for_query(flags), now),
        }
    }

    /// 词的权重：停用词低，情感词/流行语高，长词偏高
    pub fn token_weight(&self, token: &str) -> f64 {
        let w = &self.weights;
        if self.lexicon.is_stopword(token) {
            w.stopword_token
        } else if self.lexicon.is_emotional_word(token) || self.lexicon.is_slang_word(token) {
            w.lexicon_token
        } else if token.chars().count() >= w.long_term_chars {
            w.long_term_token
        } else {
            w.default_token
        }
    }

    /// 加权词袋余弦相似度
    pub fn bag_similarity(&self, a: &[String], b: &[String]) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        let va = self.weighted_bag(a);
        let vb = self.weighted_bag(b);

        let dot: f64 = va
            .iter()
            .filter_map(|(token, x)| vb.get(token).map(|y| x * y))
            .sum();
        let norm_a = va.values().map(|x| x * x).sum::<f64>().sqrt();
        let norm_b = vb.values().map(|x| x * x).sum::<f64>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot / (norm_a * norm_b)
    }

    /// 有序聚合，保证同样输入的浮点求和顺序一致
    fn weighted_bag<'a>(&self, tokens: &'a [String]) -> BTreeMap<&'a str, f64> {
        let mut bag: BTreeMap<&str, f64> = BTreeMap::new();
        for token in tokens {
            *bag.entry(token.as_str()).or_insert(0.0) += self.token_weight(token);
        }
        bag
    }

    /// 关键词重合度，按较短列表归一化
    pub fn keyword_score(&self, a: &[String], b: &[String]) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        let matched = self.match_weight(a, b);
        (matched / (a.len().min(b.len()) as f64 * self.weights.exact_match)).min(1.0)
    }

    /// 专名重合度，按较长列表归一化
    pub fn entity_score(&self, a: &[String], b: &[String]) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        (self.match_weight(a, b) / a.len().max(b.len()) as f64).min(1.0)
    }

    /// 精确匹配计 exact_match，包含关系计 partial_match
    fn match_weight(&self, a: &[String], b: &[String]) -> f64 {
        a.iter()
            .map(|x| {
                if b.iter().any(|y| y == x) {
                    self.weights.exact_match
                } else if b
                    .iter()
                    .any(|y| x.contains(y.as_str()) || y.contains(x.as_str()))
                {
                    self.weights.partial_match
                } else {
                    0.0
                }
            })
            .sum()
    }

    /// 数字重合度：相等或相对差小于容差
    pub fn number_score(&self, a: &[String], b: &[String]) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        let tolerance = self.weights.number_tolerance;
        let matched = a
            .iter()
            .filter(|x| b.iter().any(|y| numbers_close(x, y, tolerance)))
            .count();
        matched as f64 / a.len().max(b.len()) as f64
    }

    /// 流行语重合度，命中越多加成越高
    pub fn slang_score(&self, a: &[String], b: &[String]) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        let matches = a.iter().filter(|x| b.contains(x)).count() as f64;
        let ratio = matches / a.len().max(b.len()) as f64;
        (ratio * (1.0 + self.weights.slang_match_bonus * matches)).min(1.0)
    }

    fn has_exact_keyword(&self, query: &TextInfo, record: &MemoryRecord) -> bool {
        query
            .tokens
            .iter()
            .filter(|token| token.chars().count() > 1)
            .any(|token| {
                record
                    .keywords
                    .iter()
                    .any(|keyword| keyword.to_lowercase() == *token)
            })
    }
}

/// 重要度因子 `1 + (importance - 5) / 10`
pub fn importance_factor(record: &MemoryRecord) -> f64 {
    1.0 + f64::from(record.clamped_importance() - 5) / 10.0
}

fn overlap_ratio(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.iter().filter(|x| b.contains(x)).count();
    shared as f64 / a.len().max(b.len()) as f64
}

fn numbers_close(a: &str, b: &str, tolerance: f64) -> bool {
    if a == b {
        return true;
    }
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => {
            let larger = x.abs().max(y.abs());
            larger > 0.0 && (x - y).abs() / larger < tolerance
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::collections::BTreeSet;

    fn engine() -> ScoringEngine {
        ScoringEngine::new(
            ScoringWeights::default(),
            Arc::new(Lexicon::builtin()),
            TimeDecayModel::default(),
        )
    }

    fn words(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_token_weights() {
        let engine = engine();
        assert!(approx(engine.token_weight("的"), 0.3));
        assert!(approx(engine.token_weight("焦虑"), 2.0));
        assert!(approx(engine.token_weight("躺平"), 2.0));
        assert!(approx(engine.token_weight("阿里巴巴"), 1.5));
        assert!(approx(engine.token_weight("电影"), 1.0));
    }

    #[test]
    fn test_bag_similarity() {
        let engine = engine();
        let a = words(&["工作", "压力", "大"]);
        assert!(approx(engine.bag_similarity(&a, &a), 1.0));
        assert_eq!(engine.bag_similarity(&a, &words(&["电影"])), 0.0);
        assert_eq!(engine.bag_similarity(&a, &[]), 0.0);

        let partial = engine.bag_similarity(&a, &words(&["工作", "顺利"]));
        assert!(partial > 0.0 && partial < 1.0);
    }

    #[test]
    fn test_lexicon_tokens_dominate_similarity() {
        let engine = engine();
        let query = words(&["焦虑", "的"]);
        let emotional = engine.bag_similarity(&query, &words(&["焦虑"]));
        let stopword = engine.bag_similarity(&query, &words(&["的"]));
        assert!(emotional > stopword);
    }

    #[test]
    fn test_keyword_score() {
        let engine = engine();
        let exact = engine.keyword_score(&words(&["压力", "工作"]), &words(&["压力", "工作"]));
        assert!(approx(exact, 1.0));

        // 包含关系：1.0 / (1 × 1.5)
        let partial = engine.keyword_score(&words(&["压力"]), &words(&["工作压力"]));
        assert!(approx(partial, 1.0 / 1.5));

        assert_eq!(engine.keyword_score(&words(&["压力"]), &words(&["电影"])), 0.0);
        assert_eq!(engine.keyword_score(&[], &words(&["电影"])), 0.0);
    }

    #[test]
    fn test_entity_score_uses_longer_list() {
        let engine = engine();
        let score = engine.entity_score(&words(&["北京"]), &words(&["北京", "上海"]));
        // 1.5 / 2
        assert!(approx(score, 0.75));
        let capped = engine.entity_score(&words(&["北京"]), &words(&["北京"]));
        assert!(approx(capped, 1.0));
    }

    #[test]
    fn test_number_score() {
        let engine = engine();
        assert!(approx(engine.number_score(&words(&["2000"]), &words(&["2000"])), 1.0));
        assert!(approx(engine.number_score(&words(&["100"]), &words(&["90"])), 1.0));
        assert_eq!(engine.number_score(&words(&["100"]), &words(&["50"])), 0.0);
        assert!(approx(engine.number_score(&words(&["3", "7"]), &words(&["3"])), 0.5));
        assert!(approx(engine.number_score(&words(&["三百"]), &words(&["三百"])), 1.0));
        assert_eq!(engine.number_score(&words(&["0"]), &words(&["0.0"])), 0.0);
    }

    #[test]
    fn test_slang_score_bonus() {
        let engine = engine();
        let one = engine.slang_score(&words(&["躺平", "内卷"]), &words(&["躺平", "摆烂"]));
        assert!(approx(one, 0.5 * 1.15));
        let full = engine.slang_score(&words(&["躺平"]), &words(&["躺平"]));
        assert!(approx(full, 1.0));
    }

    #[test]
    fn test_importance_factor_clamps() {
        let base = MemoryRecord::new("x");
        assert!(approx(importance_factor(&base.clone().with_importance(5)), 1.0));
        assert!(approx(importance_factor(&base.clone().with_importance(9)), 1.4));
        assert!(approx(importance_factor(&base.clone().with_importance(12)), 1.5));
        assert!(approx(importance_factor(&base.with_importance(-1)), 0.6));
    }

    #[test]
    fn test_breakdown_bonuses() {
        let engine = engine();
        let now = Utc::now();
        let query = TextInfo {
            tokens: words(&["焦虑", "压力"]),
            emotional_words: words(&["焦虑"]),
            categories: BTreeSet::from(["健康医疗".to_string()]),
            is_emotional_query: true,
            ..Default::default()
        };
        let candidate = TextInfo {
            tokens: words(&["焦虑"]),
            emotional_words: words(&["焦虑"]),
            ..Default::default()
        };
        let record = MemoryRecord::new("焦虑")
            .with_category("健康医疗")
            .with_keywords(["压力"])
            .with_timestamp(now - Duration::days(2));

        let breakdown = engine.breakdown(&query, &candidate, &record, query.flags(), now);
        assert!(approx(breakdown.emotional, 1.0));
        assert!(approx(breakdown.category_bonus, 0.15));
        assert!(approx(breakdown.exact_keyword_bonus, 0.2));
        assert!(approx(breakdown.emotional_category_bonus, 0.1));
        assert!(approx(breakdown.importance_factor, 1.0));
        assert!(approx(breakdown.time_factor, 1.0));

        let score = engine.score(&query, &candidate, &record, query.flags(), now);
        assert!(approx(score, breakdown.total(engine.weights())));
        assert!(score > 0.3);
    }

    #[test]
    fn test_emotional_overlap_only_for_emotional_queries() {
        let engine = engine();
        let now = Utc::now();
        let info = TextInfo {
            emotional_words: words(&["开心"]),
            ..Default::default()
        };
        let record = MemoryRecord::new("开心").with_timestamp(now);

        let breakdown = engine.breakdown(&info, &info, &record, QueryFlags::default(), now);
        assert_eq!(breakdown.emotional, 0.0);
        assert_eq!(breakdown.emotional_category_bonus, 0.0);
    }

    #[test]
    fn test_non_finite_score_is_zero() {
        let engine = ScoringEngine::new(
            ScoringWeights {
                category_bonus: f64::INFINITY,
                ..Default::default()
            },
            Arc::new(Lexicon::builtin()),
            TimeDecayModel::new(memrank_core::DecayConfig {
                week_boost: 0.0,
                ..Default::default()
            }),
        );
        let now = Utc::now();
        let query = TextInfo {
            categories: BTreeSet::from(["other".to_string()]),
            is_recent_reference: true,
            ..Default::default()
        };
        let record = MemoryRecord::new("x").with_timestamp(now);

        // inf × 0 = NaN
        let score = engine.score(&query, &TextInfo::default(), &record, query.flags(), now);
        assert_eq!(score, 0.0);
    }
}
