//! memrank 配置系统
//!
//! 支持 YAML 配置文件和环境变量覆盖。
//! 配置在引擎构造时读取一次，排序过程中只读。

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("解析配置失败: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("环境变量 {name} 无法解析: {value}")]
    InvalidEnv { name: String, value: String },

    #[error("配置项 {field} 无效: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// 相关性排序主配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceConfig {
    /// 相关性阈值（低于此分数的记忆不会返回）
    #[serde(default = "default_threshold")]
    pub relevance_threshold: f64,

    /// 默认返回数量
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// 查询最短字符数
    #[serde(default = "default_min_chars")]
    pub min_query_chars: usize,

    /// 异步排序超时 (毫秒)
    #[serde(default = "default_rank_timeout_ms")]
    pub rank_timeout_ms: u64,

    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    #[serde(default)]
    pub prefilter: PrefilterConfig,

    #[serde(default)]
    pub scoring: ScoringWeights,

    #[serde(default)]
    pub decay: DecayConfig,
}

fn default_threshold() -> f64 {
    0.3
}

fn default_limit() -> usize {
    3
}

fn default_min_chars() -> usize {
    3
}

fn default_rank_timeout_ms() -> u64 {
    2000
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: default_threshold(),
            default_limit: default_limit(),
            min_query_chars: default_min_chars(),
            rank_timeout_ms: default_rank_timeout_ms(),
            analyzer: AnalyzerConfig::default(),
            prefilter: PrefilterConfig::default(),
            scoring: ScoringWeights::default(),
            decay: DecayConfig::default(),
        }
    }
}

/// 文本分析配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// 低于此字符数的文本只做朴素切分
    #[serde(default = "default_min_chars")]
    pub min_text_chars: usize,

    /// 关键词提取数量
    #[serde(default = "default_keyword_top_k")]
    pub keyword_top_k: usize,

    /// TextInfo 缓存容量
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// 流行语情感消歧的上下文窗口（字符）
    #[serde(default = "default_slang_window")]
    pub slang_window_chars: usize,
}

fn default_keyword_top_k() -> usize {
    8
}

fn default_cache_capacity() -> usize {
    100
}

fn default_slang_window() -> usize {
    4
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            min_text_chars: default_min_chars(),
            keyword_top_k: default_keyword_top_k(),
            cache_capacity: default_cache_capacity(),
            slang_window_chars: default_slang_window(),
        }
    }
}

/// 候选预筛配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefilterConfig {
    /// 记忆数不超过此值时不做预筛
    #[serde(default = "default_narrow_above")]
    pub narrow_above: usize,

    /// 情感/分类分区达到此数量时直接返回分区
    #[serde(default = "default_partition_min")]
    pub partition_min: usize,

    /// 分区不足时从其余记忆中补充的数量（按重要度）
    #[serde(default = "default_rest_top_k")]
    pub rest_top_k: usize,

    /// 候选最少数量（不足时按重要度补齐）
    #[serde(default = "default_min_candidates")]
    pub min_candidates: usize,

    /// 通用查询混合分中重要度的权重
    #[serde(default = "default_importance_weight")]
    pub importance_weight: f64,

    /// 通用查询混合分中新近度的权重
    #[serde(default = "default_recency_weight")]
    pub recency_weight: f64,

    /// 新近度权重的时间尺度（天）
    #[serde(default = "default_recency_horizon")]
    pub recency_horizon_days: f64,
}

fn default_narrow_above() -> usize {
    10
}

fn default_partition_min() -> usize {
    5
}

fn default_rest_top_k() -> usize {
    10
}

fn default_min_candidates() -> usize {
    5
}

fn default_importance_weight() -> f64 {
    0.7
}

fn default_recency_weight() -> f64 {
    0.3
}

fn default_recency_horizon() -> f64 {
    30.0
}

impl Default for PrefilterConfig {
    fn default() -> Self {
        Self {
            narrow_above: default_narrow_above(),
            partition_min: default_partition_min(),
            rest_top_k: default_rest_top_k(),
            min_candidates: default_min_candidates(),
            importance_weight: default_importance_weight(),
            recency_weight: default_recency_weight(),
            recency_horizon_days: default_recency_horizon(),
        }
    }
}

/// 打分权重
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    #[serde(default = "default_bag_weight")]
    pub bag_similarity: f64,

    #[serde(default = "default_keyword_weight")]
    pub keyword: f64,

    #[serde(default = "default_entity_weight")]
    pub entity: f64,

    #[serde(default = "default_number_weight")]
    pub number: f64,

    #[serde(default = "default_emotional_weight")]
    pub emotional: f64,

    #[serde(default = "default_slang_weight")]
    pub slang: f64,

    /// 记忆分类命中查询分类的加分
    #[serde(default = "default_category_bonus")]
    pub category_bonus: f64,

    /// 查询词与记忆关键词完全相同的加分
    #[serde(default = "default_exact_keyword_bonus")]
    pub exact_keyword_bonus: f64,

    /// 情感查询命中情感类记忆的加分
    #[serde(default = "default_emotional_category_bonus")]
    pub emotional_category_bonus: f64,

    /// 停用词权重
    #[serde(default = "default_stopword_weight")]
    pub stopword_token: f64,

    /// 情感词/流行语权重
    #[serde(default = "default_lexicon_weight")]
    pub lexicon_token: f64,

    /// 长词（疑似术语）权重
    #[serde(default = "default_long_term_weight")]
    pub long_term_token: f64,

    /// 长词的最小字符数
    #[serde(default = "default_long_term_chars")]
    pub long_term_chars: usize,

    #[serde(default = "default_token_weight")]
    pub default_token: f64,

    /// 关键词完全匹配权重
    #[serde(default = "default_exact_match")]
    pub exact_match: f64,

    /// 关键词包含匹配权重
    #[serde(default = "default_partial_match")]
    pub partial_match: f64,

    /// 数字相近判定的相对误差
    #[serde(default = "default_number_tolerance")]
    pub number_tolerance: f64,

    /// 流行语每个命中的加成
    #[serde(default = "default_slang_match_bonus")]
    pub slang_match_bonus: f64,
}

fn default_bag_weight() -> f64 {
    0.30
}

fn default_keyword_weight() -> f64 {
    0.30
}

fn default_entity_weight() -> f64 {
    0.15
}

fn default_number_weight() -> f64 {
    0.10
}

fn default_emotional_weight() -> f64 {
    0.10
}

fn default_slang_weight() -> f64 {
    0.05
}

fn default_category_bonus() -> f64 {
    0.15
}

fn default_exact_keyword_bonus() -> f64 {
    0.2
}

fn default_emotional_category_bonus() -> f64 {
    0.1
}

fn default_stopword_weight() -> f64 {
    0.3
}

fn default_lexicon_weight() -> f64 {
    2.0
}

fn default_long_term_weight() -> f64 {
    1.5
}

fn default_long_term_chars() -> usize {
    4
}

fn default_token_weight() -> f64 {
    1.0
}

fn default_exact_match() -> f64 {
    1.5
}

fn default_partial_match() -> f64 {
    1.0
}

fn default_number_tolerance() -> f64 {
    0.2
}

fn default_slang_match_bonus() -> f64 {
    0.15
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            bag_similarity: default_bag_weight(),
            keyword: default_keyword_weight(),
            entity: default_entity_weight(),
            number: default_number_weight(),
            emotional: default_emotional_weight(),
            slang: default_slang_weight(),
            category_bonus: default_category_bonus(),
            exact_keyword_bonus: default_exact_keyword_bonus(),
            emotional_category_bonus: default_emotional_category_bonus(),
            stopword_token: default_stopword_weight(),
            lexicon_token: default_lexicon_weight(),
            long_term_token: default_long_term_weight(),
            long_term_chars: default_long_term_chars(),
            default_token: default_token_weight(),
            exact_match: default_exact_match(),
            partial_match: default_partial_match(),
            number_tolerance: default_number_tolerance(),
            slang_match_bonus: default_slang_match_bonus(),
        }
    }
}

impl ScoringWeights {
    fn all_weights(&self) -> [(&'static str, f64); 16] {
        [
            ("scoring.bag_similarity", self.bag_similarity),
            ("scoring.keyword", self.keyword),
            ("scoring.entity", self.entity),
            ("scoring.number", self.number),
            ("scoring.emotional", self.emotional),
            ("scoring.slang", self.slang),
            ("scoring.category_bonus", self.category_bonus),
            ("scoring.exact_keyword_bonus", self.exact_keyword_bonus),
            ("scoring.emotional_category_bonus", self.emotional_category_bonus),
            ("scoring.stopword_token", self.stopword_token),
            ("scoring.lexicon_token", self.lexicon_token),
            ("scoring.long_term_token", self.long_term_token),
            ("scoring.default_token", self.default_token),
            ("scoring.exact_match", self.exact_match),
            ("scoring.partial_match", self.partial_match),
            ("scoring.slang_match_bonus", self.slang_match_bonus),
        ]
    }
}

/// 时间衰减配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecayConfig {
    /// "最近一周" 边界（天）
    #[serde(default = "default_week_days")]
    pub week_days: f64,

    /// "最近一月" 边界（天）
    #[serde(default = "default_month_days")]
    pub month_days: f64,

    /// 一周内的新近度加成
    #[serde(default = "default_week_boost")]
    pub week_boost: f64,

    /// 一月内的新近度加成
    #[serde(default = "default_month_boost")]
    pub month_boost: f64,

    /// 一月内标准衰减的底数（按月幂次）
    #[serde(default = "default_monthly_base")]
    pub monthly_base: f64,

    /// 超过一月后的衰减下限
    #[serde(default = "default_decay_floor")]
    pub floor: f64,

    /// 超过一月后在下限之上的可变区间
    #[serde(default = "default_decay_span")]
    pub span: f64,

    /// 衰减到下限所需天数
    #[serde(default = "default_horizon_days")]
    pub horizon_days: f64,
}

fn default_week_days() -> f64 {
    7.0
}

fn default_month_days() -> f64 {
    30.0
}

fn default_week_boost() -> f64 {
    1.5
}

fn default_month_boost() -> f64 {
    1.2
}

fn default_monthly_base() -> f64 {
    0.9
}

fn default_decay_floor() -> f64 {
    0.5
}

fn default_decay_span() -> f64 {
    0.3
}

fn default_horizon_days() -> f64 {
    365.0
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            week_days: default_week_days(),
            month_days: default_month_days(),
            week_boost: default_week_boost(),
            month_boost: default_month_boost(),
            monthly_base: default_monthly_base(),
            floor: default_decay_floor(),
            span: default_decay_span(),
            horizon_days: default_horizon_days(),
        }
    }
}

/// 环境变量名
pub const ENV_THRESHOLD: &str = "MEMRANK_RELEVANCE_THRESHOLD";
pub const ENV_CACHE_CAPACITY: &str = "MEMRANK_CACHE_CAPACITY";
pub const ENV_KEYWORD_TOP_K: &str = "MEMRANK_KEYWORD_TOP_K";
pub const ENV_RANK_TIMEOUT_MS: &str = "MEMRANK_RANK_TIMEOUT_MS";

impl RelevanceConfig {
    /// 辅助排序器预设（更低的阈值）
    pub fn auxiliary() -> Self {
        Self {
            relevance_threshold: 0.22,
            ..Self::default()
        }
    }

    /// 从 YAML 字符串解析并校验
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从 YAML 文件加载，然后应用环境变量覆盖
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yaml::from_str(&content)?;
        config.apply_env_overrides()?;
        config.validate()?;
        debug!("Loaded relevance config from {}", path.display());
        Ok(config)
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// 使用给定的查找函数应用覆盖（便于测试）
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_THRESHOLD) {
            self.relevance_threshold = parse_env(ENV_THRESHOLD, &value)?;
        }
        if let Some(value) = lookup(ENV_CACHE_CAPACITY) {
            self.analyzer.cache_capacity = parse_env(ENV_CACHE_CAPACITY, &value)?;
        }
        if let Some(value) = lookup(ENV_KEYWORD_TOP_K) {
            self.analyzer.keyword_top_k = parse_env(ENV_KEYWORD_TOP_K, &value)?;
        }
        if let Some(value) = lookup(ENV_RANK_TIMEOUT_MS) {
            self.rank_timeout_ms = parse_env(ENV_RANK_TIMEOUT_MS, &value)?;
        }
        Ok(())
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.relevance_threshold) {
            return Err(ConfigError::Invalid {
                field: "relevance_threshold",
                reason: format!("{} 不在 [0, 1] 内", self.relevance_threshold),
            });
        }
        if self.analyzer.cache_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "analyzer.cache_capacity",
                reason: "必须大于 0".to_string(),
            });
        }
        if self.analyzer.keyword_top_k == 0 {
            return Err(ConfigError::Invalid {
                field: "analyzer.keyword_top_k",
                reason: "必须大于 0".to_string(),
            });
        }
        if self.prefilter.recency_horizon_days <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "prefilter.recency_horizon_days",
                reason: "必须大于 0".to_string(),
            });
        }
        if self.decay.horizon_days <= self.decay.month_days {
            return Err(ConfigError::Invalid {
                field: "decay.horizon_days",
                reason: "必须大于 decay.month_days".to_string(),
            });
        }
        for (field, value) in self.scoring.all_weights() {
            if value < 0.0 || !value.is_finite() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("权重 {} 必须是非负有限数", value),
                });
            }
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        name: name.to_string(),
        value: value.to_string(),
    })
}
