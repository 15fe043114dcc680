//! memrank Cognition - 记忆相关性排序引擎
//!
//! 职责：
//! - 文本分析（分词、关键词、情感、分类、查询意图）
//! - 候选预筛选与多因子打分
//! - 时间衰减
//! - 排序编排与异步召回
//! - 提示词上下文组装
//!
//! 架构：
//! - Segmenter: 分词器契约（DictionarySegmenter 为内置实现）
//! - Lexicon: 词表与模式表
//! - TextAnalyzer: 文本分析 + 有界缓存
//! - CandidatePrefilter / ScoringEngine / TimeDecayModel: 排序各阶段
//! - RelevanceRanker: 排序编排
//! - RelevanceEngine: 对外入口（`rank`）
//! - RelevanceService: 异步召回（阻塞线程池 + 超时）
//! - MemoryContextBuilder: 上下文组装

pub mod analyzer;
pub mod cache;
pub mod context;
pub mod decay;
pub mod engine;
pub mod lexicon;
pub mod prefilter;
pub mod ranker;
pub mod scoring;
pub mod segmenter;
pub mod service;

pub use analyzer::TextAnalyzer;
pub use cache::{CacheStats, TextInfoCache};
pub use context::{CharBudget, ContextConfig, MemoryContextBuilder};
pub use decay::{DecayMode, TimeDecayModel};
pub use engine::RelevanceEngine;
pub use lexicon::{Lexicon, LexiconBuilder, Polarity};
pub use prefilter::{CandidatePrefilter, PrefilterBranch};
pub use ranker::{RelevanceRanker, ScoredCandidate};
pub use scoring::{ScoreBreakdown, ScoringEngine};
pub use segmenter::{AnalysisError, DictionarySegmenter, Segmenter, Term, UnavailableSegmenter};
pub use service::RelevanceService;
