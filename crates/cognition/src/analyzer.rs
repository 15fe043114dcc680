//! Text Analyzer - 文本分析模块
//!
//! 职责：
//! - 归一化、分词、实体/数字/关键词提取
//! - 情感词、流行语、情感倾向
//! - 分类预测与查询意图（情感/时间/近期）
//!
//! 分词器出错时按错误类型选择兜底路径，结果照常返回。

use crate::cache::{CacheStats, TextInfoCache};
use crate::lexicon::{Lexicon, Polarity};
use crate::segmenter::{AnalysisError, Segmenter, Term};
use memrank_core::{AnalyzerConfig, TextInfo};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

const POSITIVE_HIT: f64 = 0.2;
const NEGATIVE_HIT: f64 = -0.2;
const SLANG_HIT: f64 = 0.1;
const PHRASE_POLARITY: f64 = 0.3;

/// 文本分析器
pub struct TextAnalyzer {
    segmenter: Arc<dyn Segmenter>,
    lexicon: Arc<Lexicon>,
    config: AnalyzerConfig,
    cache: TextInfoCache,
}

impl std::fmt::Debug for TextAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextAnalyzer")
            .field("config", &self.config)
            .field("cache", &self.cache.stats())
            .finish()
    }
}

impl TextAnalyzer {
    pub fn new(segmenter: Arc<dyn Segmenter>, lexicon: Arc<Lexicon>, config: AnalyzerConfig) -> Self {
        let cache = TextInfoCache::new(config.cache_capacity);
        Self {
            segmenter,
            lexicon,
            config,
            cache,
        }
    }

    /// 分析文本
    pub fn analyze(&self, text: &str) -> Arc<TextInfo> {
        let normalized = normalize(text);

        if normalized.chars().count() < self.config.min_text_chars {
            let tokens = naive_tokens(&normalized);
            return Arc::new(TextInfo::minimal(normalized, tokens));
        }

        if let Some(cached) = self.cache.get(&normalized) {
            return cached;
        }

        let info = self.analyze_normalized(&normalized);
        self.cache.insert(normalized, info)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn lexicon(&self) -> &Arc<Lexicon> {
        &self.lexicon
    }

    fn analyze_normalized(&self, normalized: &str) -> TextInfo {
        let (tokens, entities, numbers) = match self.segmenter.segment(normalized) {
            Ok(terms) => split_terms(terms),
            Err(err) => {
                log_fallback(&err);
                let tokens = fallback_tokens(normalized);
                let numbers = tokens.iter().filter(|t| is_number(t)).cloned().collect();
                (tokens, Vec::new(), numbers)
            }
        };

        let keywords = match self
            .segmenter
            .extract_keywords(normalized, self.config.keyword_top_k)
        {
            Ok(keywords) => keywords,
            Err(err) => {
                log_fallback(&err);
                self.frequency_keywords(&tokens)
            }
        };

        let emotional_words = self.lexicon.emotional_hits(normalized);
        let slang_words = self.lexicon.slang_hits(normalized);
        let is_emotional_query =
            !emotional_words.is_empty() || self.lexicon.matches_emotional_pattern(normalized);
        let sentiment = self.sentiment(normalized, &emotional_words);
        let categories = self.lexicon.categorize(normalized, &keywords);

        debug!(
            "Analyzed text: {} tokens, {} keywords, {} categories, emotional={}",
            tokens.len(),
            keywords.len(),
            categories.len(),
            is_emotional_query
        );

        TextInfo {
            normalized_text: normalized.to_string(),
            is_time_reference: self.lexicon.matches_time_reference(normalized),
            is_recent_reference: self.lexicon.matches_recent_reference(normalized),
            tokens,
            entities,
            numbers,
            keywords,
            emotional_words,
            slang_words,
            categories,
            is_emotional_query,
            sentiment,
        }
    }

    /// 词频兜底关键词：非停用词、长度 > 1，按频次降序、首次出现升序
    fn frequency_keywords(&self, tokens: &[String]) -> Vec<String> {
        let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
        for (position, token) in tokens.iter().enumerate() {
            if token.chars().count() <= 1 || self.lexicon.is_stopword(token) || is_number(token) {
                continue;
            }
            counts.entry(token.as_str()).or_insert((0, position)).0 += 1;
        }

        let mut ranked: Vec<(&str, usize, usize)> =
            counts.into_iter().map(|(t, (n, first))| (t, n, first)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        ranked
            .into_iter()
            .take(self.config.keyword_top_k)
            .map(|(t, _, _)| t.to_string())
            .collect()
    }

    /// 情感倾向 [-1, 1]
    fn sentiment(&self, text: &str, emotional_words: &[String]) -> f64 {
        if emotional_words.is_empty() {
            return f64::from(self.lexicon.phrase_polarity(text)) * PHRASE_POLARITY;
        }

        let mut raw = 0.0;
        let mut positive = 0i32;
        let mut negative = 0i32;
        for word in emotional_words {
            match self.lexicon.polarity(word) {
                Some(Polarity::Positive) => {
                    raw += POSITIVE_HIT;
                    positive += 1;
                }
                Some(Polarity::Negative) => {
                    raw += NEGATIVE_HIT;
                    negative += 1;
                }
                Some(Polarity::Ambiguous) => {
                    let direction = self.resolve_slang(text, word);
                    raw += SLANG_HIT * direction;
                    if direction > 0.0 {
                        positive += 1;
                    } else if direction < 0.0 {
                        negative += 1;
                    }
                }
                None => {}
            }
        }

        let total = positive + negative;
        if total == 0 {
            return raw.clamp(-1.0, 1.0);
        }
        let balance = f64::from(positive - negative) / f64::from(total);
        ((raw + balance) / 2.0).clamp(-1.0, 1.0)
    }

    /// 根据流行语前后窗口内的提示字判断方向（1 / -1 / 默认极性）
    fn resolve_slang(&self, text: &str, word: &str) -> f64 {
        let Some(start) = text.find(word) else {
            return self.lexicon.slang_default_polarity(word).signum();
        };
        let window = self.config.slang_window_chars;
        let before: String = {
            let chars: Vec<char> = text[..start].chars().collect();
            chars[chars.len().saturating_sub(window)..].iter().collect()
        };
        let after: String = text[start + word.len()..].chars().take(window).collect();
        let context = format!("{before} {after}");

        let positive = self
            .lexicon
            .positive_cues()
            .iter()
            .filter(|cue| context.contains(cue.as_str()))
            .count();
        let negative = self
            .lexicon
            .negative_cues()
            .iter()
            .filter(|cue| context.contains(cue.as_str()))
            .count();

        match positive.cmp(&negative) {
            std::cmp::Ordering::Greater => 1.0,
            std::cmp::Ordering::Less => -1.0,
            std::cmp::Ordering::Equal => {
                let default = self.lexicon.slang_default_polarity(word);
                if default == 0.0 {
                    0.0
                } else {
                    default.signum()
                }
            }
        }
    }
}

fn log_fallback(err: &AnalysisError) {
    match err {
        AnalysisError::Unavailable(reason) => {
            debug!("Segmenter unavailable ({}), using fallback heuristics", reason);
        }
        AnalysisError::SegmentationFailed(_) | AnalysisError::KeywordExtractionFailed(_) => {
            warn!("Segmenter error: {}, using fallback heuristics", err);
        }
    }
}

/// 小写 + 去首尾空白
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// 按空白与标点朴素切分
pub fn naive_tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// 分词器不可用时的切分：ASCII 词/数字整体保留，CJK 连续段切成重叠二元组
pub fn fallback_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for chunk in naive_tokens(text) {
        let chars: Vec<char> = chunk.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let ascii = chars[i].is_ascii();
            let start = i;
            while i < chars.len() && chars[i].is_ascii() == ascii {
                i += 1;
            }
            let run = &chars[start..i];
            if ascii || run.len() == 1 {
                tokens.push(run.iter().collect());
            } else {
                tokens.extend(run.windows(2).map(|pair| pair.iter().collect::<String>()));
            }
        }
    }
    tokens
}

fn split_terms(terms: Vec<Term>) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut tokens = Vec::with_capacity(terms.len());
    let mut entities = Vec::new();
    let mut numbers = Vec::new();
    for term in terms {
        if term.is_proper_noun() && !entities.contains(&term.word) {
            entities.push(term.word.clone());
        }
        if term.is_numeral() && !numbers.contains(&term.word) {
            numbers.push(term.word.clone());
        }
        tokens.push(term.word);
    }
    (tokens, entities, numbers)
}

fn is_number(token: &str) -> bool {
    token.starts_with(|c: char| c.is_ascii_digit()) && token.parse::<f64>().is_ok()
}
