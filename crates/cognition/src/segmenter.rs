//! Segmenter - 分词器契约与内置词典分词
//!
//! 职责：
//! - 定义分词/关键词提取契约（任何 CJK 分词库都可以实现）
//! - 提供基于词典的正向最大匹配分词器
//!
//! 词性标签沿用 ICTCLAS 风格：nr 人名、ns 地名、nt 机构名、nz 其他专名、m 数词。

use crate::lexicon::Lexicon;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// 分析错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("分词器不可用: {0}")]
    Unavailable(String),

    #[error("分词失败: {0}")]
    SegmentationFailed(String),

    #[error("关键词提取失败: {0}")]
    KeywordExtractionFailed(String),
}

/// 分词结果项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub word: String,
    pub pos: String,
}

impl Term {
    pub fn new(word: impl Into<String>, pos: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            pos: pos.into(),
        }
    }

    /// 人名/地名/机构名/其他专名
    pub fn is_proper_noun(&self) -> bool {
        ["nr", "ns", "nt", "nz"]
            .iter()
            .any(|tag| self.pos.starts_with(tag))
    }

    pub fn is_numeral(&self) -> bool {
        self.pos.starts_with('m')
    }
}

/// 分词器 Trait
pub trait Segmenter: Send + Sync {
    /// 分词（带词性）
    fn segment(&self, text: &str) -> Result<Vec<Term>, AnalysisError>;

    /// 提取 Top-K 关键词（最重要的在前）
    fn extract_keywords(&self, text: &str, k: usize) -> Result<Vec<String>, AnalysisError>;
}

impl std::fmt::Debug for dyn Segmenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Segmenter")
    }
}

/// 中文数字（两个字以上连写时按数词处理）
const CJK_NUMERALS: &str = "零一二三四五六七八九十百千万两";

/// 词典分词器（正向最大匹配）
#[derive(Debug, Clone, Default)]
pub struct DictionarySegmenter {
    dictionary: HashMap<String, String>,
    stopwords: HashSet<String>,
    max_word_chars: usize,
}

impl DictionarySegmenter {
    pub fn new<I, S, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        Self::default().with_words(entries)
    }

    /// 以词表内容为词典（停用词来自 "u" 词性条目）
    pub fn from_lexicon(lexicon: &Lexicon) -> Self {
        Self::new(lexicon.dictionary_entries())
    }

    /// 追加词典条目（同名词后加的覆盖先加的）
    pub fn with_words<I, S, T>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        for (word, pos) in entries {
            let word: String = word.into();
            let pos: String = pos.into();
            if word.is_empty() {
                continue;
            }
            self.max_word_chars = self.max_word_chars.max(word.chars().count());
            if pos == "u" {
                self.stopwords.insert(word.clone());
            } else {
                self.stopwords.remove(&word);
            }
            self.dictionary.insert(word, pos);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.dictionary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dictionary.is_empty()
    }

    /// 从 `start` 开始的最长词典词（字符数）
    fn longest_match(&self, chars: &[char], start: usize) -> Option<(usize, &str)> {
        let max_len = self.max_word_chars.min(chars.len() - start);
        (1..=max_len).rev().find_map(|len| {
            let candidate: String = chars[start..start + len].iter().collect();
            self.dictionary
                .get(&candidate)
                .map(|pos| (len, pos.as_str()))
        })
    }

    fn ascii_run(chars: &[char], start: usize) -> usize {
        let mut end = start;
        while end < chars.len() {
            let c = chars[end];
            let decimal_point = c == '.'
                && end > start
                && chars[end - 1].is_ascii_digit()
                && chars.get(end + 1).is_some_and(|n| n.is_ascii_digit());
            if c.is_ascii_alphanumeric() || decimal_point {
                end += 1;
            } else {
                break;
            }
        }
        end
    }

    fn numeral_run(chars: &[char], start: usize) -> usize {
        let mut end = start;
        while end < chars.len() && CJK_NUMERALS.contains(chars[end]) {
            end += 1;
        }
        end
    }
}

impl Segmenter for DictionarySegmenter {
    fn segment(&self, text: &str) -> Result<Vec<Term>, AnalysisError> {
        let chars: Vec<char> = text.chars().collect();
        let mut terms = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if !c.is_alphanumeric() {
                i += 1;
                continue;
            }

            if c.is_ascii_alphanumeric() {
                let end = Self::ascii_run(&chars, i);
                let word: String = chars[i..end].iter().collect();
                let pos = match self.dictionary.get(&word) {
                    Some(pos) => pos.clone(),
                    None if c.is_ascii_digit() && word.parse::<f64>().is_ok() => {
                        "m".to_string()
                    }
                    None => "eng".to_string(),
                };
                terms.push(Term::new(word, pos));
                i = end;
                continue;
            }

            let numeral_end = Self::numeral_run(&chars, i);
            let dictionary_hit = self.longest_match(&chars, i);

            match dictionary_hit {
                Some((len, pos)) if len >= numeral_end - i => {
                    let word: String = chars[i..i + len].iter().collect();
                    terms.push(Term::new(word, pos));
                    i += len;
                }
                _ if numeral_end - i >= 2 => {
                    let word: String = chars[i..numeral_end].iter().collect();
                    terms.push(Term::new(word, "m"));
                    i = numeral_end;
                }
                _ => {
                    terms.push(Term::new(c.to_string(), "x"));
                    i += 1;
                }
            }
        }

        Ok(terms)
    }

    fn extract_keywords(&self, text: &str, k: usize) -> Result<Vec<String>, AnalysisError> {
        let terms = self.segment(text)?;

        // (词, 得分, 首次出现位置)
        let mut scored: Vec<(String, f64, usize)> = Vec::new();
        for (position, term) in terms.iter().enumerate() {
            if term.is_numeral()
                || self.stopwords.contains(&term.word)
                || term.word.chars().count() < 2
            {
                continue;
            }
            let weight = if term.pos.starts_with('n') { 1.5 } else { 1.0 };
            match scored.iter_mut().find(|(w, _, _)| *w == term.word) {
                Some(entry) => entry.1 += weight,
                None => scored.push((term.word.clone(), weight, position)),
            }
        }

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.2.cmp(&b.2)));
        Ok(scored.into_iter().take(k).map(|(w, _, _)| w).collect())
    }
}

/// 始终不可用的分词器（用于降级路径）
#[derive(Debug, Clone, Default)]
pub struct UnavailableSegmenter {
    reason: String,
}

impl UnavailableSegmenter {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Segmenter for UnavailableSegmenter {
    fn segment(&self, _text: &str) -> Result<Vec<Term>, AnalysisError> {
        Err(AnalysisError::Unavailable(self.reason.clone()))
    }

    fn extract_keywords(&self, _text: &str, _k: usize) -> Result<Vec<String>, AnalysisError> {
        Err(AnalysisError::Unavailable(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(terms: &[Term]) -> Vec<&str> {
        terms.iter().map(|t| t.word.as_str()).collect()
    }

    #[test]
    fn test_forward_maximum_matching() {
        let segmenter = DictionarySegmenter::new([
            ("工作", "n"),
            ("压力", "n"),
            ("最近", "t"),
            ("焦虑", "a"),
            ("我", "u"),
            ("好", "u"),
        ]);

        let terms = segmenter.segment("我最近好焦虑，工作压力好大").unwrap();
        assert_eq!(
            words(&terms),
            vec!["我", "最近", "好", "焦虑", "工作", "压力", "好", "大"]
        );
        assert_eq!(terms[7].pos, "x");
    }

    #[test]
    fn test_longest_word_wins() {
        let segmenter = DictionarySegmenter::new([("开心", "a"), ("不开心", "a")]);
        let terms = segmenter.segment("不开心").unwrap();
        assert_eq!(words(&terms), vec!["不开心"]);
    }

    #[test]
    fn test_ascii_words_and_numbers() {
        let segmenter = DictionarySegmenter::new([("yyds", "i")]);
        let terms = segmenter.segment("yyds! score 98.5 at 3pm").unwrap();

        assert_eq!(words(&terms), vec!["yyds", "score", "98.5", "at", "3pm"]);
        assert_eq!(terms[0].pos, "i");
        assert_eq!(terms[1].pos, "eng");
        assert!(terms[2].is_numeral());
        assert_eq!(terms[4].pos, "eng");
    }

    #[test]
    fn test_cjk_numeral_runs() {
        let segmenter = DictionarySegmenter::new([("块钱", "q")]);
        let terms = segmenter.segment("花了三百块钱").unwrap();
        assert_eq!(words(&terms), vec!["花", "了", "三百", "块钱"]);
        assert!(terms[2].is_numeral());

        // 单个数字字不算数词
        let terms = segmenter.segment("一起").unwrap();
        assert!(terms.iter().all(|t| !t.is_numeral()));
    }

    #[test]
    fn test_proper_nouns() {
        let lexicon = Lexicon::builtin();
        let segmenter = DictionarySegmenter::from_lexicon(&lexicon);
        let terms = segmenter.segment("下周去北京出差").unwrap();

        let beijing = terms.iter().find(|t| t.word == "北京").unwrap();
        assert!(beijing.is_proper_noun());
        assert!(!beijing.is_numeral());
    }

    #[test]
    fn test_extract_keywords_ranks_by_frequency() {
        let segmenter = DictionarySegmenter::new([
            ("工作", "n"),
            ("压力", "n"),
            ("加班", "v"),
            ("的", "u"),
        ]);

        let keywords = segmenter
            .extract_keywords("加班的压力，工作的压力，工作", 2)
            .unwrap();
        assert_eq!(keywords, vec!["压力", "工作"]);
    }

    #[test]
    fn test_extract_keywords_skips_stopwords_and_singles() {
        let segmenter = DictionarySegmenter::new([("我们", "u"), ("电影", "n")]);
        let keywords = segmenter.extract_keywords("我们看 电影 a 2024", 8).unwrap();
        assert_eq!(keywords, vec!["电影"]);
    }

    #[test]
    fn test_empty_text() {
        let segmenter = DictionarySegmenter::default();
        assert!(segmenter.is_empty());
        assert!(segmenter.segment("").unwrap().is_empty());
        assert!(segmenter.extract_keywords("", 3).unwrap().is_empty());
    }

    #[test]
    fn test_unavailable_segmenter() {
        let segmenter = UnavailableSegmenter::new("model not loaded");
        assert_eq!(
            segmenter.segment("text"),
            Err(AnalysisError::Unavailable("model not loaded".to_string()))
        );
        assert!(segmenter.extract_keywords("text", 3).is_err());
    }
}
