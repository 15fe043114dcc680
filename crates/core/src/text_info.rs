//! Text analysis results

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 未命中任何分类时调用方使用的分类
pub const FALLBACK_CATEGORY: &str = "other";

/// 一段文本的分析结果（每个输入字符串只生成一次，之后只读）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextInfo {
    /// 小写 + 去首尾空白后的文本
    pub normalized_text: String,

    /// 分词结果（保持分词顺序）
    pub tokens: Vec<String>,

    /// 专有名词（人名/地名/机构名/其他专名）
    pub entities: Vec<String>,

    /// 数词
    pub numbers: Vec<String>,

    /// 关键词（按重要性降序）
    pub keywords: Vec<String>,

    /// 情感词
    pub emotional_words: Vec<String>,

    /// 网络流行语
    pub slang_words: Vec<String>,

    /// 预测分类（可能为空，调用方按 "other" 处理）
    pub categories: BTreeSet<String>,

    pub is_emotional_query: bool,
    pub is_time_reference: bool,
    pub is_recent_reference: bool,

    /// 情感倾向 [-1, 1]
    pub sentiment: f64,
}

impl TextInfo {
    /// 过短文本的最小分析结果：只有朴素切分的 token
    pub fn minimal(normalized_text: String, tokens: Vec<String>) -> Self {
        Self {
            normalized_text,
            tokens,
            ..Default::default()
        }
    }

    /// 查询意图标志
    pub fn flags(&self) -> QueryFlags {
        QueryFlags {
            is_emotional_query: self.is_emotional_query,
            is_time_reference: self.is_time_reference,
            is_recent_reference: self.is_recent_reference,
        }
    }

    /// 分类集合；为空时返回 `{"other"}`
    pub fn categories_or_other(&self) -> BTreeSet<String> {
        if self.categories.is_empty() {
            BTreeSet::from([FALLBACK_CATEGORY.to_string()])
        } else {
            self.categories.clone()
        }
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.contains(category)
    }
}

/// 查询意图标志
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFlags {
    pub is_emotional_query: bool,
    pub is_time_reference: bool,
    pub is_recent_reference: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_has_no_signals() {
        let info = TextInfo::minimal("hi".to_string(), vec!["hi".to_string()]);
        assert_eq!(info.tokens, vec!["hi"]);
        assert!(info.entities.is_empty());
        assert!(info.categories.is_empty());
        assert!(!info.is_emotional_query);
        assert_eq!(info.sentiment, 0.0);
    }

    #[test]
    fn test_empty_categories_map_to_other() {
        let info = TextInfo::default();
        assert_eq!(
            info.categories_or_other(),
            BTreeSet::from(["other".to_string()])
        );

        let mut tagged = TextInfo::default();
        tagged.categories.insert("工作学习".to_string());
        assert!(tagged.has_category("工作学习"));
        assert!(!tagged.categories_or_other().contains("other"));
    }

    #[test]
    fn test_flags_copy_query_intent() {
        let info = TextInfo {
            is_recent_reference: true,
            is_emotional_query: true,
            ..Default::default()
        };
        let flags = info.flags();
        assert!(flags.is_recent_reference);
        assert!(flags.is_emotional_query);
        assert!(!flags.is_time_reference);
    }
}
