//! Context Builder - 提示词上下文组装
//!
//! 职责：
//! - 把排序后的记忆拼成注入下一轮提示词的文本块
//! - 字符预算管理（超出预算的记忆不再加入）
//!
//! 输出格式：
//! ```text
//! 以下是与当前对话相关的历史记忆：
//! - [2024-05-01 · 健康医疗] 最近工作压力大，经常失眠
//! ```

use memrank_core::{MemoryRecord, FALLBACK_CATEGORY};
use tracing::debug;

/// 上下文配置
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// 标题行
    pub header: String,

    /// 最大字符数（含标题和换行）
    pub max_chars: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            header: "以下是与当前对话相关的历史记忆：".to_string(),
            max_chars: 800,
        }
    }
}

/// 记忆上下文构建器
#[derive(Debug, Clone, Default)]
pub struct MemoryContextBuilder {
    config: ContextConfig,
}

impl MemoryContextBuilder {
    pub fn new(config: ContextConfig) -> Self {
        Self { config }
    }

    /// 组装上下文；没有记忆时返回空字符串
    pub fn build(&self, memories: &[MemoryRecord]) -> String {
        if memories.is_empty() {
            return String::new();
        }

        let mut budget = CharBudget::new(self.config.max_chars);
        let mut out = String::new();

        let header = self.config.header.trim_end();
        if !header.is_empty() {
            budget.add(header.chars().count());
            out.push_str(header);
        }

        let mut included = 0;
        for memory in memories {
            let separator = usize::from(!out.is_empty());
            let line = bullet(memory);
            let cost = separator + line.chars().count();

            if budget.can_add(cost) {
                push_line(&mut out, &line);
                budget.add(cost);
                included += 1;
                continue;
            }

            // 第一条放不下时截断而不是丢弃
            if included == 0 && budget.remaining() > separator {
                let truncated = truncate_chars(&line, budget.remaining() - separator);
                push_line(&mut out, &truncated);
                included += 1;
            }
            break;
        }

        debug!(
            "Built memory context: {} of {} memories, {} chars",
            included,
            memories.len(),
            out.chars().count()
        );
        out
    }
}

fn bullet(memory: &MemoryRecord) -> String {
    let category = if memory.category.trim().is_empty() {
        FALLBACK_CATEGORY
    } else {
        memory.category.trim()
    };
    format!(
        "- [{} · {}] {}",
        memory.timestamp.format("%Y-%m-%d"),
        category,
        memory.content.trim()
    )
}

fn push_line(out: &mut String, line: &str) {
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(line);
}

/// 按字符截断，末尾加省略号（结果不超过 `max_chars` 个字符）
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

/// 字符预算
#[derive(Debug, Clone)]
pub struct CharBudget {
    max: usize,
    used: usize,
}

impl CharBudget {
    pub fn new(max: usize) -> Self {
        Self { max, used: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.max.saturating_sub(self.used)
    }

    pub fn can_add(&self, chars: usize) -> bool {
        self.used + chars <= self.max
    }

    pub fn add(&mut self, chars: usize) {
        self.used += chars;
    }
}
