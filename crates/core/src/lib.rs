//! memrank Core - 核心数据模型
//!
//! 包含：
//! - Memory: 记忆记录（外部存储所有，引擎只读）
//! - TextInfo: 文本分析结果与查询意图
//! - Config: 相关性排序配置

mod config;
mod memory;
mod text_info;

pub use config::*;
pub use memory::*;
pub use text_info::*;
