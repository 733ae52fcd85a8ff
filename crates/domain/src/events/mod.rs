//! 事件定义
//!
//! 包含标准化事件与消息规范化器

pub mod event;
pub mod normalizer;

// 重新导出事件类型
pub use event::*;
pub use normalizer::*;
