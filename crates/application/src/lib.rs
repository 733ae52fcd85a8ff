//! 事件规范化应用层
//!
//! 在领域规范化器之上提供按行处理的消息管道、日志与统计。

pub mod error;
pub mod service;
pub mod stats;

pub use error::*;
pub use service::*;
pub use stats::*;
