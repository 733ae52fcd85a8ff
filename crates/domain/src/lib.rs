//! 发布订阅事件领域模型
//!
//! 包含标准化事件实体，以及把原始订阅消息转换为事件的规范化逻辑。

pub mod events;

// 重新导出常用类型
pub use events::*;
