//! 标准化事件实体
//!
//! 事件一经构造即不可变，所有字段只通过访问器读取。

use serde::Serialize;
use serde_json::{Map, Value};

use super::normalizer::normalize;

/// 事件负载
///
/// 负载可能是显式传入的值、解码后的嵌套 JSON，或者解码失败时保留的原始字符串。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventData {
    /// 显式传入、解码成功或原样透传的 JSON 值
    Value(Value),
    /// 无法解码为 JSON 的字符串负载
    Unparsed(String),
}

impl EventData {
    /// 获取 JSON 值（如果已解析）
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            EventData::Value(value) => Some(value),
            EventData::Unparsed(_) => None,
        }
    }

    /// 获取未解析的原始字符串（如果解码失败）
    pub fn as_unparsed(&self) -> Option<&str> {
        match self {
            EventData::Value(_) => None,
            EventData::Unparsed(raw) => Some(raw),
        }
    }

    /// 转换为 JSON 值，未解析的字符串作为 JSON 字符串返回
    pub fn into_value(self) -> Value {
        match self {
            EventData::Value(value) => value,
            EventData::Unparsed(raw) => Value::String(raw),
        }
    }
}

impl From<Value> for EventData {
    fn from(value: Value) -> Self {
        EventData::Value(value)
    }
}

/// 标准化事件
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<EventData>,
}

impl Event {
    /// 根据原始消息和可选负载构造事件
    ///
    /// 负载为真值时直接使用，否则尝试把消息解析为 JSON 信封。
    /// 构造永远不会失败，解析失败时消息本身作为事件名。
    pub fn new(message: impl Into<String>, data: Option<Value>) -> Self {
        normalize(message, data).event
    }

    /// 仅根据原始消息构造事件
    pub fn from_message(message: impl Into<String>) -> Self {
        Self::new(message, None)
    }

    pub(crate) fn from_parts(
        event: String,
        channel: Option<String>,
        data: Option<EventData>,
    ) -> Self {
        Self {
            event,
            channel,
            data,
        }
    }

    /// 事件名
    pub fn event(&self) -> &str {
        &self.event
    }

    /// 事件所属频道（仅当来自包含频道字段的信封）
    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    /// 事件负载
    pub fn data(&self) -> Option<&EventData> {
        self.data.as_ref()
    }

    /// 转换为 JSON 对象，缺省字段不出现
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert("event".to_string(), Value::String(self.event.clone()));
        if let Some(channel) = &self.channel {
            object.insert("channel".to_string(), Value::String(channel.clone()));
        }
        if let Some(data) = &self.data {
            object.insert("data".to_string(), data.clone().into_value());
        }
        Value::Object(object)
    }
}
