//! 订阅消息规范化
//!
//! 把发布订阅层收到的原始消息转换为 [`Event`]。外层信封和内层负载的解码失败
//! 都会被吸收：外层失败时整条消息作为事件名，内层失败时保留原始字符串。

use serde_json::{Map, Value};

use super::event::{Event, EventData};

/// 信封负载的解码结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadDecode {
    /// 信封没有负载，或负载为 null
    Absent,
    /// 字符串负载成功解码为 JSON
    Decoded,
    /// 字符串负载不是合法 JSON，保留原文
    Unparsed,
    /// 非字符串负载，未做解码直接透传
    PassedThrough,
}

/// 事件的构造路径
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePath {
    /// 调用方显式提供了负载
    ExplicitData,
    /// 消息是合法的 JSON 信封
    Envelope { payload: PayloadDecode },
    /// 消息不是 JSON 信封，整体作为事件名
    RawFallback,
}

/// 规范化结果：事件以及产生它的路径
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub event: Event,
    pub path: DecodePath,
}

/// 规范化一条订阅消息
///
/// `data` 为真值（非 null、非 false、非 0、非空字符串）时直接作为负载，不解析消息。
/// 否则尝试把 `message` 解析为 `{event, channel?, data?}` 信封。
pub fn normalize(message: impl Into<String>, data: Option<Value>) -> Normalized {
    let message = message.into();

    if let Some(data) = data.filter(is_truthy) {
        return Normalized {
            event: Event::from_parts(message, None, Some(EventData::from(data))),
            path: DecodePath::ExplicitData,
        };
    }

    match try_parse_json(&message) {
        Some(Value::Object(envelope)) => from_envelope(message, envelope),
        _ => Normalized {
            event: Event::from_parts(message, None, None),
            path: DecodePath::RawFallback,
        },
    }
}

/// 尝试把字符串解码为 JSON，失败返回 `None`
pub fn try_parse_json(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

/// 按宽松真值规则判断负载是否“存在”
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map_or(true, |n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn from_envelope(message: String, mut envelope: Map<String, Value>) -> Normalized {
    // 信封缺少字符串事件名时保留原始消息，保证事件名始终存在
    let event = match envelope.remove("event") {
        Some(Value::String(name)) => name,
        _ => message,
    };
    let channel = match envelope.remove("channel") {
        Some(Value::String(channel)) => Some(channel),
        _ => None,
    };
    let (data, payload) = decode_payload(envelope.remove("data"));

    Normalized {
        event: Event::from_parts(event, channel, data),
        path: DecodePath::Envelope { payload },
    }
}

/// 只对字符串负载尝试二次解码
fn decode_payload(raw: Option<Value>) -> (Option<EventData>, PayloadDecode) {
    match raw {
        None | Some(Value::Null) => (None, PayloadDecode::Absent),
        Some(Value::String(text)) => match try_parse_json(&text) {
            Some(value) => (Some(EventData::Value(value)), PayloadDecode::Decoded),
            None => (Some(EventData::Unparsed(text)), PayloadDecode::Unparsed),
        },
        Some(other) => (Some(EventData::Value(other)), PayloadDecode::PassedThrough),
    }
}
