//! 规范化统计

use domain::{DecodePath, PayloadDecode};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// 统计快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizerStats {
    /// 显式负载构造的事件数
    pub explicit: u64,
    /// 从 JSON 信封解析的事件数
    pub envelope: u64,
    /// 嵌套负载解码成功数
    pub payload_decoded: u64,
    /// 嵌套负载解码失败、保留原文的数量
    pub payload_unparsed: u64,
    /// 整条消息作为事件名的数量
    pub raw_fallback: u64,
    /// 被跳过的输入行数（空行或超长）
    pub skipped: u64,
}

impl NormalizerStats {
    /// 成功产出的事件总数
    pub fn total_events(&self) -> u64 {
        self.explicit + self.envelope + self.raw_fallback
    }
}

/// 统计计数器
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    explicit: AtomicU64,
    envelope: AtomicU64,
    payload_decoded: AtomicU64,
    payload_unparsed: AtomicU64,
    raw_fallback: AtomicU64,
    skipped: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record(&self, path: DecodePath) {
        match path {
            DecodePath::ExplicitData => {
                self.explicit.fetch_add(1, Ordering::Relaxed);
            }
            DecodePath::Envelope { payload } => {
                self.envelope.fetch_add(1, Ordering::Relaxed);
                match payload {
                    PayloadDecode::Decoded => {
                        self.payload_decoded.fetch_add(1, Ordering::Relaxed);
                    }
                    PayloadDecode::Unparsed => {
                        self.payload_unparsed.fetch_add(1, Ordering::Relaxed);
                    }
                    PayloadDecode::Absent | PayloadDecode::PassedThrough => {}
                }
            }
            DecodePath::RawFallback => {
                self.raw_fallback.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub(crate) fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> NormalizerStats {
        NormalizerStats {
            explicit: self.explicit.load(Ordering::Relaxed),
            envelope: self.envelope.load(Ordering::Relaxed),
            payload_decoded: self.payload_decoded.load(Ordering::Relaxed),
            payload_unparsed: self.payload_unparsed.load(Ordering::Relaxed),
            raw_fallback: self.raw_fallback.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}
