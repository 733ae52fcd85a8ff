//! 事件规范化服务
//!
//! 把领域规范化器接到按行读取的消息流上：每行一条原始消息，
//! 每个事件输出为一行 JSON（`output.pretty` 开启时为多行格式）。

use config::{AppConfig, InputConfig, OutputConfig};
use domain::{normalize, DecodePath, Event, EventData, Normalized, PayloadDecode};
use serde_json::Value;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::error::{ApplicationError, ApplicationResult};
use crate::stats::{NormalizerStats, StatsCounters};

/// 一次按行读取的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineRead {
    /// 完整读入缓冲区的行
    Complete,
    /// 超过缓冲上限的行，内容已丢弃
    Oversized,
}

/// 读取一行到 `buf`，最多缓冲 `limit` 字节
///
/// 超长行的剩余部分直接从读取器中消费掉，不进入内存。到达流末尾时返回 `None`。
async fn read_bounded_line<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    limit: usize,
) -> io::Result<Option<LineRead>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let mut oversized = false;
    let mut started = false;

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(match (started, oversized) {
                (false, _) => None,
                (true, false) => Some(LineRead::Complete),
                (true, true) => Some(LineRead::Oversized),
            });
        }
        started = true;

        let (chunk, used, finished) = match available.iter().position(|b| *b == b'\n') {
            Some(pos) => (&available[..pos], pos + 1, true),
            None => (available, available.len(), false),
        };

        if !oversized {
            if buf.len() + chunk.len() > limit {
                oversized = true;
                buf.clear();
            } else {
                buf.extend_from_slice(chunk);
            }
        }
        reader.consume(used);

        if finished {
            return Ok(Some(if oversized {
                LineRead::Oversized
            } else {
                LineRead::Complete
            }));
        }
    }
}

/// 事件规范化服务
#[derive(Debug)]
pub struct EventNormalizerService {
    input: InputConfig,
    output: OutputConfig,
    counters: StatsCounters,
}

impl EventNormalizerService {
    /// 根据应用配置创建服务
    pub fn new(config: &AppConfig) -> Self {
        Self::with_config(config.input.clone(), config.output.clone())
    }

    pub fn with_config(input: InputConfig, output: OutputConfig) -> Self {
        Self {
            input,
            output,
            counters: StatsCounters::default(),
        }
    }

    /// 规范化一条消息并记录其解码路径
    pub fn normalize(&self, message: impl Into<String>, data: Option<Value>) -> Event {
        let Normalized { event, path } = normalize(message, data);
        self.counters.record(path);

        match path {
            DecodePath::RawFallback => {
                debug!(event = %event.event(), "消息不是 JSON 信封，按原始事件名处理");
            }
            DecodePath::Envelope {
                payload: PayloadDecode::Unparsed,
            } => {
                let raw_len = event
                    .data()
                    .and_then(EventData::as_unparsed)
                    .map_or(0, str::len);
                debug!(event = %event.event(), raw_len, "负载不是合法 JSON，保留原始字符串");
            }
            _ => {}
        }

        event
    }

    /// 规范化一行输入
    ///
    /// 空白行（开启跳过时）和超过长度上限的行返回 `None`。
    pub fn normalize_line(&self, line: &str) -> Option<Event> {
        let message = line.strip_suffix('\r').unwrap_or(line);

        if self.input.skip_blank_lines && message.trim().is_empty() {
            self.counters.record_skipped();
            return None;
        }

        if message.len() > self.input.max_message_bytes {
            warn!(
                "消息长度 {} 字节超过上限 {} 字节，已跳过",
                message.len(),
                self.input.max_message_bytes
            );
            self.counters.record_skipped();
            return None;
        }

        Some(self.normalize(message, None))
    }

    /// 按输出配置序列化事件
    pub fn render(&self, event: &Event) -> ApplicationResult<String> {
        let rendered = if self.output.pretty {
            serde_json::to_string_pretty(event)?
        } else {
            serde_json::to_string(event)?
        };
        Ok(rendered)
    }

    /// 处理整个消息流，返回处理结束时的统计
    ///
    /// 超长行和非 UTF-8 行记录为跳过并继续处理后续消息，只有读写失败会中断。
    pub async fn run<R, W>(
        &self,
        mut reader: R,
        mut writer: W,
    ) -> ApplicationResult<NormalizerStats>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        // 多留一个字节给行尾的 \r
        let limit = self.input.max_message_bytes.saturating_add(1);
        let mut buf = Vec::new();

        while let Some(read) = read_bounded_line(&mut reader, &mut buf, limit)
            .await
            .map_err(ApplicationError::Read)?
        {
            if read == LineRead::Oversized {
                warn!(
                    "消息超过上限 {} 字节，已跳过",
                    self.input.max_message_bytes
                );
                self.counters.record_skipped();
                continue;
            }

            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line,
                Err(e) => {
                    warn!("消息不是合法的 UTF-8，已跳过: {}", e);
                    self.counters.record_skipped();
                    continue;
                }
            };

            let Some(event) = self.normalize_line(line) else {
                continue;
            };

            let mut rendered = self.render(&event)?;
            rendered.push('\n');
            writer
                .write_all(rendered.as_bytes())
                .await
                .map_err(ApplicationError::Write)?;
        }

        writer.flush().await.map_err(ApplicationError::Write)?;

        let stats = self.stats();
        info!(
            "消息流处理完成: {} 个事件，跳过 {} 行",
            stats.total_events(),
            stats.skipped
        );
        Ok(stats)
    }

    /// 当前统计快照
    pub fn stats(&self) -> NormalizerStats {
        self.counters.snapshot()
    }
}

impl Default for EventNormalizerService {
    fn default() -> Self {
        Self::new(&AppConfig::default())
    }
}
