//! 事件规范化器入口
//!
//! 从标准输入逐行读取原始订阅消息，向标准输出写出规范化后的事件。

use application::EventNormalizerService;
use config::AppConfig;
use tokio::io::{self, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    // 初始化日志，RUST_LOG 优先于配置文件；标准输出留给事件
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        "事件规范化器启动，单条消息上限 {} 字节",
        config.input.max_message_bytes
    );

    let service = EventNormalizerService::new(&config);
    let stats = service
        .run(BufReader::new(io::stdin()), io::stdout())
        .await?;

    tracing::info!(
        explicit = stats.explicit,
        envelope = stats.envelope,
        payload_decoded = stats.payload_decoded,
        payload_unparsed = stats.payload_unparsed,
        raw_fallback = stats.raw_fallback,
        skipped = stats.skipped,
        "事件规范化器退出"
    );

    Ok(())
}
