//! 事件规范化配置
//!
//! 提供规范化管道的配置管理，包括：
//! - 日志过滤
//! - 输入限制
//! - 输出格式
//!
//! 加载优先级：默认值 -> 可选配置文件（EVENT_NORMALIZER_CONFIG_FILE）-> 环境变量（EVENT_NORMALIZER_*）

use figment::providers::{self, Env, Format, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

/// 配置文件路径环境变量
pub const CONFIG_FILE_ENV: &str = "EVENT_NORMALIZER_CONFIG_FILE";

/// 配置环境变量前缀，嵌套字段以 `__` 分隔
pub const ENV_PREFIX: &str = "EVENT_NORMALIZER_";

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoggingConfig {
    /// tracing 过滤表达式，RUST_LOG 存在时以 RUST_LOG 为准
    #[validate(length(min = 1))]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// 输入配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct InputConfig {
    /// 单条消息最大字节数，超出的消息被跳过
    #[validate(range(min = 1, max = 16777216))]
    pub max_message_bytes: usize,
    /// 是否跳过空白行
    pub skip_blank_lines: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_message_bytes: 64 * 1024,
            skip_blank_lines: true,
        }
    }
}

/// 输出配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// 是否以多行格式输出事件 JSON
    pub pretty: bool,
}

/// 全局应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AppConfig {
    #[validate(nested)]
    pub logging: LoggingConfig,
    #[validate(nested)]
    pub input: InputConfig,
    pub output: OutputConfig,
}

/// 配置来源格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// 按扩展名识别格式，未知扩展名按 TOML 处理
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yml" | "yaml") => Self::Yaml,
            Some("json") => Self::Json,
            _ => Self::Toml,
        }
    }

    /// 按内容猜测格式：`{` 开头为 JSON，出现表头或赋值行为 TOML，其余为 YAML
    pub fn detect(content: &str) -> Self {
        if content.trim_start().starts_with('{') {
            return Self::Json;
        }
        let looks_like_toml = content.lines().map(str::trim).any(|line| {
            line.starts_with('[') || (line.contains('=') && !line.starts_with('#'))
        });
        if looks_like_toml {
            Self::Toml
        } else {
            Self::Yaml
        }
    }

    fn merge_file(self, fig: Figment, path: &Path) -> Figment {
        match self {
            Self::Toml => fig.merge(providers::Toml::file(path)),
            Self::Yaml => fig.merge(providers::Yaml::file(path)),
            Self::Json => fig.merge(providers::Json::file(path)),
        }
    }

    fn merge_string(self, fig: Figment, content: &str) -> Figment {
        match self {
            Self::Toml => fig.merge(providers::Toml::string(content)),
            Self::Yaml => fig.merge(providers::Yaml::string(content)),
            Self::Json => fig.merge(providers::Json::string(content)),
        }
    }
}

impl AppConfig {
    fn defaults() -> Figment {
        Figment::new().merge(Serialized::defaults(AppConfig::default()))
    }

    /// 组合全部配置来源：默认值、配置文件、环境变量
    pub fn figment() -> Figment {
        let mut fig = Self::defaults();
        if let Some(path) = std::env::var_os(CONFIG_FILE_ENV) {
            let path = PathBuf::from(path);
            fig = ConfigFormat::from_path(&path).merge_file(fig, &path);
        }
        fig.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// 加载并校验配置
    pub fn load() -> Result<Self, ConfigError> {
        let cfg: AppConfig = Self::figment().extract().map_err(Box::new)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// 从配置文本解析，缺省字段取默认值
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: AppConfig = ConfigFormat::detect(s)
            .merge_string(Self::defaults(), s)
            .extract()
            .map_err(|e| ConfigError::parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("配置加载失败: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("配置校验失败: {0}")]
    Validation(#[from] validator::ValidationErrors),
    #[error("配置解析失败: {message}")]
    Parse { message: String },
}

impl ConfigError {
    /// 创建解析错误
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }
}
