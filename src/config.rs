use crate::error::{AppError, AppResult, FileError};
use serde::Deserialize;
use std::path::Path;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 后端 API 根地址（所有接口路径都相对于它）
    pub api_base_url: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 语音识别服务提供方（拼进 stt/{provider}/recognize）
    pub stt_provider: String,
    /// 语音识别语言
    pub stt_language: String,
    /// 最后一题结束后自动结束面试前的倒计时（秒）
    pub end_countdown_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            request_timeout_secs: 60,
            stt_provider: "google".to_string(),
            stt_language: "ko-KR".to_string(),
            end_countdown_secs: 5,
            verbose_logging: false,
            output_log_file: "interview_log.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            api_base_url: std::env::var("API_BASE_URL").unwrap_or(default.api_base_url),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            stt_provider: std::env::var("STT_PROVIDER").unwrap_or(default.stt_provider),
            stt_language: std::env::var("STT_LANGUAGE").unwrap_or(default.stt_language),
            end_countdown_secs: std::env::var("END_COUNTDOWN_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.end_countdown_secs),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        }
    }

    /// 从 TOML 文件加载配置，缺省字段使用默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

        toml::from_str(&content).map_err(|e| {
            AppError::File(FileError::TomlParseFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })
        })
    }

    /// 优先读取 `INTERVIEW_CONFIG` 指定的 TOML 文件，否则从环境变量加载
    pub fn load() -> AppResult<Self> {
        match std::env::var("INTERVIEW_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_toml_file(Path::new(path.trim())),
            _ => Ok(Self::from_env()),
        }
    }
}
