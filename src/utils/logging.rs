/// 日志工具模块
///
/// 提供日志初始化、日志文件写入和格式化的辅助函数
use crate::error::{AppError, AppResult};
use crate::models::ChatMessage;
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志
///
/// 优先使用 `RUST_LOG`，否则根据 `verbose` 选择 debug / info。
/// 重复调用是安全的（测试中经常会多次初始化）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
/// - `title`: 标题（通常是 公司 / 岗位）
pub fn init_log_file(log_file_path: &str, title: &str) -> AppResult<()> {
    let log_header = format!(
        "{}\n면접 기록 - {} - {}\n{}\n\n",
        "=".repeat(60),
        title,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .map_err(|e| AppError::file_write_failed(log_file_path, e))?;
    Ok(())
}

/// 追加对话记录到日志文件
pub fn append_transcript(log_file_path: &str, messages: &[ChatMessage]) -> AppResult<()> {
    use std::io::Write;

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .map_err(|e| AppError::file_write_failed(log_file_path, e))?;

    for message in messages {
        writeln!(file, "{}\n", message)
            .map_err(|e| AppError::file_write_failed(log_file_path, e))?;
    }

    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(api_base_url: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 模拟面试客户端");
    info!("🌐 后端地址: {}", api_base_url);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

/// 取文本第一行
pub fn first_line(text: &str) -> &str {
    text.split('\n').next().unwrap_or_default().trim_end_matches('\r')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars_not_bytes() {
        assert_eq!(truncate_text("자기소개를 해주세요", 4), "자기소개...");
        assert_eq!(truncate_text("short", 10), "short");
    }

    #[test]
    fn test_first_line() {
        assert_eq!(first_line("총점 80점\n세부 내용"), "총점 80점");
        assert_eq!(first_line("한 줄"), "한 줄");
        assert_eq!(first_line(""), "");
    }
}
