//! 语音识别服务 - 业务能力层
//!
//! 把录好的音频交给后端转成文字

use reqwest::multipart::{Form, Part};
use tracing::info;

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::HttpExecutor;
use crate::models::Transcript;

/// 语音识别服务
pub struct SttService {
    executor: HttpExecutor,
    provider: String,
    language: String,
}

impl SttService {
    pub fn new(executor: HttpExecutor, config: &Config) -> Self {
        Self {
            executor,
            provider: config.stt_provider.clone(),
            language: config.stt_language.clone(),
        }
    }

    /// 识别一段 webm 音频
    pub async fn recognize(&self, audio: Vec<u8>) -> AppResult<Transcript> {
        info!("🎙️ 语音识别 ({} 字节, {})", audio.len(), self.language);

        let part = Part::bytes(audio)
            .file_name("audio.webm")
            .mime_str("audio/webm")?;
        let form = Form::new()
            .part("file", part)
            .text("language", self.language.clone());

        let path = format!("stt/{}/recognize", self.provider);
        let transcript: Transcript = self.executor.post_multipart(&path, form).await?;

        info!(
            "✓ 识别完成 ({:.1} 秒, 置信度 {:.2})",
            transcript.duration, transcript.confidence
        );
        Ok(transcript)
    }
}
