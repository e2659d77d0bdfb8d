use serde::Deserialize;

/// 语音识别结果（`stt/{provider}/recognize`）
#[derive(Debug, Clone, Deserialize)]
pub struct Transcript {
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub confidence: f64,
}

impl Transcript {
    pub fn is_blank(&self) -> bool {
        self.transcript.trim().is_empty()
    }
}
