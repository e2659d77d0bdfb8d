use serde::Deserialize;

use super::evaluation::{deserialize_evaluation, EvaluationPayload};
use super::session::SessionId;

/// `fineval` 中的会话信息
#[derive(Debug, Clone, Deserialize)]
pub struct FinevalSession {
    pub session_id: SessionId,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub jd_name: String,
    #[serde(default)]
    pub created_at: String,
}

/// 单题结果
#[derive(Debug, Clone, Deserialize)]
pub struct FinevalResult {
    #[serde(default)]
    pub question_id: Option<i64>,
    #[serde(default)]
    pub question_content: Option<String>,
    #[serde(default)]
    pub similar_jd: Option<String>,
    #[serde(default)]
    pub answer_content: Option<String>,
    #[serde(default, deserialize_with = "deserialize_evaluation")]
    pub evaluation_content: Option<EvaluationPayload>,
}

/// 作答统计
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct FinevalCounts {
    #[serde(default)]
    pub total_questions: usize,
    #[serde(default)]
    pub answered: usize,
}

/// `fineval` 响应：整场面试的最终结果
#[derive(Debug, Clone, Deserialize)]
pub struct FinevalResponse {
    pub session: FinevalSession,
    #[serde(default)]
    pub results: Vec<FinevalResult>,
    #[serde(default)]
    pub counts: Option<FinevalCounts>,
}
