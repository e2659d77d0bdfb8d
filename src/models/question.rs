use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::session::SessionId;

/// `question/` 响应
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionResponse {
    #[serde(default)]
    pub session_id: Option<SessionId>,
    pub index: usize,
    pub total: usize,
    #[serde(default)]
    pub question_id: Option<i64>,
    pub question_content: String,
    #[serde(default)]
    pub similar_jd: Option<String>,
}

/// 取题结果
///
/// 题号越界在后端是 4xx，这里在客户端边界上把它归一成"题目已结束"信号。
#[derive(Debug, Clone)]
pub enum QuestionFetch {
    /// 正常取到题目
    Question(QuestionResponse),
    /// 题号超出范围
    OutOfRange { index: usize, total: Option<usize> },
}

/// 当前正在作答的一道题
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionTurn {
    /// 题号（从1开始）
    pub index: usize,
    pub text: String,
    pub question_id: Option<i64>,
    pub similar_jd: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl QuestionTurn {
    pub fn from_response(response: &QuestionResponse, started_at: DateTime<Utc>) -> Self {
        Self {
            index: response.index,
            text: response.question_content.clone(),
            question_id: response.question_id,
            similar_jd: response.similar_jd.clone(),
            started_at,
        }
    }
}
