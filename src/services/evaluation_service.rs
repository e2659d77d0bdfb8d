//! 评价服务 - 业务能力层
//!
//! 负责答题评价、结束面试和最终结果查询

use serde_json::{json, Value as JsonValue};
use tracing::{debug, info};

use crate::error::{ApiError, AppError, AppResult};
use crate::infrastructure::HttpExecutor;
use crate::models::{
    EndInterviewResponse, EvaluateAnswerRequest, EvaluationPayload, FinevalResponse,
    InterviewLogEntry, SessionId,
};

/// 评价服务
pub struct EvaluationService {
    executor: HttpExecutor,
}

impl EvaluationService {
    pub fn new(executor: HttpExecutor) -> Self {
        Self { executor }
    }

    /// 提交一次回答，返回归一后的评价
    pub async fn evaluate(&self, request: &EvaluateAnswerRequest) -> AppResult<EvaluationPayload> {
        info!(
            "📤 提交回答评价 (session {}, {} 秒)",
            request.session_id, request.time_in_seconds
        );
        let raw: JsonValue = self.executor.post_json("evaluate_answer", request).await?;
        debug!("评价结果: {}", raw);

        EvaluationPayload::from_value(raw).ok_or_else(|| {
            AppError::from(ApiError::EmptyResponse {
                endpoint: "evaluate_answer".to_string(),
            })
        })
    }

    /// 结束面试，返回整场面试记录
    pub async fn end_interview(&self, session_id: &SessionId) -> AppResult<Vec<InterviewLogEntry>> {
        info!("🏁 结束面试 (session {})", session_id);
        let response: EndInterviewResponse = self
            .executor
            .post_json("end_interview", &json!({ "session_id": session_id }))
            .await?;
        Ok(response.interview_log)
    }

    /// 查询最终结果
    pub async fn fineval(&self, session_id: &SessionId) -> AppResult<FinevalResponse> {
        self.executor
            .get_json("fineval", &[("session_id", session_id.to_string())])
            .await
    }
}
