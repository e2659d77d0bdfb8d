//! 面试后端接口
//!
//! 流程层只依赖 [`InterviewBackend`]，测试里可以换成脚本化的假后端。

use std::path::Path;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::HttpExecutor;
use crate::models::{
    EvaluateAnswerRequest, EvaluationPayload, FinevalResponse, InterviewLogEntry,
    InterviewSession, MaskedResume, QuestionFetch, ResumeFullRequest, SessionId, Transcript,
};
use crate::services::{EvaluationService, QuestionService, ResumeService, SttService};

/// 面试过程中用到的后端能力
#[async_trait]
pub trait InterviewBackend: Send + Sync {
    /// 取第 `index` 题（从1开始）
    async fn fetch_question(&self, session_id: &SessionId, index: usize) -> AppResult<QuestionFetch>;

    async fn evaluate_answer(&self, request: &EvaluateAnswerRequest) -> AppResult<EvaluationPayload>;

    async fn end_interview(&self, session_id: &SessionId) -> AppResult<Vec<InterviewLogEntry>>;

    /// 语音转文字
    async fn recognize_speech(&self, audio: Vec<u8>) -> AppResult<Transcript>;
}

/// 基于 HTTP 的后端实现，组合各个业务服务
pub struct HttpBackend {
    resume: ResumeService,
    questions: QuestionService,
    evaluations: EvaluationService,
    stt: SttService,
}

impl HttpBackend {
    pub fn new(config: &Config) -> AppResult<Self> {
        let executor = HttpExecutor::new(config)?;
        Ok(Self {
            resume: ResumeService::new(executor.clone()),
            questions: QuestionService::new(executor.clone()),
            evaluations: EvaluationService::new(executor.clone()),
            stt: SttService::new(executor, config),
        })
    }

    pub async fn mask_resume(&self, pdf_path: &Path, target_name: &str) -> AppResult<MaskedResume> {
        self.resume.mask_resume(pdf_path, target_name).await
    }

    pub async fn create_session(&self, request: ResumeFullRequest) -> AppResult<InterviewSession> {
        self.resume.create_session(request).await
    }

    pub async fn fineval(&self, session_id: &SessionId) -> AppResult<FinevalResponse> {
        self.evaluations.fineval(session_id).await
    }
}

#[async_trait]
impl InterviewBackend for HttpBackend {
    async fn fetch_question(&self, session_id: &SessionId, index: usize) -> AppResult<QuestionFetch> {
        self.questions.fetch(session_id, index).await
    }

    async fn evaluate_answer(&self, request: &EvaluateAnswerRequest) -> AppResult<EvaluationPayload> {
        self.evaluations.evaluate(request).await
    }

    async fn end_interview(&self, session_id: &SessionId) -> AppResult<Vec<InterviewLogEntry>> {
        self.evaluations.end_interview(session_id).await
    }

    async fn recognize_speech(&self, audio: Vec<u8>) -> AppResult<Transcript> {
        self.stt.recognize(audio).await
    }
}
