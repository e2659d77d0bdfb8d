//! 面试流程驱动 - 流程层
//!
//! 把 [`TurnController`] 产生的请求交给 [`InterviewBackend`] 执行，
//! 再把结果按 generation 交回控制器，直到没有新的请求为止。

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{AppError, InterviewError};
use crate::infrastructure::Clock;
use crate::models::{ChatMessage, InterviewOutcome, SessionId};
use crate::services::InterviewBackend;
use crate::workflow::session_ctx::SessionCtx;
use crate::workflow::turn_controller::{
    Command, Effect, PendingRequest, Step, TurnController, TurnRejection, TurnState,
};

/// 语音没有识别出文字时的提示
pub const EMPTY_TRANSCRIPT_NOTICE: &str = "음성이 인식되지 않았습니다. 다시 말씀해 주세요.";

/// 一次用户操作带来的全部变化
#[derive(Debug, Clone, PartialEq)]
pub struct FlowUpdate {
    /// 新增的对话消息
    pub messages: Vec<ChatMessage>,
    /// 内联错误
    pub errors: Vec<InterviewError>,
    /// 不属于对话的提示
    pub notices: Vec<String>,
    pub state: TurnState,
    /// 面试结束时的结果
    pub outcome: Option<InterviewOutcome>,
}

impl FlowUpdate {
    fn new(state: TurnState) -> Self {
        Self {
            messages: Vec::new(),
            errors: Vec::new(),
            notices: Vec::new(),
            state,
            outcome: None,
        }
    }

    fn absorb(&mut self, step: Step) -> Option<PendingRequest> {
        self.state = step.state;
        let mut request = None;
        for effect in step.effects {
            match effect {
                Effect::Say(message) => self.messages.push(message),
                Effect::ShowError(err) => self.errors.push(err),
                Effect::Complete(outcome) => self.outcome = Some(outcome),
                Effect::Request(pending) => request = Some(pending),
            }
        }
        request
    }

    /// 题目是否已经全部结束（还没有调用 end_interview）
    pub fn questions_exhausted(&self) -> bool {
        self.state == TurnState::Terminal && self.outcome.is_none()
    }
}

/// 面试流程
///
/// - 持有控制器和后端
/// - 同一时刻只执行一个请求
/// - 后端错误全部转成 [`InterviewError`] 交给控制器
pub struct InterviewFlow {
    controller: TurnController,
    backend: Arc<dyn InterviewBackend>,
    clock: Arc<dyn Clock>,
}

impl InterviewFlow {
    pub fn new(ctx: SessionCtx, backend: Arc<dyn InterviewBackend>, clock: Arc<dyn Clock>) -> Self {
        Self {
            controller: TurnController::new(ctx),
            backend,
            clock,
        }
    }

    pub fn controller(&self) -> &TurnController {
        &self.controller
    }

    /// 用上下文里的开场白开始面试
    pub fn start(&mut self) -> Result<FlowUpdate, TurnRejection> {
        let greeting = self.controller.ctx().greeting();
        let step = self.controller.start(&greeting)?;
        let mut update = FlowUpdate::new(step.state);
        update.absorb(step);
        Ok(update)
    }

    pub fn bind_session(&mut self, session_id: SessionId) -> FlowUpdate {
        let step = self.controller.bind_session(session_id);
        let mut update = FlowUpdate::new(step.state);
        update.absorb(step);
        update
    }

    pub async fn submit_introduction(&mut self, text: &str) -> Result<FlowUpdate, TurnRejection> {
        let step = self.controller.submit_introduction(text)?;
        Ok(self.drive(step).await)
    }

    pub async fn submit_answer(&mut self, text: &str) -> Result<FlowUpdate, TurnRejection> {
        let step = self.controller.submit_answer(text, self.clock.now())?;
        Ok(self.drive(step).await)
    }

    /// 提交自我介绍或回答，取决于当前状态
    pub async fn submit_text(&mut self, text: &str) -> Result<FlowUpdate, TurnRejection> {
        match self.controller.state() {
            TurnState::AwaitingIntroduction => self.submit_introduction(text).await,
            _ => self.submit_answer(text).await,
        }
    }

    /// 语音作答：先转文字，再按文字提交
    pub async fn submit_speech(&mut self, audio: Vec<u8>) -> Result<FlowUpdate, TurnRejection> {
        self.controller.ensure_accepts_input("submit_speech")?;

        let transcript = match self.backend.recognize_speech(audio).await {
            Ok(transcript) => transcript,
            Err(e) => {
                warn!("{} 语音识别失败: {}", self.controller.ctx(), e);
                return Ok(self.error_update(InterviewError::from(&e)));
            }
        };

        if transcript.is_blank() {
            let mut update = FlowUpdate::new(self.controller.state());
            update.notices.push(EMPTY_TRANSCRIPT_NOTICE.to_string());
            return Ok(update);
        }

        info!(
            "{} 🎙️ 识别结果: {}",
            self.controller.ctx(),
            crate::utils::truncate_text(&transcript.transcript, 60)
        );
        self.submit_text(&transcript.transcript).await
    }

    /// 读取音频文件后语音作答
    pub async fn submit_speech_file(&mut self, path: &Path) -> Result<FlowUpdate, TurnRejection> {
        self.controller.ensure_accepts_input("submit_speech")?;

        match tokio::fs::read(path).await {
            Ok(audio) => self.submit_speech(audio).await,
            Err(e) => {
                let err = AppError::file_read_failed(path.display().to_string(), e);
                warn!("{} 读取音频失败: {}", self.controller.ctx(), err);
                Ok(self.error_update(InterviewError::from(&err)))
            }
        }
    }

    pub async fn request_question(&mut self, index: usize) -> Result<FlowUpdate, TurnRejection> {
        let step = self.controller.request_question(index)?;
        Ok(self.drive(step).await)
    }

    /// 重试最近一次失败的取题
    pub async fn retry_question(&mut self) -> Result<FlowUpdate, TurnRejection> {
        let step = self.controller.retry_question()?;
        Ok(self.drive(step).await)
    }

    pub async fn end_interview(&mut self) -> Result<FlowUpdate, TurnRejection> {
        let step = self.controller.end_interview()?;
        Ok(self.drive(step).await)
    }

    fn error_update(&self, err: InterviewError) -> FlowUpdate {
        let mut update = FlowUpdate::new(self.controller.state());
        update.errors.push(err);
        update
    }

    /// 依次执行请求，直到控制器不再发出新的请求
    async fn drive(&mut self, step: Step) -> FlowUpdate {
        let mut update = FlowUpdate::new(step.state);
        let mut next = update.absorb(step);

        while let Some(request) = next {
            let step = self.execute(request).await;
            next = update.absorb(step);
        }
        update
    }

    async fn execute(&mut self, request: PendingRequest) -> Step {
        let PendingRequest {
            generation,
            command,
        } = request;

        match command {
            Command::FetchQuestion { session_id, index } => {
                let result = self
                    .backend
                    .fetch_question(&session_id, index)
                    .await
                    .map_err(|e| InterviewError::from(&e));
                self.controller
                    .on_question_loaded(generation, result, self.clock.now())
            }
            Command::EvaluateAnswer(body) => {
                let result = self
                    .backend
                    .evaluate_answer(&body)
                    .await
                    .map_err(|e| InterviewError::from(&e));
                self.controller.on_answer_evaluated(generation, result)
            }
            Command::EndInterview { session_id } => {
                let result = self
                    .backend
                    .end_interview(&session_id)
                    .await
                    .map_err(|e| InterviewError::from(&e));
                self.controller.on_interview_ended(generation, result)
            }
        }
    }
}
