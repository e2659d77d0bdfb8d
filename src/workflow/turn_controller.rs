//! 面试轮次控制器 - 流程层
//!
//! 核心职责：定义"一场面试"的状态机
//!
//! 控制器本身不做任何 IO。每次状态转换返回一个 [`Step`]：新状态 + 一组 [`Effect`]。
//! 需要访问后端时，转换会产生 [`Effect::Request`]，由调用方执行后把结果连同
//! generation 一起交回对应的 `on_*` 方法。generation 与当前未完成请求不一致的
//! 响应一律丢弃，所以结束面试之后迟到的评价不会再改动状态。
//!
//! 状态流转：
//! ```text
//! NotStarted ─start→ AwaitingIntroduction ─(取第1题)→ AwaitingAnswer(1)
//!     AwaitingAnswer(i) ─submit_answer→ Evaluating(i) ─(评价完成/失败)→ 取第 i+1 题
//!     超过总题数 / 后端返回越界 → Terminal
//!     end_interview：除 NotStarted 外任何状态 → Terminal
//! ```

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::InterviewError;
use crate::models::{
    ChatMessage, EvaluateAnswerRequest, EvaluationPayload, EvaluationRecord, InterviewLogEntry,
    InterviewOutcome, QuestionFetch, QuestionTurn, SessionId,
};
use crate::workflow::session_ctx::SessionCtx;

pub const FAREWELL_MESSAGE: &str = "준비된 질문이 모두 끝났습니다. 면접을 종료하고 결과를 확인하세요.";
pub const EVALUATION_FAILED_MESSAGE: &str = "평가 중 오류가 발생했습니다. 다음 질문으로 넘어갈게요.";
pub const FETCH_FAILED_MESSAGE: &str = "질문을 가져오는 데 실패했습니다. 잠시 후 다시 시도해 주세요.";
pub const NO_SESSION_NOTE: &str = "세션 없음";

/// 面试状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// 还没有打招呼
    NotStarted,
    /// 等待自我介绍
    AwaitingIntroduction,
    /// 等待第 i 题的回答
    AwaitingAnswer(usize),
    /// 第 i 题的回答正在评价
    Evaluating(usize),
    /// 题目结束或面试已结束
    Terminal,
}

/// 需要调用方执行的后端请求
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchQuestion { session_id: SessionId, index: usize },
    EvaluateAnswer(EvaluateAnswerRequest),
    EndInterview { session_id: SessionId },
}

/// 带 generation 的请求
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub generation: u64,
    pub command: Command,
}

/// 状态转换产生的副作用
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// 在对话框里追加一条消息
    Say(ChatMessage),
    /// 内联显示一条错误
    ShowError(InterviewError),
    /// 执行一次后端请求
    Request(PendingRequest),
    /// 面试结束，进入结果页
    Complete(InterviewOutcome),
}

/// 一次状态转换的结果
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub state: TurnState,
    pub effects: Vec<Effect>,
}

impl Step {
    /// 取出需要执行的请求（同一时刻最多一个）
    pub fn request(&self) -> Option<&PendingRequest> {
        self.effects.iter().find_map(|effect| match effect {
            Effect::Request(request) => Some(request),
            _ => None,
        })
    }
}

/// 在错误的时机调用控制器
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnRejection {
    /// 有请求正在进行，输入被禁用
    #[error("요청을 처리하는 중입니다. 잠시만 기다려 주세요.")]
    InputDisabled,
    #[error("현재 상태({state:?})에서는 {action}을(를) 할 수 없습니다.")]
    InvalidState {
        action: &'static str,
        state: TurnState,
    },
    #[error("입력이 비어 있습니다.")]
    EmptyInput,
    #[error("이미 종료된 면접입니다.")]
    AlreadyFinished,
    /// 取题失败后没有进行中的请求，只能重试取题
    #[error("{index}번 질문을 가져오지 못했습니다. /retry 로 다시 요청해 주세요.")]
    QuestionFetchFailed { index: usize },
}

/// 作答用时（秒）：四舍五入，至少 1 秒
pub fn elapsed_seconds(started_at: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let millis = (now - started_at).num_milliseconds().max(0);
    let seconds = ((millis + 500) / 1000).max(1);
    u32::try_from(seconds).unwrap_or(u32::MAX)
}

/// 面试轮次控制器
///
/// - 持有对话记录、当前题目和评价记录
/// - 决定何时取题、何时评价、何时结束
/// - 同一时刻最多一个未完成的请求
pub struct TurnController {
    ctx: SessionCtx,
    state: TurnState,
    transcript: Vec<ChatMessage>,
    current: Option<QuestionTurn>,
    total: Option<usize>,
    evaluations: Vec<EvaluationRecord>,
    generation: u64,
    /// 未完成请求的 generation
    in_flight: Option<u64>,
    /// 正在取的题号
    pending_fetch: Option<usize>,
    /// 最近一次取题失败的题号，用于重试
    failed_fetch: Option<usize>,
    pending_evaluation: Option<EvaluateAnswerRequest>,
    ending: bool,
    outcome: Option<InterviewOutcome>,
}

impl TurnController {
    pub fn new(ctx: SessionCtx) -> Self {
        Self {
            ctx,
            state: TurnState::NotStarted,
            transcript: Vec::new(),
            current: None,
            total: None,
            evaluations: Vec::new(),
            generation: 0,
            in_flight: None,
            pending_fetch: None,
            failed_fetch: None,
            pending_evaluation: None,
            ending: false,
            outcome: None,
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn ctx(&self) -> &SessionCtx {
        &self.ctx
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.ctx.session_id.as_ref()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn current_question(&self) -> Option<&QuestionTurn> {
        self.current.as_ref()
    }

    /// 后端返回的总题数（取到第一题之前未知）
    pub fn total_questions(&self) -> Option<usize> {
        self.total
    }

    pub fn evaluations(&self) -> &[EvaluationRecord] {
        &self.evaluations
    }

    pub fn outcome(&self) -> Option<&InterviewOutcome> {
        self.outcome.as_ref()
    }

    /// 是否有未完成的请求
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// 当前是否接受用户输入
    pub fn accepts_input(&self) -> bool {
        !self.ending
            && self.in_flight.is_none()
            && matches!(
                self.state,
                TurnState::AwaitingIntroduction | TurnState::AwaitingAnswer(_)
            )
    }

    /// 检查当前是否可以提交自我介绍或回答
    pub fn ensure_accepts_input(&self, action: &'static str) -> Result<(), TurnRejection> {
        self.check_input(action)?;
        match self.state {
            TurnState::AwaitingIntroduction | TurnState::AwaitingAnswer(_) => Ok(()),
            _ => Err(self.invalid(action)),
        }
    }

    // ========== 用户操作 ==========

    /// 打招呼，进入等待自我介绍
    pub fn start(&mut self, greeting: &str) -> Result<Step, TurnRejection> {
        if self.state != TurnState::NotStarted {
            return Err(self.invalid("start"));
        }
        let mut effects = Vec::new();
        self.state = TurnState::AwaitingIntroduction;
        self.say(&mut effects, ChatMessage::interviewer(greeting));
        info!("{} 🎬 面试开始", self.ctx);
        Ok(self.step(effects))
    }

    /// 绑定后端会话（会话在后台异步创建）
    pub fn bind_session(&mut self, session_id: SessionId) -> Step {
        if let Some(old) = &self.ctx.session_id {
            if *old != session_id {
                warn!("会话 {} 被替换为 {}", old, session_id);
            }
        }
        self.ctx.session_id = Some(session_id);
        info!("{} 🔗 会话已绑定", self.ctx);
        self.step(Vec::new())
    }

    /// 提交自我介绍，开始取第1题
    ///
    /// 会话还没绑定时只返回一条 `SessionNotReady`，状态不变，可以重试。
    pub fn submit_introduction(&mut self, text: &str) -> Result<Step, TurnRejection> {
        self.check_input("submit_introduction")?;
        if self.state != TurnState::AwaitingIntroduction {
            return Err(self.invalid("submit_introduction"));
        }
        let text = non_empty(text)?;

        let Some(session_id) = self.ctx.session_id.clone() else {
            return Ok(self.session_not_ready());
        };

        let mut effects = Vec::new();
        self.say(&mut effects, ChatMessage::candidate(text));
        self.issue_fetch(&mut effects, session_id, 1);
        Ok(self.step(effects))
    }

    /// 提交当前题目的回答
    pub fn submit_answer(&mut self, text: &str, now: DateTime<Utc>) -> Result<Step, TurnRejection> {
        self.check_input("submit_answer")?;
        let TurnState::AwaitingAnswer(index) = self.state else {
            return Err(self.invalid("submit_answer"));
        };
        let text = non_empty(text)?;
        let Some(question) = self.current.as_ref() else {
            return Err(self.invalid("submit_answer"));
        };

        let Some(session_id) = self.ctx.session_id.clone() else {
            return Ok(self.session_not_ready());
        };

        let request = EvaluateAnswerRequest {
            session_id,
            question: question.text.clone(),
            answer: text.to_string(),
            time_in_seconds: elapsed_seconds(question.started_at, now),
        };
        info!(
            "{} 📝 第 {} 题作答完成，用时 {} 秒",
            self.ctx, index, request.time_in_seconds
        );

        let mut effects = Vec::new();
        self.say(&mut effects, ChatMessage::candidate(text));
        self.state = TurnState::Evaluating(index);
        self.pending_evaluation = Some(request.clone());
        self.issue(&mut effects, Command::EvaluateAnswer(request));
        Ok(self.step(effects))
    }

    /// 取第 `index` 题（从1开始）
    ///
    /// 已知总题数且 `index` 超出时直接结束，不再请求后端。
    pub fn request_question(&mut self, index: usize) -> Result<Step, TurnRejection> {
        if self.ending {
            return Err(TurnRejection::AlreadyFinished);
        }
        if self.in_flight.is_some() {
            return Err(TurnRejection::InputDisabled);
        }
        if index == 0 || matches!(self.state, TurnState::NotStarted | TurnState::Terminal) {
            return Err(self.invalid("request_question"));
        }

        let mut effects = Vec::new();
        if self.total.is_some_and(|total| index > total) {
            self.finish_questions(&mut effects, index);
            return Ok(self.step(effects));
        }

        let Some(session_id) = self.ctx.session_id.clone() else {
            return Ok(self.session_not_ready());
        };
        self.issue_fetch(&mut effects, session_id, index);
        Ok(self.step(effects))
    }

    /// 重试最近一次失败的取题
    pub fn retry_question(&mut self) -> Result<Step, TurnRejection> {
        match self.failed_fetch {
            Some(index) => self.request_question(index),
            None => Err(self.invalid("retry_question")),
        }
    }

    /// 结束面试
    ///
    /// 有会话时请求整场记录；没有会话时直接以"세션 없음"结束。
    pub fn end_interview(&mut self) -> Result<Step, TurnRejection> {
        if self.ending {
            return Err(TurnRejection::AlreadyFinished);
        }
        if self.state == TurnState::NotStarted {
            return Err(self.invalid("end_interview"));
        }

        // 作废所有未完成的请求
        self.generation += 1;
        self.in_flight = None;
        self.pending_fetch = None;
        self.pending_evaluation = None;
        self.ending = true;
        self.state = TurnState::Terminal;

        let mut effects = Vec::new();
        match self.ctx.session_id.clone() {
            Some(session_id) => {
                info!("{} 🏁 结束面试", self.ctx);
                self.issue(&mut effects, Command::EndInterview { session_id });
            }
            None => {
                warn!("{} 没有会话，直接结束", self.ctx);
                let outcome = InterviewOutcome {
                    note: Some(NO_SESSION_NOTE.to_string()),
                    ..self.base_outcome()
                };
                self.complete(&mut effects, outcome);
            }
        }
        Ok(self.step(effects))
    }

    // ========== 后端响应 ==========

    /// 取题结果
    pub fn on_question_loaded(
        &mut self,
        generation: u64,
        result: Result<QuestionFetch, InterviewError>,
        now: DateTime<Utc>,
    ) -> Step {
        if !self.accept(generation) {
            return self.step(Vec::new());
        }
        let index = self.pending_fetch.take().unwrap_or(1);
        let mut effects = Vec::new();

        match result {
            Ok(QuestionFetch::Question(response)) => {
                self.total = Some(response.total);
                self.failed_fetch = None;
                let mut turn = QuestionTurn::from_response(&response, now);
                turn.index = index;
                debug!(
                    "{} 第 {}/{} 题: {}",
                    self.ctx,
                    index,
                    response.total,
                    crate::utils::truncate_text(&turn.text, 60)
                );
                self.say(&mut effects, ChatMessage::interviewer(turn.text.clone()));
                self.current = Some(turn);
                self.state = TurnState::AwaitingAnswer(index);
            }
            Ok(QuestionFetch::OutOfRange { total, .. })
            | Err(InterviewError::OutOfRangeQuestion { total, .. }) => {
                if total.is_some() {
                    self.total = total;
                }
                self.finish_questions(&mut effects, index);
            }
            Err(err) => {
                warn!("{} 第 {} 题获取失败: {}", self.ctx, index, err);
                self.failed_fetch = Some(index);
                effects.push(Effect::ShowError(err));
                self.say(&mut effects, ChatMessage::interviewer(FETCH_FAILED_MESSAGE));
            }
        }
        self.step(effects)
    }

    /// 评价结果
    ///
    /// 评价失败只显示错误，面试照常进入下一题。
    pub fn on_answer_evaluated(
        &mut self,
        generation: u64,
        result: Result<EvaluationPayload, InterviewError>,
    ) -> Step {
        if !self.accept(generation) {
            return self.step(Vec::new());
        }
        let TurnState::Evaluating(index) = self.state else {
            return self.step(Vec::new());
        };
        let request = self.pending_evaluation.take();
        let mut effects = Vec::new();

        match (result, request) {
            (Ok(evaluation), Some(request)) => {
                info!(
                    "{} ✓ 第 {} 题评价完成 (得分: {:?})",
                    self.ctx,
                    index,
                    evaluation.final_score()
                );
                self.say(
                    &mut effects,
                    ChatMessage::interviewer(format!("평가 요약: {}", evaluation.summary_text())),
                );
                self.evaluations.push(EvaluationRecord {
                    question: request.question,
                    answer: request.answer,
                    elapsed_seconds: request.time_in_seconds,
                    evaluation,
                });
            }
            (Ok(_), None) => warn!("{} 第 {} 题评价结果没有对应的请求", self.ctx, index),
            (Err(err), _) => {
                warn!("{} 第 {} 题评价失败: {}", self.ctx, index, err);
                effects.push(Effect::ShowError(err));
                self.say(&mut effects, ChatMessage::interviewer(EVALUATION_FAILED_MESSAGE));
            }
        }

        let next = index + 1;
        if self.total.is_some_and(|total| next > total) {
            self.finish_questions(&mut effects, next);
        } else {
            match self.ctx.session_id.clone() {
                Some(session_id) => self.issue_fetch(&mut effects, session_id, next),
                None => effects.push(Effect::ShowError(InterviewError::SessionNotReady)),
            }
        }
        self.step(effects)
    }

    /// 结束面试的结果
    pub fn on_interview_ended(
        &mut self,
        generation: u64,
        result: Result<Vec<InterviewLogEntry>, InterviewError>,
    ) -> Step {
        if !self.accept(generation) {
            return self.step(Vec::new());
        }
        let mut effects = Vec::new();
        let outcome = match result {
            Ok(interview_log) => {
                info!("{} ✓ 面试记录 {} 条", self.ctx, interview_log.len());
                InterviewOutcome {
                    interview_log,
                    ..self.base_outcome()
                }
            }
            Err(err) => {
                warn!("{} 结束面试失败: {}", self.ctx, err);
                let error = err.to_string();
                effects.push(Effect::ShowError(err));
                InterviewOutcome {
                    error: Some(error),
                    ..self.base_outcome()
                }
            }
        };
        self.complete(&mut effects, outcome);
        self.step(effects)
    }

    // ========== 内部 ==========

    fn step(&self, effects: Vec<Effect>) -> Step {
        Step {
            state: self.state,
            effects,
        }
    }

    fn invalid(&self, action: &'static str) -> TurnRejection {
        TurnRejection::InvalidState {
            action,
            state: self.state,
        }
    }

    fn check_input(&self, action: &'static str) -> Result<(), TurnRejection> {
        if self.ending {
            return Err(TurnRejection::AlreadyFinished);
        }
        if self.in_flight.is_some() {
            return Err(TurnRejection::InputDisabled);
        }
        if let Some(index) = self.failed_fetch {
            return Err(TurnRejection::QuestionFetchFailed { index });
        }
        if matches!(self.state, TurnState::Evaluating(_)) {
            return Err(TurnRejection::InputDisabled);
        }
        if self.state == TurnState::NotStarted {
            return Err(self.invalid(action));
        }
        Ok(())
    }

    fn session_not_ready(&self) -> Step {
        warn!("{} 会话尚未就绪", self.ctx);
        self.step(vec![Effect::ShowError(InterviewError::SessionNotReady)])
    }

    fn say(&mut self, effects: &mut Vec<Effect>, message: ChatMessage) {
        self.transcript.push(message.clone());
        effects.push(Effect::Say(message));
    }

    fn issue(&mut self, effects: &mut Vec<Effect>, command: Command) {
        self.generation += 1;
        self.in_flight = Some(self.generation);
        effects.push(Effect::Request(PendingRequest {
            generation: self.generation,
            command,
        }));
    }

    fn issue_fetch(&mut self, effects: &mut Vec<Effect>, session_id: SessionId, index: usize) {
        self.pending_fetch = Some(index);
        self.issue(effects, Command::FetchQuestion { session_id, index });
    }

    /// 只接受与未完成请求 generation 一致的响应
    fn accept(&mut self, generation: u64) -> bool {
        if self.in_flight == Some(generation) {
            self.in_flight = None;
            true
        } else {
            debug!(
                "{} 丢弃过期响应 (generation {}, 当前 {:?})",
                self.ctx, generation, self.in_flight
            );
            false
        }
    }

    fn finish_questions(&mut self, effects: &mut Vec<Effect>, index: usize) {
        info!(
            "{} 🎉 题目已全部结束 (第 {} 题超出总数 {:?})",
            self.ctx, index, self.total
        );
        self.current = None;
        self.failed_fetch = None;
        self.state = TurnState::Terminal;
        self.say(effects, ChatMessage::interviewer(FAREWELL_MESSAGE));
    }

    fn base_outcome(&self) -> InterviewOutcome {
        InterviewOutcome {
            session_id: self.ctx.session_id.clone(),
            company_name: self.ctx.company_name.clone(),
            job_title: self.ctx.job_title.clone(),
            ..Default::default()
        }
    }

    fn complete(&mut self, effects: &mut Vec<Effect>, outcome: InterviewOutcome) {
        self.outcome = Some(outcome.clone());
        effects.push(Effect::Complete(outcome));
    }
}

fn non_empty(text: &str) -> Result<&str, TurnRejection> {
    let text = text.trim();
    if text.is_empty() {
        Err(TurnRejection::EmptyInput)
    } else {
        Ok(text)
    }
}
