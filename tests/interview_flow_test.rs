use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio_test::assert_ok;

use interview_client::error::{AppError, AppResult, InterviewError};
use interview_client::infrastructure::Clock;
use interview_client::models::{
    ChatMessage, EvaluateAnswerRequest, EvaluationPayload, InterviewLogEntry, QuestionFetch,
    QuestionResponse, SessionId, Transcript,
};
use interview_client::report::Leaderboard;
use interview_client::services::InterviewBackend;
use interview_client::workflow::turn_controller::{EVALUATION_FAILED_MESSAGE, FAREWELL_MESSAGE};
use interview_client::workflow::{InterviewFlow, SessionCtx, TurnRejection, TurnState};

/// 手动拨动的时钟
struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    fn new() -> Self {
        Self(Mutex::new(Utc.with_ymd_and_hms(2025, 9, 1, 10, 0, 0).unwrap()))
    }

    fn advance(&self, millis: i64) {
        let mut now = self.0.lock().unwrap();
        *now += Duration::milliseconds(millis);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// 脚本化的假后端
///
/// - 取题：题号不超过 `total` 时返回题目，否则越界
/// - 评价：按顺序消费 `evaluations`，`Err(status)` 表示非 2xx；用完后返回固定报告
/// - 语音：按顺序消费 `transcripts`
#[derive(Default)]
struct ScriptedBackend {
    total: usize,
    evaluations: Mutex<VecDeque<Result<EvaluationPayload, u16>>>,
    transcripts: Mutex<VecDeque<String>>,
    fetched: Mutex<Vec<usize>>,
    evaluated: Mutex<Vec<EvaluateAnswerRequest>>,
    ended: Mutex<Vec<SessionId>>,
}

impl ScriptedBackend {
    fn with_total(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    fn script_evaluation(self, result: Result<EvaluationPayload, u16>) -> Self {
        self.evaluations.lock().unwrap().push_back(result);
        self
    }

    fn script_transcript(self, text: &str) -> Self {
        self.transcripts.lock().unwrap().push_back(text.to_string());
        self
    }

    fn fetched(&self) -> Vec<usize> {
        self.fetched.lock().unwrap().clone()
    }

    fn evaluated(&self) -> Vec<EvaluateAnswerRequest> {
        self.evaluated.lock().unwrap().clone()
    }
}

#[async_trait]
impl InterviewBackend for ScriptedBackend {
    async fn fetch_question(&self, session_id: &SessionId, index: usize) -> AppResult<QuestionFetch> {
        self.fetched.lock().unwrap().push(index);
        if index > self.total {
            return Ok(QuestionFetch::OutOfRange {
                index,
                total: Some(self.total),
            });
        }
        Ok(QuestionFetch::Question(QuestionResponse {
            session_id: Some(session_id.clone()),
            index,
            total: self.total,
            question_id: Some(index as i64),
            question_content: format!("질문 {}", index),
            similar_jd: None,
        }))
    }

    async fn evaluate_answer(&self, request: &EvaluateAnswerRequest) -> AppResult<EvaluationPayload> {
        self.evaluated.lock().unwrap().push(request.clone());
        match self.evaluations.lock().unwrap().pop_front() {
            Some(Ok(payload)) => Ok(payload),
            Some(Err(status)) => Err(AppError::bad_response(
                "evaluate_answer",
                status,
                Some("internal".to_string()),
            )),
            None => Ok(EvaluationPayload::Report(
                "## 점수 요약\n80점\n## 종합 피드백\n무난합니다".to_string(),
            )),
        }
    }

    async fn end_interview(&self, session_id: &SessionId) -> AppResult<Vec<InterviewLogEntry>> {
        self.ended.lock().unwrap().push(session_id.clone());
        let log = self
            .evaluated
            .lock()
            .unwrap()
            .iter()
            .map(|request| InterviewLogEntry {
                question: request.question.clone(),
                answer: Some(request.answer.clone()),
                evaluation: Some(EvaluationPayload::Report("## 점수 요약\n80점".to_string())),
                time_in_seconds: Some(request.time_in_seconds),
            })
            .collect();
        Ok(log)
    }

    async fn recognize_speech(&self, _audio: Vec<u8>) -> AppResult<Transcript> {
        let transcript = self.transcripts.lock().unwrap().pop_front().unwrap_or_default();
        Ok(Transcript {
            transcript,
            duration: 3.2,
            language: "ko-KR".to_string(),
            confidence: 0.93,
        })
    }
}

fn new_flow(backend: Arc<ScriptedBackend>, clock: Arc<ManualClock>) -> InterviewFlow {
    let ctx = SessionCtx::new("네이버", "SMARTSTUDIO Back-end", "홍길동");
    let mut flow = InterviewFlow::new(ctx, backend, clock);
    assert_ok!(flow.start());
    flow
}

fn bound_flow(backend: Arc<ScriptedBackend>, clock: Arc<ManualClock>) -> InterviewFlow {
    let mut flow = new_flow(backend, clock);
    flow.bind_session(SessionId::new("56"));
    flow
}

#[tokio::test]
async fn test_full_interview_run() {
    let backend = Arc::new(ScriptedBackend::with_total(2));
    let clock = Arc::new(ManualClock::new());
    let mut flow = bound_flow(backend.clone(), clock.clone());

    let update = assert_ok!(flow.submit_introduction("안녕하세요, 백엔드 개발자입니다").await);
    assert_eq!(update.state, TurnState::AwaitingAnswer(1));
    assert_eq!(update.messages.last(), Some(&ChatMessage::interviewer("질문 1")));

    clock.advance(2500);
    let update = assert_ok!(flow.submit_answer("STAR 구조로 답변합니다").await);
    assert_eq!(update.state, TurnState::AwaitingAnswer(2));
    assert!(update
        .messages
        .iter()
        .any(|m| m.text.starts_with("평가 요약: ")));

    clock.advance(400);
    let update = assert_ok!(flow.submit_answer("두 번째 답변").await);
    assert_eq!(update.state, TurnState::Terminal);
    assert!(update.questions_exhausted());
    assert_eq!(
        update.messages.last(),
        Some(&ChatMessage::interviewer(FAREWELL_MESSAGE))
    );

    let times: Vec<u32> = backend.evaluated().iter().map(|r| r.time_in_seconds).collect();
    assert_eq!(times, vec![3, 1]);
    assert_eq!(backend.fetched(), vec![1, 2]);

    let update = assert_ok!(flow.end_interview().await);
    let outcome = update.outcome.expect("interview should complete");
    assert_eq!(outcome.session_id, Some(SessionId::new("56")));
    assert_eq!(outcome.interview_log.len(), 2);
    assert_eq!(backend.ended.lock().unwrap().len(), 1);

    let board = Leaderboard::from_outcome(&outcome);
    assert_eq!(board.rows.len(), 2);
    assert_eq!(board.average_score(), Some(80.0));
}

#[tokio::test]
async fn test_evaluation_server_error_advances_to_next_question() {
    let backend = Arc::new(ScriptedBackend::with_total(5).script_evaluation(Err(500)));
    let mut flow = bound_flow(backend.clone(), Arc::new(ManualClock::new()));

    assert_ok!(flow.submit_introduction("안녕하세요").await);
    let update = assert_ok!(flow.submit_answer("답변").await);

    assert_eq!(
        update.errors,
        vec![InterviewError::NetworkOrServer {
            message: "Error 500: internal".to_string()
        }]
    );
    assert!(update
        .messages
        .contains(&ChatMessage::interviewer(EVALUATION_FAILED_MESSAGE)));
    assert_eq!(update.state, TurnState::AwaitingAnswer(2));
    assert_eq!(backend.fetched(), vec![1, 2]);
    assert!(flow.controller().evaluations().is_empty());
}

#[tokio::test]
async fn test_request_past_total_ends_without_backend_call() {
    let backend = Arc::new(ScriptedBackend::with_total(5));
    let mut flow = bound_flow(backend.clone(), Arc::new(ManualClock::new()));

    assert_ok!(flow.submit_introduction("안녕하세요").await);
    let update = assert_ok!(flow.request_question(6).await);

    assert_eq!(update.state, TurnState::Terminal);
    assert!(update.errors.is_empty());
    assert_eq!(
        update.messages,
        vec![ChatMessage::interviewer(FAREWELL_MESSAGE)]
    );
    assert_eq!(backend.fetched(), vec![1]);
}

#[tokio::test]
async fn test_backend_out_of_range_is_farewell_not_error() {
    let backend = Arc::new(ScriptedBackend::with_total(0));
    let mut flow = bound_flow(backend, Arc::new(ManualClock::new()));

    let update = assert_ok!(flow.submit_introduction("안녕하세요").await);
    assert_eq!(update.state, TurnState::Terminal);
    assert!(update.errors.is_empty());
    assert_eq!(flow.controller().total_questions(), Some(0));
}

#[tokio::test]
async fn test_missing_session_is_recoverable() {
    let backend = Arc::new(ScriptedBackend::with_total(3));
    let mut flow = new_flow(backend.clone(), Arc::new(ManualClock::new()));

    let update = assert_ok!(flow.submit_introduction("안녕하세요").await);
    assert_eq!(update.errors, vec![InterviewError::SessionNotReady]);
    assert_eq!(update.state, TurnState::AwaitingIntroduction);
    assert!(backend.fetched().is_empty());

    flow.bind_session(SessionId::new("56"));
    let update = assert_ok!(flow.submit_introduction("안녕하세요").await);
    assert_eq!(update.state, TurnState::AwaitingAnswer(1));
}

#[tokio::test]
async fn test_end_without_session_reports_note() {
    let backend = Arc::new(ScriptedBackend::with_total(3));
    let mut flow = new_flow(backend.clone(), Arc::new(ManualClock::new()));

    let update = assert_ok!(flow.end_interview().await);
    let outcome = update.outcome.expect("interview should complete");
    assert!(outcome.interview_log.is_empty());
    assert_eq!(outcome.note.as_deref(), Some("세션 없음"));
    assert!(backend.ended.lock().unwrap().is_empty());

    assert_eq!(
        flow.submit_answer("늦은 답변").await,
        Err(TurnRejection::AlreadyFinished)
    );
}

#[tokio::test]
async fn test_speech_answers() {
    let backend = Arc::new(
        ScriptedBackend::with_total(3)
            .script_transcript("  ")
            .script_transcript("음성으로 자기소개 드립니다"),
    );
    let mut flow = bound_flow(backend.clone(), Arc::new(ManualClock::new()));

    let update = assert_ok!(flow.submit_speech(vec![0u8; 16]).await);
    assert_eq!(update.notices.len(), 1);
    assert_eq!(update.state, TurnState::AwaitingIntroduction);

    let update = assert_ok!(flow.submit_speech(vec![0u8; 16]).await);
    assert_eq!(
        update.messages.first(),
        Some(&ChatMessage::candidate("음성으로 자기소개 드립니다"))
    );
    assert_eq!(update.state, TurnState::AwaitingAnswer(1));
}

#[tokio::test]
async fn test_missing_audio_file_is_inline_error() {
    let backend = Arc::new(ScriptedBackend::with_total(3));
    let mut flow = bound_flow(backend, Arc::new(ManualClock::new()));

    let update = assert_ok!(
        flow.submit_speech_file(std::path::Path::new("/nonexistent/answer.webm"))
            .await
    );
    assert_eq!(update.errors.len(), 1);
    assert_eq!(update.state, TurnState::AwaitingIntroduction);
}
