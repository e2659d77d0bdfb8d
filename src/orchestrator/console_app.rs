//! 控制台面试应用 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一场面试的完整生命周期。
//!
//! ## 核心功能
//!
//! 1. **读取面试信息**：姓名、公司、岗位、PDF 简历路径
//! 2. **简历脱敏**：上传 PDF，拿到脱敏文本
//! 3. **后台建会话**：会话创建放在 tokio 任务里，准备好后再绑定
//! 4. **对话循环**：普通输入是回答，`/voice <文件>` 语音作答，`/retry` 重试取题，`/end` 结束
//! 5. **自动结束**：最后一题结束后倒计时，然后自动结束面试
//! 6. **结果页**：写对话日志，打印结果页（有会话时从 fineval 重新获取）

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::SystemClock;
use crate::models::{InterviewOutcome, InterviewSession, ResumeFullRequest};
use crate::report::Leaderboard;
use crate::services::{HttpBackend, InterviewBackend};
use crate::utils::logging;
use crate::workflow::{FlowUpdate, InterviewFlow, SessionCtx, TurnState};

const END_COMMAND: &str = "/end";
const RETRY_COMMAND: &str = "/retry";
const VOICE_COMMAND: &str = "/voice";

/// 面试信息
#[derive(Debug, Clone)]
struct InterviewInfo {
    user_name: String,
    company_name: String,
    job_title: String,
    resume_path: PathBuf,
}

/// 控制台输入
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConsoleCommand<'a> {
    End,
    Retry,
    /// 音频文件路径（可能为空）
    Voice(&'a str),
    Answer(&'a str),
}

impl<'a> ConsoleCommand<'a> {
    /// 命令必须是第一个词，`/voicefoo` 不算 `/voice`
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };
        match head {
            END_COMMAND if rest.is_empty() => ConsoleCommand::End,
            RETRY_COMMAND if rest.is_empty() => ConsoleCommand::Retry,
            VOICE_COMMAND => ConsoleCommand::Voice(rest),
            _ => ConsoleCommand::Answer(line),
        }
    }
}

/// 后台会话创建的轮询结果
enum SessionPoll {
    /// 没有进行中的创建
    Idle,
    Pending,
    Ready(InterviewSession),
    Failed(AppError),
    /// 创建任务没有发回结果就退出了
    Lost,
}

/// 后台创建中的会话
///
/// 创建失败后保留请求，`/retry` 可以重新创建。
struct SessionSlot {
    request: ResumeFullRequest,
    pending: Option<oneshot::Receiver<AppResult<InterviewSession>>>,
    failed: bool,
}

impl SessionSlot {
    fn new(request: ResumeFullRequest) -> Self {
        Self {
            request,
            pending: None,
            failed: false,
        }
    }

    fn attach(&mut self, receiver: oneshot::Receiver<AppResult<InterviewSession>>) {
        self.pending = Some(receiver);
        self.failed = false;
    }

    /// 上一次创建失败，且没有新的创建在进行
    fn can_retry(&self) -> bool {
        self.failed && self.pending.is_none()
    }

    fn poll(&mut self) -> SessionPoll {
        let Some(receiver) = self.pending.as_mut() else {
            return SessionPoll::Idle;
        };
        let poll = match receiver.try_recv() {
            Ok(Ok(session)) => SessionPoll::Ready(session),
            Ok(Err(e)) => SessionPoll::Failed(e),
            Err(oneshot::error::TryRecvError::Empty) => return SessionPoll::Pending,
            Err(oneshot::error::TryRecvError::Closed) => SessionPoll::Lost,
        };
        self.pending = None;
        self.failed = !matches!(poll, SessionPoll::Ready(_));
        poll
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    backend: Arc<HttpBackend>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::log_startup(&config.api_base_url);

        let backend = HttpBackend::new(&config).context("创建 HTTP 客户端失败")?;

        Ok(Self {
            config,
            backend: Arc::new(backend),
        })
    }

    /// 运行一场面试
    pub async fn run(&self) -> Result<()> {
        let mut input = BufReader::new(tokio::io::stdin()).lines();

        let info = read_interview_info(&mut input).await?;
        logging::init_log_file(
            &self.config.output_log_file,
            &format!("{} / {}", info.company_name, info.job_title),
        )?;

        // 简历脱敏
        println!("📄 이력서를 마스킹하는 중...");
        let masked = self
            .backend
            .mask_resume(&info.resume_path, &info.user_name)
            .await
            .context("简历脱敏失败")?;

        // 后台创建会话，不阻塞开场白
        let mut session = SessionSlot::new(ResumeFullRequest {
            user_name: info.user_name.clone(),
            company_name: info.company_name.clone(),
            jd_name: info.job_title.clone(),
            resume_text: masked.masked_text,
        });
        self.spawn_session(&mut session);

        let ctx = SessionCtx::new(&info.company_name, &info.job_title, &info.user_name);
        let backend: Arc<dyn InterviewBackend> = self.backend.clone();
        let mut flow = InterviewFlow::new(ctx, backend, Arc::new(SystemClock));

        let update = flow.start()?;
        self.show(&update);
        println!(
            "💡 답변을 입력하세요. ({} <파일>: 음성 답변, {}: 질문 다시 요청, {}: 면접 종료)",
            VOICE_COMMAND, RETRY_COMMAND, END_COMMAND
        );

        let outcome = loop {
            if let Some(update) = self.poll_session(&mut session, &mut flow) {
                self.show(&update);
            }

            let Some(line) = input.next_line().await? else {
                info!("输入结束，结束面试");
                break self.finish(&mut flow).await?;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            // 会话可能在等待输入期间创建完成
            if let Some(update) = self.poll_session(&mut session, &mut flow) {
                self.show(&update);
            }

            let result = match ConsoleCommand::parse(line) {
                ConsoleCommand::End => flow.end_interview().await,
                ConsoleCommand::Retry if session.can_retry() => {
                    println!("🔄 세션을 다시 생성하는 중...");
                    self.spawn_session(&mut session);
                    continue;
                }
                ConsoleCommand::Retry => flow.retry_question().await,
                ConsoleCommand::Voice("") => {
                    println!("⚠️ 사용법: {} <파일>", VOICE_COMMAND);
                    continue;
                }
                ConsoleCommand::Voice(path) => flow.submit_speech_file(Path::new(path)).await,
                ConsoleCommand::Answer(text) => flow.submit_text(text).await,
            };

            let update = match result {
                Ok(update) => update,
                Err(rejection) => {
                    println!("⚠️ {}", rejection);
                    continue;
                }
            };
            self.show(&update);
            show_progress(&flow, &update);

            if let Some(outcome) = update.outcome {
                break outcome;
            }
            if update.questions_exhausted() {
                self.countdown().await;
                break self.finish(&mut flow).await?;
            }
        };

        self.show_leaderboard(&outcome).await;
        info!("\n日志已保存至: {}", self.config.output_log_file);
        Ok(())
    }

    fn spawn_session(&self, slot: &mut SessionSlot) {
        let (tx, rx) = oneshot::channel();
        let backend = self.backend.clone();
        let request = slot.request.clone();
        tokio::spawn(async move {
            let result = backend.create_session(request).await;
            let _ = tx.send(result);
        });
        slot.attach(rx);
    }

    /// 会话创建完成后绑定到流程
    fn poll_session(&self, slot: &mut SessionSlot, flow: &mut InterviewFlow) -> Option<FlowUpdate> {
        match slot.poll() {
            SessionPoll::Ready(session) => {
                info!(
                    "✓ 会话就绪: {} (题目 {} 道)",
                    session.id,
                    session.questions.len()
                );
                Some(flow.bind_session(session.id))
            }
            SessionPoll::Failed(e) => {
                error!("❌ 创建会话失败: {}", e);
                println!(
                    "⚠️ 세션 생성에 실패했습니다: {}\n   {} 로 다시 시도하거나 {} 로 면접을 종료하세요.",
                    e, RETRY_COMMAND, END_COMMAND
                );
                None
            }
            SessionPoll::Lost => {
                error!("❌ 会话创建任务意外退出");
                println!(
                    "⚠️ 세션 생성이 중단되었습니다. {} 로 다시 시도하거나 {} 로 면접을 종료하세요.",
                    RETRY_COMMAND, END_COMMAND
                );
                None
            }
            SessionPoll::Idle | SessionPoll::Pending => None,
        }
    }

    async fn finish(&self, flow: &mut InterviewFlow) -> Result<InterviewOutcome> {
        if let Some(outcome) = flow.controller().outcome() {
            return Ok(outcome.clone());
        }
        let update = flow.end_interview().await?;
        self.show(&update);
        match update.outcome {
            Some(outcome) => Ok(outcome),
            None => bail!("面试没有正常结束"),
        }
    }

    async fn countdown(&self) {
        for remaining in (1..=self.config.end_countdown_secs).rev() {
            println!("⏳ {}초 후 면접이 종료됩니다...", remaining);
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }

    /// 打印并写入日志文件
    fn show(&self, update: &FlowUpdate) {
        for message in &update.messages {
            println!("{}", message);
        }
        for notice in &update.notices {
            println!("💬 {}", notice);
        }
        for err in &update.errors {
            println!("⚠️ {}", err);
        }
        if let Err(e) = logging::append_transcript(&self.config.output_log_file, &update.messages) {
            warn!("写入日志失败: {}", e);
        }
    }

    async fn show_leaderboard(&self, outcome: &InterviewOutcome) {
        let board = match &outcome.session_id {
            Some(session_id) => match self.backend.fineval(session_id).await {
                Ok(response) => Leaderboard::from_fineval(&response),
                Err(e) => {
                    warn!("获取最终结果失败，使用面试记录: {}", e);
                    Leaderboard::from_outcome(outcome)
                }
            },
            None => Leaderboard::from_outcome(outcome),
        };
        println!("{}", board.render(true));
    }
}

/// 新题目出现时显示进度
fn show_progress(flow: &InterviewFlow, update: &FlowUpdate) {
    if !matches!(update.state, TurnState::AwaitingAnswer(_)) || update.messages.is_empty() {
        return;
    }
    if let Some(question) = flow.controller().current_question() {
        let total = flow
            .controller()
            .total_questions()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!("📝 질문 {}/{}", question.index, total);
    }
}

// ========== 输入辅助函数 ==========

async fn read_interview_info(input: &mut Lines<BufReader<Stdin>>) -> Result<InterviewInfo> {
    let user_name = prompt(input, "🙍 이름").await?;
    let company_name = prompt(input, "🏢 회사").await?;
    let job_title = prompt(input, "💼 직무").await?;

    let resume_path = loop {
        let path = PathBuf::from(prompt(input, "📄 이력서 PDF 경로").await?);
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf {
            break path;
        }
        println!("⚠️ PDF 파일만 업로드할 수 있습니다.");
    };

    Ok(InterviewInfo {
        user_name,
        company_name,
        job_title,
        resume_path,
    })
}

/// 读取一行非空输入
async fn prompt(input: &mut Lines<BufReader<Stdin>>, label: &str) -> Result<String> {
    loop {
        println!("{}: ", label);
        let Some(line) = input.next_line().await? else {
            bail!("输入已结束 ({})", label);
        };
        let line = line.trim();
        if !line.is_empty() {
            return Ok(line.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionId;

    fn request() -> ResumeFullRequest {
        ResumeFullRequest {
            user_name: "홍길동".to_string(),
            company_name: "네이버".to_string(),
            jd_name: "Back-end".to_string(),
            resume_text: "마스킹된 이력서".to_string(),
        }
    }

    fn session() -> InterviewSession {
        InterviewSession {
            id: SessionId::new("56"),
            company_name: "네이버".to_string(),
            job_title: "Back-end".to_string(),
            user_name: "홍길동".to_string(),
            masked_resume: "마스킹된 이력서".to_string(),
            questions: Vec::new(),
            summaries: Vec::new(),
            pairs: Vec::new(),
        }
    }

    #[test]
    fn test_parse_console_commands() {
        assert_eq!(ConsoleCommand::parse("/end"), ConsoleCommand::End);
        assert_eq!(ConsoleCommand::parse(" /retry "), ConsoleCommand::Retry);
        assert_eq!(
            ConsoleCommand::parse("/voice  answer 1.webm "),
            ConsoleCommand::Voice("answer 1.webm")
        );
        assert_eq!(ConsoleCommand::parse("/voice"), ConsoleCommand::Voice(""));
        assert_eq!(
            ConsoleCommand::parse("/voicefoo.webm"),
            ConsoleCommand::Answer("/voicefoo.webm")
        );
        assert_eq!(
            ConsoleCommand::parse("/end 이라고 말하면 안 되나요"),
            ConsoleCommand::Answer("/end 이라고 말하면 안 되나요")
        );
        assert_eq!(
            ConsoleCommand::parse("STAR 구조로 답변합니다"),
            ConsoleCommand::Answer("STAR 구조로 답변합니다")
        );
    }

    #[test]
    fn test_failed_session_creation_can_be_retried() {
        let mut slot = SessionSlot::new(request());
        assert!(matches!(slot.poll(), SessionPoll::Idle));

        let (tx, rx) = oneshot::channel();
        slot.attach(rx);
        assert!(matches!(slot.poll(), SessionPoll::Pending));
        assert!(!slot.can_retry());

        let _ = tx.send(Err(AppError::bad_response("resume/full", 500, None)));
        assert!(matches!(slot.poll(), SessionPoll::Failed(_)));
        assert!(slot.can_retry());

        let (tx, rx) = oneshot::channel();
        slot.attach(rx);
        assert!(!slot.can_retry());

        let _ = tx.send(Ok(session()));
        match slot.poll() {
            SessionPoll::Ready(session) => assert_eq!(session.id.as_str(), "56"),
            _ => panic!("session should be ready"),
        }
        assert!(!slot.can_retry());
        assert!(matches!(slot.poll(), SessionPoll::Idle));
    }

    #[test]
    fn test_dropped_session_task_can_be_retried() {
        let mut slot = SessionSlot::new(request());
        let (tx, rx) = oneshot::channel::<AppResult<InterviewSession>>();
        slot.attach(rx);
        drop(tx);

        assert!(matches!(slot.poll(), SessionPoll::Lost));
        assert!(slot.can_retry());
    }
}
