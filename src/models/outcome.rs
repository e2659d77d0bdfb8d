use super::evaluation::InterviewLogEntry;
use super::session::SessionId;

/// 面试结束后交给结果页的数据
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterviewOutcome {
    pub session_id: Option<SessionId>,
    pub company_name: String,
    pub job_title: String,
    pub interview_log: Vec<InterviewLogEntry>,
    /// 例如"세션 없음"
    pub note: Option<String>,
    /// `end_interview` 失败时的错误文本
    pub error: Option<String>,
}
