//! 面试会话上下文
//!
//! 封装"谁在面哪家公司的哪个岗位"这一信息

use std::fmt::Display;

use crate::models::SessionId;

/// 面试会话上下文
#[derive(Debug, Clone, Default)]
pub struct SessionCtx {
    /// 后端会话ID（异步创建，绑定前为 None）
    pub session_id: Option<SessionId>,

    pub company_name: String,

    /// 岗位名称（后端字段名为 jd_name）
    pub job_title: String,

    pub user_name: String,
}

impl SessionCtx {
    /// 创建新的会话上下文
    pub fn new(
        company_name: impl Into<String>,
        job_title: impl Into<String>,
        user_name: impl Into<String>,
    ) -> Self {
        Self {
            session_id: None,
            company_name: company_name.into(),
            job_title: job_title.into(),
            user_name: user_name.into(),
        }
    }

    /// 开场白
    pub fn greeting(&self) -> String {
        format!(
            "{}의 {}에 대한 면접을 시작하겠습니다. 간단하게 자기소개 해주세요.",
            self.company_name, self.job_title
        )
    }
}

impl Display for SessionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self
            .session_id
            .as_ref()
            .map(SessionId::as_str)
            .unwrap_or("-");
        write!(
            f,
            "[会话 #{} 公司 {} 岗位 {}]",
            session, self.company_name, self.job_title
        )
    }
}
