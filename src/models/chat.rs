use std::fmt;

/// 消息发送方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    /// 面试官（机器人）
    Interviewer,
    /// 候选人
    Candidate,
}

/// 对话框中的一条消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub speaker: Speaker,
    pub text: String,
}

impl ChatMessage {
    pub fn interviewer(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Interviewer,
            text: text.into(),
        }
    }

    pub fn candidate(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Candidate,
            text: text.into(),
        }
    }
}

impl fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.speaker {
            Speaker::Interviewer => "🤖 면접관",
            Speaker::Candidate => "🙍 나",
        };
        write!(f, "{}: {}", label, self.text)
    }
}
