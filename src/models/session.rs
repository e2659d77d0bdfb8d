use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// 后端分配的会话 ID
///
/// 后端有时返回字符串、有时返回数字，这里统一保存为字符串。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for SessionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Visitor;

        struct SessionIdVisitor;

        impl<'de> Visitor<'de> for SessionIdVisitor {
            type Value = SessionId;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer session id")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if value.trim().is_empty() {
                    return Err(E::custom("empty session id"));
                }
                Ok(SessionId(value.trim().to_string()))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(SessionId(value.to_string()))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(SessionId(value.to_string()))
            }
        }

        deserializer.deserialize_any(SessionIdVisitor)
    }
}

/// 后端生成的面试题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question_id: i64,
    pub question_content: String,
    #[serde(default)]
    pub similar_jd: Option<String>,
}

/// 简历脱敏结果（`resume/mask`）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskedResume {
    #[serde(default)]
    pub engine: String,
    #[serde(default)]
    pub original_length: usize,
    #[serde(default)]
    pub masked_length: usize,
    pub masked_text: String,
}

/// `resume/full` 请求体
#[derive(Debug, Clone, Serialize)]
pub struct ResumeFullRequest {
    pub user_name: String,
    pub company_name: String,
    pub jd_name: String,
    pub resume_text: String,
}

/// 检索到的匹配片段（JD 或 常见问题）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedChunk {
    #[serde(default)]
    pub dataset: String,
    #[serde(default)]
    pub doc_id: String,
    #[serde(default)]
    pub chunk_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: f64,
}

/// 简历摘要与匹配结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryPair {
    pub summary: String,
    #[serde(default)]
    pub jd: Option<MatchedChunk>,
    #[serde(default)]
    pub faq: Option<MatchedChunk>,
}

/// `resume/full` 响应
#[derive(Debug, Clone, Deserialize)]
pub struct ResumeFullResponse {
    pub session_id: SessionId,
    #[serde(default)]
    pub summaries: Vec<String>,
    #[serde(default)]
    pub pairs: Vec<SummaryPair>,
    #[serde(default)]
    pub questions: Vec<GeneratedQuestion>,
}

/// 一场面试会话
///
/// 提交简历后创建，之后不再修改；回答和评价记录由后端追加。
#[derive(Debug, Clone)]
pub struct InterviewSession {
    pub id: SessionId,
    pub company_name: String,
    pub job_title: String,
    pub user_name: String,
    pub masked_resume: String,
    pub questions: Vec<GeneratedQuestion>,
    pub summaries: Vec<String>,
    pub pairs: Vec<SummaryPair>,
}

impl InterviewSession {
    pub fn from_response(request: ResumeFullRequest, response: ResumeFullResponse) -> Self {
        Self {
            id: response.session_id,
            company_name: request.company_name,
            job_title: request.jd_name,
            user_name: request.user_name,
            masked_resume: request.resume_text,
            questions: response.questions,
            summaries: response.summaries,
            pairs: response.pairs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_accepts_string_and_number() {
        let from_str: SessionId = serde_json::from_str(r#""56""#).unwrap();
        let from_num: SessionId = serde_json::from_str("56").unwrap();
        assert_eq!(from_str, from_num);
        assert_eq!(serde_json::to_string(&from_num).unwrap(), r#""56""#);
        assert!(serde_json::from_str::<SessionId>(r#""  ""#).is_err());
    }

    #[test]
    fn test_resume_full_response_tolerates_missing_optionals() {
        let response: ResumeFullResponse = serde_json::from_str(
            r#"{
                "session_id": 12,
                "questions": [
                    {"question_id": 1, "question_content": "자기소개 해주세요", "similar_jd": null},
                    {"question_id": 2, "question_content": "가장 어려웠던 프로젝트는?"}
                ],
                "pairs": [{"summary": "Android 3년", "jd": null}]
            }"#,
        )
        .unwrap();

        assert_eq!(response.session_id.as_str(), "12");
        assert_eq!(response.questions.len(), 2);
        assert!(response.questions[1].similar_jd.is_none());
        assert!(response.summaries.is_empty());
        assert!(response.pairs[0].faq.is_none());
    }
}
