//! 答题评价相关模型
//!
//! 后端的评价字段形态不固定：可能是对象、JSON 编码后的字符串，或者纯文本报告。
//! 所有形态都在这里归一成 [`EvaluationPayload`]，上层逻辑不再重复解析。

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use super::session::SessionId;
use crate::report::{split_report_sections, ReportSections};

static SCORE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*점").expect("score pattern is valid"));

/// `evaluate_answer` 请求体
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluateAnswerRequest {
    pub session_id: SessionId,
    pub question: String,
    pub answer: String,
    pub time_in_seconds: u32,
}

/// 单项评分
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubScore {
    #[serde(default, deserialize_with = "deserialize_score")]
    pub score: Option<f64>,
    #[serde(default)]
    pub evaluation: Option<String>,
}

/// 四个维度的评分：STAR / 逻辑性 / 岗位匹配 / 作答时长
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubEvaluations {
    #[serde(default)]
    pub star_evaluation: Option<SubScore>,
    #[serde(default)]
    pub logic_evaluation: Option<SubScore>,
    #[serde(default)]
    pub jd_evaluation: Option<SubScore>,
    #[serde(default)]
    pub timing_evaluation: Option<SubScore>,
}

impl SubEvaluations {
    /// 按展示顺序返回 (标签, 评分)
    pub fn labeled(&self) -> [(&'static str, Option<&SubScore>); 4] {
        [
            ("STAR", self.star_evaluation.as_ref()),
            ("논리성", self.logic_evaluation.as_ref()),
            ("JD", self.jd_evaluation.as_ref()),
            ("발화시간", self.timing_evaluation.as_ref()),
        ]
    }
}

/// 结构化评价
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredEvaluation {
    #[serde(default, deserialize_with = "deserialize_score")]
    pub final_score: Option<f64>,
    #[serde(default)]
    pub final_report: Option<String>,
    #[serde(default)]
    pub evaluations: SubEvaluations,
    /// 旧版后端单独返回的改进建议（没有章节标题）
    #[serde(default, alias = "improvement_actions")]
    pub action_items: Option<String>,
}

/// 归一后的评价
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationPayload {
    /// 带分项评分的结构化评价
    Structured(StructuredEvaluation),
    /// 需要再切分章节的自由文本报告
    Report(String),
}

impl EvaluationPayload {
    /// 从任意 JSON 值归一，空值返回 None
    pub fn from_value(value: JsonValue) -> Option<Self> {
        match value {
            JsonValue::Null => None,
            JsonValue::String(text) => Self::from_text(text),
            JsonValue::Object(mut map) => {
                // 外层信封：{ "report_for_current_answer": ... }
                if let Some(inner) = map.remove("report_for_current_answer") {
                    return Self::from_value(inner);
                }
                let looks_structured = map.contains_key("final_score")
                    || map.contains_key("final_report")
                    || map.contains_key("evaluations");
                let object = JsonValue::Object(map);
                if looks_structured {
                    if let Ok(structured) = serde_json::from_value(object.clone()) {
                        return Some(EvaluationPayload::Structured(structured));
                    }
                }
                Some(EvaluationPayload::Report(object.to_string()))
            }
            other => Some(EvaluationPayload::Report(other.to_string())),
        }
    }

    fn from_text(text: String) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.starts_with('{') {
            if let Ok(parsed @ JsonValue::Object(_)) = serde_json::from_str::<JsonValue>(trimmed) {
                return Self::from_value(parsed);
            }
        }
        Some(EvaluationPayload::Report(text))
    }

    /// 需要切分的报告正文
    pub fn report_text(&self) -> Option<&str> {
        match self {
            EvaluationPayload::Structured(s) => s.final_report.as_deref(),
            EvaluationPayload::Report(text) => Some(text),
        }
    }

    pub fn sections(&self) -> ReportSections {
        let sections = split_report_sections(self.report_text());
        match self {
            EvaluationPayload::Structured(StructuredEvaluation {
                action_items: Some(items),
                ..
            }) if sections.action_items.is_empty() && !items.trim().is_empty() => {
                sections.with_action_items(items.as_str())
            }
            _ => sections,
        }
    }

    pub fn sub_scores(&self) -> Option<&SubEvaluations> {
        match self {
            EvaluationPayload::Structured(s) => Some(&s.evaluations),
            EvaluationPayload::Report(_) => None,
        }
    }

    /// 最终得分
    ///
    /// 文本报告没有单独的分数字段，取"점수 요약"章节（没有则全文）里第一个 `N점`。
    pub fn final_score(&self) -> Option<f64> {
        match self {
            EvaluationPayload::Structured(s) => s.final_score,
            EvaluationPayload::Report(text) => {
                let sections = split_report_sections(Some(text));
                let haystack = if sections.score_summary.body.is_empty() {
                    text.as_str()
                } else {
                    sections.score_summary.body.as_str()
                };
                SCORE_PATTERN
                    .captures(haystack)
                    .and_then(|c| c.get(1))
                    .and_then(|m| m.as_str().parse().ok())
            }
        }
    }

    /// 对话框里展示的评价摘要
    pub fn summary_text(&self) -> String {
        match self {
            EvaluationPayload::Report(text) => text.trim().to_string(),
            EvaluationPayload::Structured(s) => {
                let mut lines = Vec::new();
                if let Some(score) = s.final_score {
                    lines.push(format!("최종 점수 {}점", format_score(score)));
                }
                if let Some(report) = s.final_report.as_deref().filter(|r| !r.trim().is_empty()) {
                    lines.push(report.trim().to_string());
                }
                if lines.is_empty() {
                    lines.push("평가 결과가 비어 있습니다.".to_string());
                }
                lines.join("\n")
            }
        }
    }
}

/// 一次答题的评价记录
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRecord {
    pub question: String,
    pub answer: String,
    pub elapsed_seconds: u32,
    pub evaluation: EvaluationPayload,
}

/// `end_interview` 返回的单条面试记录
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InterviewLogEntry {
    #[serde(default, alias = "question_content")]
    pub question: String,
    #[serde(default, alias = "answer_content")]
    pub answer: Option<String>,
    #[serde(
        default,
        alias = "evaluation_content",
        alias = "report",
        deserialize_with = "deserialize_evaluation"
    )]
    pub evaluation: Option<EvaluationPayload>,
    #[serde(
        default,
        alias = "time",
        alias = "response_time",
        deserialize_with = "deserialize_seconds"
    )]
    pub time_in_seconds: Option<u32>,
}

/// `end_interview` 响应
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EndInterviewResponse {
    #[serde(default, alias = "log")]
    pub interview_log: Vec<InterviewLogEntry>,
}

/// 分数保留最多一位小数，整数不带小数点
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{}", score as i64)
    } else {
        format!("{:.1}", score)
    }
}

// ========== 宽松的反序列化辅助函数 ==========

fn score_from_value(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().trim_end_matches('점').trim().parse().ok(),
        _ => None,
    }
}

/// 分数可能是数字、字符串或 "85점"
pub fn deserialize_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(score_from_value))
}

fn deserialize_seconds<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(score_from_value)
        .filter(|s| *s >= 0.0)
        .map(|s| s.round() as u32))
}

/// 评价字段可能是对象、JSON 字符串或纯文本
pub fn deserialize_evaluation<'de, D>(deserializer: D) -> Result<Option<EvaluationPayload>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(value.and_then(EvaluationPayload::from_value))
}
