//! 结果页（리더보드）
//!
//! 数据有两个来源：面试结束时 `end_interview` 返回的记录，
//! 或者直接用 session_id 调 `fineval` 拿到的最终结果。

use std::fmt::Write as _;

use super::section_parser::{ReportSections, SectionKind};
use crate::models::evaluation::format_score;
use crate::models::{EvaluationPayload, FinevalResponse, InterviewOutcome};
use crate::utils::{first_line, truncate_text};

/// 一道题的结果行
#[derive(Debug, Clone)]
pub struct LeaderboardRow {
    /// 序号（从1开始）
    pub number: usize,
    pub question: String,
    pub answer: String,
    pub evaluation: Option<EvaluationPayload>,
    pub final_score: Option<f64>,
    /// 报告第一行，列表里当作摘要显示
    pub report_first_line: String,
    pub sections: ReportSections,
    pub elapsed_seconds: Option<u32>,
}

impl LeaderboardRow {
    fn new(
        number: usize,
        question: Option<&str>,
        answer: Option<&str>,
        evaluation: Option<EvaluationPayload>,
        elapsed_seconds: Option<u32>,
    ) -> Self {
        let question = question
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or("(질문 없음)")
            .to_string();
        let report_first_line = evaluation
            .as_ref()
            .and_then(|e| e.report_text())
            .map(|r| first_line(r.trim()).to_string())
            .unwrap_or_default();
        let sections = evaluation
            .as_ref()
            .map(EvaluationPayload::sections)
            .unwrap_or_default();

        Self {
            number,
            question,
            answer: answer.unwrap_or_default().to_string(),
            final_score: evaluation.as_ref().and_then(EvaluationPayload::final_score),
            evaluation,
            report_first_line,
            sections,
            elapsed_seconds,
        }
    }
}

/// 结果页数据
#[derive(Debug, Clone, Default)]
pub struct Leaderboard {
    pub company_name: String,
    pub job_title: String,
    pub user_name: Option<String>,
    pub answered: Option<usize>,
    pub total_questions: Option<usize>,
    pub rows: Vec<LeaderboardRow>,
    /// 没有会话、或者结束面试失败时的说明
    pub notice: Option<String>,
}

impl Leaderboard {
    /// 从面试结束时的记录构建
    pub fn from_outcome(outcome: &InterviewOutcome) -> Self {
        let rows = outcome
            .interview_log
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                LeaderboardRow::new(
                    i + 1,
                    Some(entry.question.as_str()),
                    entry.answer.as_deref(),
                    entry.evaluation.clone(),
                    entry.time_in_seconds,
                )
            })
            .collect::<Vec<_>>();

        let answered = rows.iter().filter(|r| !r.answer.trim().is_empty()).count();

        Self {
            company_name: outcome.company_name.clone(),
            job_title: outcome.job_title.clone(),
            user_name: None,
            answered: Some(answered),
            total_questions: Some(rows.len()),
            rows,
            notice: outcome.error.clone().or_else(|| outcome.note.clone()),
        }
    }

    /// 从 `fineval` 结果构建
    pub fn from_fineval(response: &FinevalResponse) -> Self {
        let rows = response
            .results
            .iter()
            .enumerate()
            .map(|(i, result)| {
                LeaderboardRow::new(
                    i + 1,
                    result.question_content.as_deref(),
                    result.answer_content.as_deref(),
                    result.evaluation_content.clone(),
                    None,
                )
            })
            .collect();

        Self {
            company_name: response.session.company_name.clone(),
            job_title: response.session.jd_name.clone(),
            user_name: Some(response.session.user_name.clone()).filter(|n| !n.is_empty()),
            answered: response.counts.map(|c| c.answered),
            total_questions: response.counts.map(|c| c.total_questions),
            rows,
            notice: None,
        }
    }

    /// 平均分（只统计有分数的题目）
    pub fn average_score(&self) -> Option<f64> {
        let scores: Vec<f64> = self.rows.iter().filter_map(|r| r.final_score).collect();
        if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        }
    }

    /// 渲染成控制台文本
    pub fn render(&self, detailed: bool) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", "=".repeat(60));
        let _ = writeln!(out, "리더보드");
        let _ = writeln!(out, "🏢 {} / {}", self.company_name, self.job_title);
        if let Some(user) = &self.user_name {
            let _ = writeln!(out, "🙍 {}", user);
        }
        if let (Some(answered), Some(total)) = (self.answered, self.total_questions) {
            let _ = writeln!(out, "{}/{} 답변 완료", answered, total);
        }
        if let Some(avg) = self.average_score() {
            let _ = writeln!(out, "평균 점수: {}점", format_score(avg));
        }
        if let Some(notice) = &self.notice {
            let _ = writeln!(out, "⚠️ {}", notice);
        }
        let _ = writeln!(out, "{}", "=".repeat(60));

        if self.rows.is_empty() {
            let _ = writeln!(out, "표시할 결과가 없습니다.");
            return out;
        }

        for row in &self.rows {
            let score = row
                .final_score
                .map(format_score)
                .unwrap_or_else(|| "-".to_string());
            let summary = if row.report_first_line.is_empty() {
                "전체 평가/답변 보기"
            } else {
                row.report_first_line.as_str()
            };
            let _ = writeln!(
                out,
                "Q{}. {} | {}점 | {}",
                row.number,
                truncate_text(&row.question, 40),
                score,
                truncate_text(summary, 40)
            );

            if detailed {
                render_row_detail(&mut out, row);
            }
        }
        out
    }
}

fn render_row_detail(out: &mut String, row: &LeaderboardRow) {
    let _ = writeln!(out, "  🗣️ 내 답변");
    let answer = if row.answer.trim().is_empty() {
        "(답변 없음)"
    } else {
        row.answer.as_str()
    };
    let _ = writeln!(out, "    {}", answer);

    let _ = writeln!(out, "  📊 세부 평가");
    match row.evaluation.as_ref().and_then(EvaluationPayload::sub_scores) {
        Some(subs) => {
            for (label, sub) in subs.labeled() {
                let score = sub
                    .and_then(|s| s.score)
                    .map(format_score)
                    .unwrap_or_else(|| "-".to_string());
                let comment = sub.and_then(|s| s.evaluation.as_deref()).unwrap_or_default();
                let _ = writeln!(out, "    {:<8} {}점 - {}", label, score, comment);
            }
        }
        None => {
            let _ = writeln!(out, "    세부 평가 없음");
        }
    }

    let _ = writeln!(out, "  📝 종합 피드백");
    if row.sections.is_empty() {
        let _ = writeln!(out, "    (없음)");
        return;
    }
    if !row.sections.preamble.is_empty() {
        let _ = writeln!(out, "    {}", row.sections.preamble);
    }
    for kind in SectionKind::ALL {
        let section = row.sections.get(kind);
        if !section.is_empty() {
            let _ = writeln!(out, "    {}\n    {}", section.header, section.body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_fineval() -> FinevalResponse {
        serde_json::from_value(json!({
            "session": {
                "session_id": 56,
                "user_name": "홍길동",
                "company_name": "네이버",
                "jd_name": "SMARTSTUDIO Back-end",
                "created_at": "2025-09-01T10:00:00"
            },
            "results": [
                {
                    "question_id": 1,
                    "question_content": "자기소개 해주세요",
                    "similar_jd": null,
                    "answer_content": "백엔드 개발자입니다",
                    "evaluation_content": "{\"final_score\": 80, \"final_report\": \"## 점수 요약\\n80점\\n## 종합 피드백\\n좋습니다\"}"
                },
                {
                    "question_id": 2,
                    "question_content": null,
                    "similar_jd": null,
                    "answer_content": null,
                    "evaluation_content": null
                }
            ],
            "counts": {"total_questions": 5, "answered": 1}
        }))
        .unwrap()
    }

    #[test]
    fn test_rows_from_fineval() {
        let board = Leaderboard::from_fineval(&sample_fineval());

        assert_eq!(board.rows.len(), 2);
        assert_eq!(board.user_name.as_deref(), Some("홍길동"));
        assert_eq!(board.answered, Some(1));
        assert_eq!(board.total_questions, Some(5));

        let first = &board.rows[0];
        assert_eq!(first.final_score, Some(80.0));
        assert_eq!(first.report_first_line, "## 점수 요약");
        assert_eq!(first.sections.feedback.body, "좋습니다");

        let second = &board.rows[1];
        assert_eq!(second.question, "(질문 없음)");
        assert!(second.final_score.is_none());
        assert!(second.sections.is_empty());

        assert_eq!(board.average_score(), Some(80.0));
    }

    #[test]
    fn test_render_mentions_every_row() {
        let text = Leaderboard::from_fineval(&sample_fineval()).render(true);
        assert!(text.contains("Q1. 자기소개 해주세요 | 80점"));
        assert!(text.contains("Q2. (질문 없음) | -점"));
        assert!(text.contains("1/5 답변 완료"));
        assert!(text.contains("(답변 없음)"));
    }

    #[test]
    fn test_empty_outcome_with_note() {
        let outcome = InterviewOutcome {
            company_name: "카카오".to_string(),
            job_title: "iOS".to_string(),
            note: Some("세션 없음".to_string()),
            ..Default::default()
        };
        let board = Leaderboard::from_outcome(&outcome);
        assert!(board.rows.is_empty());
        assert_eq!(board.notice.as_deref(), Some("세션 없음"));
        assert!(board.render(false).contains("표시할 결과가 없습니다."));
    }
}
