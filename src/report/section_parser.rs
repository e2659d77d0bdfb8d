//! 评价报告章节切分
//!
//! 报告是类 markdown 的自由文本，章节标题写法并不统一：
//! `## 점수 요약`、`[종합 피드백]`、`**Key Improvement Actions:**` 都算同一个标题。
//! 所有标题规则集中在 [`HEADER_RULES`]，由同一个边界查找算法处理。

use once_cell::sync::Lazy;
use regex::Regex;

/// 报告章节类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    /// 점수 요약
    ScoreSummary,
    /// 종합 피드백
    Feedback,
    /// 핵심 개선 액션
    ActionItems,
}

impl SectionKind {
    pub const ALL: [SectionKind; 3] = [
        SectionKind::ScoreSummary,
        SectionKind::Feedback,
        SectionKind::ActionItems,
    ];

    /// 重建 markdown 时使用的默认标题
    pub fn default_header(self) -> &'static str {
        match self {
            SectionKind::ScoreSummary => "## 점수 요약",
            SectionKind::Feedback => "## 종합 피드백",
            SectionKind::ActionItems => "## 핵심 개선 액션",
        }
    }
}

struct HeaderRule {
    kind: SectionKind,
    labels: &'static [&'static str],
}

/// 标题规则，标签不区分大小写，词之间的空白可有可无
const HEADER_RULES: &[HeaderRule] = &[
    HeaderRule {
        kind: SectionKind::ScoreSummary,
        labels: &["점수 요약", "score summary"],
    },
    HeaderRule {
        kind: SectionKind::Feedback,
        labels: &["종합 피드백", "comprehensive feedback", "overall feedback"],
    },
    HeaderRule {
        kind: SectionKind::ActionItems,
        labels: &[
            "핵심 개선 액션",
            "개선 액션",
            "key improvement actions",
            "action items",
        ],
    },
];

static HEADER_PATTERNS: Lazy<Vec<(SectionKind, Regex)>> = Lazy::new(|| {
    HEADER_RULES
        .iter()
        .map(|rule| (rule.kind, build_header_pattern(rule.labels)))
        .collect()
});

static EXCESS_NEWLINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("newline pattern is valid"));

/// 整行标题：可选的 `#` 前缀、可选的强调/括号包裹、可选的冒号
fn build_header_pattern(labels: &[&str]) -> Regex {
    let alternatives = labels
        .iter()
        .map(|label| {
            label
                .split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"[ \t]*")
        })
        .collect::<Vec<_>>()
        .join("|");

    let pattern = format!(
        r"(?im)^[ \t]*(?:#{{1,6}}[ \t]*)?[*_\[【(<]*[ \t]*(?:{})[ \t]*[*_\]】)>]*[ \t]*:?[ \t]*[*_]*[ \t]*$",
        alternatives
    );
    Regex::new(&pattern).expect("header pattern is valid")
}

/// 单个章节：标题行 + 正文
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub header: String,
    pub body: String,
}

impl Section {
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// 切分结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportSections {
    /// 第一个标题之前的文本
    pub preamble: String,
    pub score_summary: Section,
    pub feedback: Section,
    pub action_items: Section,
}

impl ReportSections {
    pub fn get(&self, kind: SectionKind) -> &Section {
        match kind {
            SectionKind::ScoreSummary => &self.score_summary,
            SectionKind::Feedback => &self.feedback,
            SectionKind::ActionItems => &self.action_items,
        }
    }

    fn get_mut(&mut self, kind: SectionKind) -> &mut Section {
        match kind {
            SectionKind::ScoreSummary => &mut self.score_summary,
            SectionKind::Feedback => &mut self.feedback,
            SectionKind::ActionItems => &mut self.action_items,
        }
    }

    /// 所有章节和前言都为空
    pub fn is_empty(&self) -> bool {
        self.preamble.is_empty() && SectionKind::ALL.iter().all(|k| self.get(*k).is_empty())
    }

    /// 旧数据里改进建议单独给出、没有标题，补上默认标题
    pub fn with_action_items(mut self, body: &str) -> Self {
        self.action_items.body = normalize_body(body);
        self.synthesize_missing_headers();
        self
    }

    fn synthesize_missing_headers(&mut self) {
        for kind in SectionKind::ALL {
            let section = self.get_mut(kind);
            if !section.body.is_empty() && section.header.is_empty() {
                section.header = kind.default_header().to_string();
            }
        }
    }

    /// 按固定顺序重建 `标题 + 正文` 文本
    pub fn to_markdown(&self) -> String {
        let mut parts = Vec::new();
        if !self.preamble.is_empty() {
            parts.push(self.preamble.clone());
        }
        for kind in SectionKind::ALL {
            let section = self.get(kind);
            if section.is_empty() {
                continue;
            }
            let header = if section.header.is_empty() {
                kind.default_header()
            } else {
                section.header.as_str()
            };
            parts.push(format!("{}\n{}", header, section.body));
        }
        parts.join("\n\n")
    }
}

/// 正文归一化：去掉 `\r`，3 个以上连续换行压成 2 个，去掉首尾空白
pub fn normalize_body(text: &str) -> String {
    let text = text.replace('\r', "");
    EXCESS_NEWLINES
        .replace_all(&text, "\n\n")
        .trim()
        .to_string()
}

struct HeaderMatch {
    kind: SectionKind,
    start: usize,
    end: usize,
}

/// 把评价报告切成 점수 요약 / 종합 피드백 / 핵심 개선 액션 三个章节
///
/// 缺少的章节为空，不会报错；同一标题出现多次时正文按顺序拼接。
pub fn split_report_sections(report: Option<&str>) -> ReportSections {
    let mut sections = ReportSections::default();
    let Some(raw) = report else {
        return sections;
    };
    let text = raw.replace('\r', "");

    let mut headers: Vec<HeaderMatch> = HEADER_PATTERNS
        .iter()
        .flat_map(|(kind, pattern)| {
            pattern.find_iter(&text).map(move |m| HeaderMatch {
                kind: *kind,
                start: m.start(),
                end: m.end(),
            })
        })
        .collect();
    headers.sort_by_key(|h| h.start);

    let first_start = headers.first().map_or(text.len(), |h| h.start);
    sections.preamble = normalize_body(&text[..first_start]);

    for (i, header) in headers.iter().enumerate() {
        let body_end = headers.get(i + 1).map_or(text.len(), |next| next.start);
        let body = normalize_body(&text[header.end..body_end]);
        let section = sections.get_mut(header.kind);

        if section.header.is_empty() {
            section.header = text[header.start..header.end].trim().to_string();
            section.body = body;
        } else if !body.is_empty() {
            if !section.body.is_empty() {
                section.body.push_str("\n\n");
            }
            section.body.push_str(&body);
        }
    }

    sections.synthesize_missing_headers();
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_style_report() {
        let sections = split_report_sections(Some("## 점수 요약\n85점\n## 종합 피드백\nGood job"));

        assert_eq!(sections.score_summary.body, "85점");
        assert_eq!(sections.feedback.body, "Good job");
        assert_eq!(sections.action_items.body, "");
        assert_eq!(sections.score_summary.header, "## 점수 요약");
    }

    #[test]
    fn test_none_and_empty_input() {
        assert!(split_report_sections(None).is_empty());
        assert!(split_report_sections(Some("")).is_empty());
        assert!(split_report_sections(Some("  \r\n ")).is_empty());
    }

    #[test]
    fn test_no_headers_keeps_text_as_preamble() {
        let sections = split_report_sections(Some("전반적으로 무난한 답변입니다."));
        assert_eq!(sections.preamble, "전반적으로 무난한 답변입니다.");
        assert!(sections.score_summary.is_empty());
        assert!(sections.feedback.is_empty());
    }

    #[test]
    fn test_alternate_header_punctuation() {
        let report = "[점수 요약]\n70점\n\n**종합피드백**\n구조가 좋습니다.\n\n### Key Improvement Actions:\n- 수치 제시\n- 결과 강조";
        let sections = split_report_sections(Some(report));

        assert_eq!(sections.score_summary.body, "70점");
        assert_eq!(sections.feedback.body, "구조가 좋습니다.");
        assert_eq!(sections.action_items.body, "- 수치 제시\n- 결과 강조");
        assert_eq!(sections.action_items.header, "### Key Improvement Actions:");
    }

    #[test]
    fn test_header_ordering_does_not_matter() {
        let forward = split_report_sections(Some("## 점수 요약\n90점\n## 종합 피드백\n명확합니다"));
        let reversed = split_report_sections(Some("## 종합 피드백\n명확합니다\n## 점수 요약\n90점"));

        assert_eq!(forward.score_summary.body, reversed.score_summary.body);
        assert_eq!(forward.feedback.body, reversed.feedback.body);
    }

    #[test]
    fn test_body_normalization() {
        let report = "## 종합 피드백\r\n\r\n  첫 문단\r\n\r\n\r\n\r\n둘째 문단  \r\n\r\n";
        let sections = split_report_sections(Some(report));
        assert_eq!(sections.feedback.body, "첫 문단\n\n둘째 문단");
    }

    #[test]
    fn test_inline_label_is_not_a_header() {
        let report = "## 종합 피드백\n점수 요약은 따로 드리지 않습니다.";
        let sections = split_report_sections(Some(report));
        assert_eq!(sections.feedback.body, "점수 요약은 따로 드리지 않습니다.");
        assert!(sections.score_summary.is_empty());
    }

    #[test]
    fn test_repeated_header_bodies_are_joined() {
        let report = "## 종합 피드백\n첫째\n## 점수 요약\n60점\n## 종합 피드백\n둘째";
        let sections = split_report_sections(Some(report));
        assert_eq!(sections.feedback.body, "첫째\n\n둘째");
        assert_eq!(sections.score_summary.body, "60점");
    }

    #[test]
    fn test_reparse_is_idempotent() {
        let report = "면접 총평\n\n\n\n**Score Summary**\n  75점  \n\n【종합 피드백】\n근거가 부족합니다.\n\n\n\n개선 액션:\n1. STAR 구조 사용";
        let first = split_report_sections(Some(report));
        let second = split_report_sections(Some(&first.to_markdown()));
        let third = split_report_sections(Some(&second.to_markdown()));

        assert_eq!(first.preamble, "면접 총평");
        for kind in SectionKind::ALL {
            assert_eq!(first.get(kind).body, second.get(kind).body);
            assert_eq!(second.get(kind), third.get(kind));
        }
        assert_eq!(second.preamble, first.preamble);
    }

    #[test]
    fn test_action_items_without_header_get_default() {
        let sections = split_report_sections(Some("## 점수 요약\n80점"))
            .with_action_items("1. 결과를 수치로\n\n\n\n2. 역할을 명확히");

        assert_eq!(sections.action_items.header, "## 핵심 개선 액션");
        assert_eq!(sections.action_items.body, "1. 결과를 수치로\n\n2. 역할을 명확히");
        let reparsed = split_report_sections(Some(&sections.to_markdown()));
        assert_eq!(reparsed.action_items.body, sections.action_items.body);
        assert_eq!(reparsed.score_summary.body, "80점");
    }
}
