//! 报告层
//!
//! - `section_parser` - 评价报告章节切分
//! - `leaderboard` - 结果页数据与控制台渲染

pub mod leaderboard;
pub mod section_parser;

pub use leaderboard::{Leaderboard, LeaderboardRow};
pub use section_parser::{normalize_body, split_report_sections, ReportSections, Section, SectionKind};
