//! # Interview Client
//!
//! AI 模拟面试客户端核心
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（HTTP Client、时钟），只暴露能力
//! - `HttpExecutor` - 唯一的 Client owner，提供 get_json / post_json / post_multipart
//! - `Clock` - 当前时间来源，测试中可替换
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，每个服务对应一组后端接口
//! - `ResumeService` - 简历脱敏、创建会话
//! - `QuestionService` - 按题号取题，越界归一为"题目结束"
//! - `EvaluationService` - 答题评价、结束面试、最终结果
//! - `SttService` - 语音转文字
//! - `InterviewBackend` - 流程层依赖的后端接口，`HttpBackend` 为其 HTTP 实现
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一场面试"的状态机
//! - `SessionCtx` - 上下文封装（session_id + 公司 + 岗位）
//! - `TurnController` - 无 IO 的状态机，产出副作用描述
//! - `InterviewFlow` - 执行请求并把结果交回状态机
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/console_app` - 控制台面试应用，管理资源和生命周期
//!
//! ### 报告（Report）
//! - `report/section_parser` - 把评价报告切成 점수 요약 / 종합 피드백 / 핵심 개선 액션
//! - `report/leaderboard` - 结果页
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod report;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, InterviewError};
pub use infrastructure::{Clock, HttpExecutor, SystemClock};
pub use orchestrator::App;
pub use report::{split_report_sections, Leaderboard, ReportSections};
pub use services::{HttpBackend, InterviewBackend};
pub use workflow::{FlowUpdate, InterviewFlow, SessionCtx, TurnController, TurnState};
