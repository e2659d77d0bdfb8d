//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一场面试的生命周期，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `console_app` - 控制台面试应用
//! - 管理应用生命周期（初始化、运行、结果页）
//! - 持有唯一的 `HttpBackend`
//! - 后台创建会话并在就绪后绑定
//! - 读取控制台输入，打印对话和结果页
//!
//! ## 层次关系
//!
//! ```text
//! console_app (一场面试)
//!     ↓
//! workflow::InterviewFlow (驱动 TurnController)
//!     ↓
//! services (能力层：resume / question / evaluation / stt)
//!     ↓
//! infrastructure (基础设施：HttpExecutor / Clock)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源隔离**：只有编排层持有 HttpBackend
//! 2. **向下依赖**：编排层 → workflow → services → infrastructure
//! 3. **无业务逻辑**：只做调度和展示，状态转换都在 TurnController

pub mod console_app;

// 重新导出主要类型
pub use console_app::App;
