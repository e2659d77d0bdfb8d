//! 时钟 - 基础设施层
//!
//! 计时（每道题的作答时长）只依赖这个 trait，测试里可以换成手动拨动的时钟。

use chrono::{DateTime, Utc};

/// 当前时间来源
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
