use std::{fmt, sync::Arc, time::Duration};

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;

/// 抽象可注入的时钟，为每条日志提供挂钟时间戳。
///
/// # 设计背景（Why）
/// - 行格式中的时间戳直接取自系统时间，若不可替换，端到端测试无法断言整行输出；
/// - 通过 trait 注入，生产环境使用 [`SystemClock`]，测试中使用 [`MockClock`] 固定时间点。
///
/// # 接口约束（What）
/// - `now`：返回 UTC 时间；不要求单调，系统时间回拨会如实反映在日志中。
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// 系统挂钟。
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 虚拟时钟：时间只在显式调用 [`MockClock::set`] / [`MockClock::advance`] 时变化。
///
/// 克隆体共享同一时间点，便于测试一边持有句柄推进时间，一边把时钟交给日志器。
#[derive(Clone)]
pub struct MockClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock() = at;
    }

    /// 推进虚拟时间；溢出可表示范围时保持原值。
    pub fn advance(&self, delta: Duration) {
        let Ok(delta) = TimeDelta::from_std(delta) else {
            return;
        };
        let mut guard = self.now.lock();
        if let Some(next) = guard.checked_add_signed(delta) {
            *guard = next;
        }
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

impl fmt::Debug for MockClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockClock").field("now", &self.now()).finish()
    }
}
