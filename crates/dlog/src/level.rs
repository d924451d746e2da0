//! 日志级别与共享级别闸门。
//!
//! # 设计缘起（Why）
//! - 级别是一个可比较的整数：六个标准级别之外，调用方可以使用任意自定义整数；
//! - 所有从同一根日志器派生出的子日志器必须看到同一个阈值，调整一次全树生效。
//!
//! # 总体结构（How）
//! - [`Level`]：`i32` 新类型，提供六个标准常量、名称解析与单字符标签；
//! - [`LevelGate`]：`Arc<AtomicI32>` 包装，共享关系直接体现在类型上，而非依赖值拷贝的巧合。
//!
//! # 契约约束（What）
//! - `set_level` 为 `Release` 写，`level` 为 `Acquire` 读；
//! - 级别检查与后续字段编码之间不提供额外顺序保证。

use std::{fmt, str::FromStr, sync::Arc};

#[cfg(not(loom))]
use std::sync::atomic::{AtomicI32, Ordering};
#[cfg(loom)]
use loom::sync::atomic::{AtomicI32, Ordering};

use serde::Deserialize;

use crate::error::Error;

/// 日志级别。数值越大越严重，调用级别 `>=` 阈值时才输出。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "LevelRepr")]
pub struct Level(i32);

impl Level {
    pub const DEBUG: Level = Level(-1);
    pub const INFO: Level = Level(0);
    pub const WARN: Level = Level(1);
    pub const ERROR: Level = Level(2);
    /// 输出后触发 panic。
    pub const PANIC: Level = Level(3);
    /// 输出后终止进程。
    pub const FATAL: Level = Level(4);

    /// 六个标准级别，按严重度升序。
    pub const STANDARD: [Level; 6] = [
        Level::DEBUG,
        Level::INFO,
        Level::WARN,
        Level::ERROR,
        Level::PANIC,
        Level::FATAL,
    ];

    /// 以任意整数构造级别，用于自定义级别。
    pub const fn new(value: i32) -> Self {
        Level(value)
    }

    /// 级别的整数值。
    pub const fn get(self) -> i32 {
        self.0
    }

    /// 行格式中的单字符标签；非标准级别返回 `None`，由编码器渲染为十进制数值。
    ///
    /// 该映射属于输出格式的一部分，消费端可能依赖它解析日志，不可变更。
    pub const fn tag(self) -> Option<u8> {
        match self {
            Level::DEBUG => Some(b'D'),
            Level::INFO => Some(b'I'),
            Level::WARN => Some(b'W'),
            Level::ERROR => Some(b'E'),
            Level::PANIC => Some(b'P'),
            Level::FATAL => Some(b'F'),
            _ => None,
        }
    }

    /// 标准级别的小写名称。
    pub const fn name(self) -> Option<&'static str> {
        match self {
            Level::DEBUG => Some("debug"),
            Level::INFO => Some("info"),
            Level::WARN => Some("warn"),
            Level::ERROR => Some("error"),
            Level::PANIC => Some("panic"),
            Level::FATAL => Some("fatal"),
            _ => None,
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::INFO
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "Level({})", self.0),
        }
    }
}

impl FromStr for Level {
    type Err = Error;

    /// 接受标准名称（大小写不敏感，`warning` 同 `warn`）或十进制整数。
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let level = match trimmed.to_ascii_lowercase().as_str() {
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" | "warning" => Level::WARN,
            "error" => Level::ERROR,
            "panic" => Level::PANIC,
            "fatal" => Level::FATAL,
            other => other
                .parse::<i32>()
                .map(Level)
                .map_err(|_| Error::InvalidLevel(trimmed.to_owned()))?,
        };
        Ok(level)
    }
}

impl From<i32> for Level {
    fn from(value: i32) -> Self {
        Level(value)
    }
}

/// 配置中的级别既可以写名称，也可以直接写整数。
#[derive(Deserialize)]
#[serde(untagged)]
enum LevelRepr {
    Value(i32),
    Name(String),
}

impl TryFrom<LevelRepr> for Level {
    type Error = Error;

    fn try_from(repr: LevelRepr) -> Result<Self, Self::Error> {
        match repr {
            LevelRepr::Value(value) => Ok(Level(value)),
            LevelRepr::Name(name) => name.parse(),
        }
    }
}

/// 共享级别闸门。
///
/// # 设计目标（Why）
/// - 日志器克隆、派生子日志器时都只复制 `Arc`，阈值单元格在物理上只有一份；
/// - 读取路径只有一次原子加载，适合放在每次日志调用的最前面。
///
/// # 合约说明（What）
/// - [`LevelGate::set_level`]：`Release` 存储，随后任何持有同一闸门的线程以 `Acquire` 读到新值；
/// - [`LevelGate::enabled`]：`level >= 当前阈值` 时返回 `true`。
#[derive(Clone, Debug)]
pub struct LevelGate {
    cell: Arc<AtomicI32>,
}

impl LevelGate {
    pub fn new(level: Level) -> Self {
        Self {
            cell: Arc::new(AtomicI32::new(level.get())),
        }
    }

    pub fn level(&self) -> Level {
        Level(self.cell.load(Ordering::Acquire))
    }

    pub fn set_level(&self, level: Level) {
        self.cell.store(level.get(), Ordering::Release);
    }

    #[inline]
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level()
    }

    /// 两个闸门是否共享同一单元格。
    pub fn shares_cell_with(&self, other: &LevelGate) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl Default for LevelGate {
    fn default() -> Self {
        Self::new(Level::default())
    }
}
