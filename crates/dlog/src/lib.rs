//! # dlog
//!
//! ## 模块定位（Why）
//! - 分级结构化日志核心：把一次日志调用（级别、消息、键值字段）变成一行人类可读文本；
//! - 热路径只做一次原子级别检查、两次池化缓冲租借与一次写入调用。
//!
//! ## 结构概览（How）
//! - [`Field`]：带类型的键值对，值的种类是封闭集合；
//! - [`KeyValue`] / [`LogMarshaler`] / [`Encoder`]：编码契约，[`TextEncoder`] 为文本实现；
//! - [`WriteSyncer`] / [`LockedWriteSyncer`]：带同步能力的写入端与其带锁共享版本；
//! - [`LevelGate`]：整棵日志器树共享的原子阈值；
//! - [`Logger`] / [`Meta`]：日志器及其配置核心，[`SyncTask`] 负责周期同步；
//! - [`init`] / [`default_logger`] / [`info`] 等：进程级默认日志器。
//!
//! ## 行格式（What）
//! ```text
//! [I] 2024-01-01T00:00:00Z [main.rs:42] reqprice: key=apple price=100
//! ```
//! 时间戳为空时连同前导空格省略；没有上下文字段时末尾不追加空格。
//! 值不做转义，包含空格或 `=` 的值会让按空格切分的解析产生歧义。

pub mod clock;
pub mod config;
pub mod encoder;
pub mod error;
pub mod field;
mod global;
pub mod level;
pub mod logger;
pub mod meta;
pub mod sink;
pub mod sync_task;
pub mod test_support;

pub use clock::{Clock, MockClock, SystemClock};
pub use config::{LoggerConfig, OutputTarget};
pub use encoder::{
    Encoder, KeyValue, LogMarshaler, MarshalFn, TextEncoder, TextOption, TimeFormat,
    text_no_time, text_time_format,
};
pub use error::{Error, MarshalError, Result};
pub use field::{Field, FieldKind, FieldValue, add_fields};
pub use global::{
    FileLogGuard, debug, default_logger, error, fatal, info, init, init_file, panic,
    try_default_logger, warn,
};
pub use level::{Level, LevelGate};
pub use logger::{ExitHook, Logger, LoggerBuilder};
pub use meta::Meta;
pub use sink::{
    FlushSyncer, IntoWriteSyncer, LockedWriteSyncer, NopSyncer, WriteSyncer, add_sync,
};
pub use sync_task::{DEFAULT_SYNC_INTERVAL, SyncTask};

pub use dlog_buffer::{BufferPool, PoolConfig, PoolStats};
