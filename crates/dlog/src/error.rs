//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中定义编码、写出、初始化与配置阶段的全部失败路径；
//! - 日志器把这些错误路由到旁路错误输出，因此每个变体的 `Display` 都应是一行可读文本。
//!
//! ## 设计要求（What）
//! - 底层 I/O 错误透明透传（`#[error(transparent)]`），不做二次包装；
//! - 不完整写入单独成一类，并携带实际与期望字节数；
//! - 自描述对象回调的错误原样保存在 [`Error::Marshal`] 中。

use std::io;

use thiserror::Error;

/// 自描述对象（[`LogMarshaler`](crate::LogMarshaler)）回调返回的错误。
///
/// 回调由使用方实现，错误类型无法预先枚举，因此以装箱的动态错误承载。
pub type MarshalError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// `dlog` 的统一结果类型。
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// 日志核心错误域。
#[derive(Debug, Error)]
pub enum Error {
    /// 写入端报告的字节数少于完整日志行。
    #[error("incomplete write: only wrote {written} of {expected} bytes")]
    IncompleteWrite { written: usize, expected: usize },

    /// 底层写入 / 同步失败，原样透传。
    #[error(transparent)]
    Io(#[from] io::Error),

    /// 自描述对象在 `marshal_log` 中返回了错误；日志行仍会写出。
    #[error("log marshaler failed: {0}")]
    Marshal(#[source] MarshalError),

    /// 自定义时间布局包含无法识别的格式说明符。
    #[error("invalid time layout `{layout}`")]
    TimeFormat { layout: String },

    /// 默认日志器只能初始化一次。
    #[error("default logger is already initialized")]
    AlreadyInitialized,

    /// 无法识别的级别名称。
    #[error("invalid log level `{0}`")]
    InvalidLevel(String),

    /// 配置语义错误（例如输出目标为空）。
    #[error("invalid logger configuration: {0}")]
    Config(String),

    /// 配置文本无法解析。
    #[error("failed to parse logger configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
