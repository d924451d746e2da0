//! 编码器契约：键值接收能力、自描述对象与可克隆的池化编码器。
//!
//! # 模块定位（Why）
//! - 日志器只依赖这里的 trait，不关心具体行格式；[`TextEncoder`] 是目前唯一的实现；
//! - 字段、自描述对象都面向 [`KeyValue`] 编程，嵌套对象与顶层字段走同一条写入路径。
//!
//! # 结构概览（What）
//! - [`KeyValue`]：接收一个带类型的键值对；
//! - [`LogMarshaler`]：自描述对象，回调里向传入的 [`KeyValue`] 写字段；
//! - [`Encoder`]：在 [`KeyValue`] 之上增加克隆、释放与整行写出。

mod text;

use std::{fmt, io};

use chrono::{DateTime, Utc};

use crate::{
    error::{MarshalError, Result},
    level::Level,
};

pub use text::{TextEncoder, TextOption, TimeFormat, text_no_time, text_time_format};

/// “接收一个带类型键值对”的能力。
///
/// 除 [`KeyValue::add_marshaler`] 外的写入都不会失败。
pub trait KeyValue {
    fn add_string(&mut self, key: &str, value: &str);

    fn add_bool(&mut self, key: &str, value: bool);

    fn add_int(&mut self, key: &str, value: isize) {
        self.add_int64(key, value as i64);
    }

    fn add_int64(&mut self, key: &str, value: i64);

    fn add_uint(&mut self, key: &str, value: usize) {
        self.add_uint64(key, value as u64);
    }

    fn add_uint64(&mut self, key: &str, value: u64);

    /// 指针宽度整数，以 `0x` 前缀的小写十六进制输出。
    fn add_uintptr(&mut self, key: &str, value: usize);

    /// 以可往返的最短十进制表示输出，不使用指数形式。
    fn add_float64(&mut self, key: &str, value: f64);

    /// 写入嵌套对象，返回对象回调产生的错误。
    fn add_marshaler(&mut self, key: &str, value: &dyn LogMarshaler) -> Result<(), MarshalError>;

    /// 没有结构化描述的任意值，按 `Debug` 表示输出。
    fn add_object(&mut self, key: &str, value: &dyn fmt::Debug);
}

/// 自描述对象：把自身字段写入给定的 [`KeyValue`]。
pub trait LogMarshaler {
    fn marshal_log(&self, kv: &mut dyn KeyValue) -> Result<(), MarshalError>;
}

/// 以闭包实现 [`LogMarshaler`]，通过 [`MarshalFn::new`] 构造以便推断闭包签名。
///
/// ```
/// use dlog::{KeyValue, MarshalFn};
///
/// let user = MarshalFn::new(|kv: &mut dyn KeyValue| {
///     kv.add_string("name", "alice");
///     kv.add_int64("age", 30);
///     Ok(())
/// });
/// # let _ = user;
/// ```
pub struct MarshalFn<F>(F);

impl<F> MarshalFn<F>
where
    F: Fn(&mut dyn KeyValue) -> Result<(), MarshalError>,
{
    pub fn new(f: F) -> Self {
        MarshalFn(f)
    }
}

impl<F> LogMarshaler for MarshalFn<F>
where
    F: Fn(&mut dyn KeyValue) -> Result<(), MarshalError>,
{
    fn marshal_log(&self, kv: &mut dyn KeyValue) -> Result<(), MarshalError> {
        (self.0)(kv)
    }
}

impl<F> fmt::Debug for MarshalFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MarshalFn(..)")
    }
}

/// 池化、可克隆的编码器。
///
/// # 合约说明（What）
/// - [`Encoder::clone_encoder`]：从池中取一个新实例并复制已累积的上下文，之后二者互不影响；
/// - [`Encoder::free`]：把实例交还给池。接收 `Box<Self>`，释放后的句柄在编译期即不可再用；
/// - [`Encoder::write_entry`]：把级别、时间戳、调用位置、消息与上下文拼成一行，
///   对 `sink` 恰好调用一次 `write`。
///
/// # 线程模型
/// - 字段写入需要 `&mut self`，同一实例不可能被并发修改；
/// - 日志调用路径只以 `&self` 克隆共享的上下文编码器，因此要求 `Send + Sync`。
pub trait Encoder: KeyValue + Send + Sync {
    fn clone_encoder(&self) -> Box<dyn Encoder>;

    fn free(self: Box<Self>);

    fn write_entry(
        &self,
        sink: &mut dyn io::Write,
        caller_file: &str,
        caller_line: u32,
        message: &str,
        level: Level,
        timestamp: DateTime<Utc>,
    ) -> Result<()>;
}
