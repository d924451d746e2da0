use std::{
    fmt::{self, Write as _},
    io,
    sync::Arc,
};

use bytes::{BufMut, BytesMut};
use chrono::{
    DateTime, Utc,
    format::{Item, StrftimeItems},
};
use dlog_buffer::{BufferPool, PooledBuffer};

use crate::{
    encoder::{Encoder, KeyValue, LogMarshaler},
    error::{Error, MarshalError, Result},
    level::Level,
};

/// RFC3339（秒精度）。编码器只处理 UTC 时间，时区固定写作 `Z`。
const RFC3339_LAYOUT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// 时间戳的渲染方式。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimeFormat {
    /// 默认：`2024-01-01T00:00:00Z`。
    Rfc3339,
    /// chrono `strftime` 布局。
    Layout(Arc<str>),
    /// 整段时间戳（连同前导空格）省略。
    Disabled,
}

impl TimeFormat {
    /// 由布局字符串构造；空串表示禁用时间戳。
    pub fn from_layout(layout: &str) -> Self {
        if layout.is_empty() {
            TimeFormat::Disabled
        } else {
            TimeFormat::Layout(Arc::from(layout))
        }
    }

    /// 布局中是否存在 chrono 无法识别的说明符。
    fn validate(&self) -> Result<()> {
        match self {
            TimeFormat::Layout(layout)
                if StrftimeItems::new(layout).any(|item| matches!(item, Item::Error)) =>
            {
                Err(Error::TimeFormat {
                    layout: layout.to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    fn append(&self, line: &mut BytesMut, timestamp: DateTime<Utc>) -> Result<()> {
        let layout: &str = match self {
            TimeFormat::Disabled => return Ok(()),
            TimeFormat::Rfc3339 => RFC3339_LAYOUT,
            TimeFormat::Layout(layout) => &**layout,
        };
        line.put_u8(b' ');
        write!(line, "{}", timestamp.format(layout)).map_err(|_| Error::TimeFormat {
            layout: layout.to_owned(),
        })
    }
}

/// 文本编码器的构造选项。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextOption {
    /// 覆盖时间布局（chrono `strftime` 语法）；空串等同 [`TextOption::NoTime`]。
    TimeFormat(String),
    /// 不输出时间戳。
    NoTime,
}

impl TextOption {
    fn apply(&self, enc: &mut TextEncoder) {
        enc.time_format = match self {
            TextOption::TimeFormat(layout) => TimeFormat::from_layout(layout),
            TextOption::NoTime => TimeFormat::Disabled,
        };
    }
}

/// 设置时间戳布局。
pub fn text_time_format(layout: impl Into<String>) -> TextOption {
    TextOption::TimeFormat(layout.into())
}

/// 省略时间戳。
pub fn text_no_time() -> TextOption {
    TextOption::NoTime
}

/// 面向人类阅读的单行文本编码器。
///
/// # 设计动机（Why）
/// - 每条日志都要“克隆上下文 → 追加本次字段 → 拼装整行”，三个步骤全部落在池化缓冲上，
///   稳态下不触发堆分配；
/// - 行格式固定为 `[<级别>] <时间> [<文件>:<行>] <消息> <k>=<v> ...`，消费端可按空格切分。
///
/// # 核心机制（How）
/// - `bytes` 只保存已完整写入的 `key=value` 片段，片段之间恰好一个空格，末尾无分隔符；
/// - `first_nested` 在进入嵌套对象的 `{` 之后置位，使第一个嵌套字段不带前导空格；
/// - [`Encoder::write_entry`] 另租一块缓冲拼装行头，写出后随作用域结束归还，错误路径同样归还。
///
/// # 契约说明（What）
/// - 键值之间为 `=`、字段之间为单个空格，值中的空格、`=`、换行都不转义（已知限制，消费端需容忍）；
/// - 空键不拒绝，渲染为 `=value`。
pub struct TextEncoder {
    bytes: PooledBuffer,
    time_format: TimeFormat,
    first_nested: bool,
    pool: BufferPool,
}

impl TextEncoder {
    /// 从进程级共享池创建编码器，默认使用 RFC3339 时间戳。
    ///
    /// 无法识别的自定义布局会回退到 RFC3339 并记录一条 `warn` 诊断；
    /// 需要显式失败时使用 [`TextEncoder::try_new`]。
    pub fn new(options: &[TextOption]) -> Self {
        Self::with_pool(BufferPool::global().clone(), options)
    }

    /// 与 [`TextEncoder::new`] 相同，但指定缓冲池。
    pub fn with_pool(pool: BufferPool, options: &[TextOption]) -> Self {
        let mut enc = Self::build(pool, options);
        if let Err(err) = enc.time_format.validate() {
            tracing::warn!(error = %err, "falling back to RFC3339 timestamps");
            enc.time_format = TimeFormat::Rfc3339;
        }
        enc
    }

    /// 校验选项后创建编码器；布局非法时返回 [`Error::TimeFormat`]。
    pub fn try_new(options: &[TextOption]) -> Result<Self> {
        Self::try_with_pool(BufferPool::global().clone(), options)
    }

    pub fn try_with_pool(pool: BufferPool, options: &[TextOption]) -> Result<Self> {
        let enc = Self::build(pool, options);
        enc.time_format.validate()?;
        Ok(enc)
    }

    fn build(pool: BufferPool, options: &[TextOption]) -> Self {
        let mut enc = TextEncoder {
            bytes: pool.acquire(),
            time_format: TimeFormat::Rfc3339,
            first_nested: false,
            pool,
        };
        for option in options {
            option.apply(&mut enc);
        }
        enc
    }

    /// 已累积的上下文字节。
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn time_format(&self) -> &TimeFormat {
        &self.time_format
    }

    /// 以具体类型克隆，语义同 [`Encoder::clone_encoder`]。
    pub fn clone_text(&self) -> TextEncoder {
        let mut bytes = self.pool.acquire();
        bytes.extend_from_slice(&self.bytes);
        TextEncoder {
            bytes,
            time_format: self.time_format.clone(),
            first_nested: self.first_nested,
            pool: self.pool.clone(),
        }
    }

    fn add_key(&mut self, key: &str) {
        if !self.bytes.is_empty() && !self.first_nested {
            self.bytes.put_u8(b' ');
        } else {
            self.first_nested = false;
        }
        self.bytes.extend_from_slice(key.as_bytes());
        self.bytes.put_u8(b'=');
    }
}

impl KeyValue for TextEncoder {
    fn add_string(&mut self, key: &str, value: &str) {
        self.add_key(key);
        self.bytes.extend_from_slice(value.as_bytes());
    }

    fn add_bool(&mut self, key: &str, value: bool) {
        self.add_key(key);
        let literal: &[u8] = if value { b"true" } else { b"false" };
        self.bytes.extend_from_slice(literal);
    }

    fn add_int64(&mut self, key: &str, value: i64) {
        self.add_key(key);
        let _ = write!(self.bytes, "{value}");
    }

    fn add_uint64(&mut self, key: &str, value: u64) {
        self.add_key(key);
        let _ = write!(self.bytes, "{value}");
    }

    fn add_uintptr(&mut self, key: &str, value: usize) {
        self.add_key(key);
        let _ = write!(self.bytes, "0x{value:x}");
    }

    fn add_float64(&mut self, key: &str, value: f64) {
        self.add_key(key);
        append_float(&mut self.bytes, value);
    }

    fn add_marshaler(&mut self, key: &str, value: &dyn LogMarshaler) -> Result<(), MarshalError> {
        self.add_key(key);
        self.first_nested = true;
        self.bytes.put_u8(b'{');
        let result = value.marshal_log(self);
        self.bytes.put_u8(b'}');
        self.first_nested = false;
        result
    }

    fn add_object(&mut self, key: &str, value: &dyn fmt::Debug) {
        self.add_key(key);
        let _ = write!(self.bytes, "{value:?}");
    }
}

impl Encoder for TextEncoder {
    fn clone_encoder(&self) -> Box<dyn Encoder> {
        Box::new(self.clone_text())
    }

    fn free(self: Box<Self>) {
        // 缓冲随 PooledBuffer 析构归还。
        drop(self);
    }

    fn write_entry(
        &self,
        sink: &mut dyn io::Write,
        caller_file: &str,
        caller_line: u32,
        message: &str,
        level: Level,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        let mut line = self.pool.acquire();

        line.put_u8(b'[');
        match level.tag() {
            Some(tag) => line.put_u8(tag),
            None => {
                let _ = write!(line, "{}", level.get());
            }
        }
        line.put_u8(b']');

        self.time_format.append(&mut line, timestamp)?;

        line.extend_from_slice(b" [");
        line.extend_from_slice(caller_file.as_bytes());
        let _ = write!(line, ":{caller_line}]");

        line.put_u8(b' ');
        line.extend_from_slice(message.as_bytes());

        if !self.bytes.is_empty() {
            line.put_u8(b' ');
            line.extend_from_slice(&self.bytes);
        }
        line.put_u8(b'\n');

        let expected = line.len();
        let written = sink.write(&line[..])?;
        if written < expected {
            return Err(Error::IncompleteWrite { written, expected });
        }
        Ok(())
    }
}

impl fmt::Debug for TextEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextEncoder")
            .field("context", &String::from_utf8_lossy(&self.bytes))
            .field("time_format", &self.time_format)
            .finish()
    }
}

/// `f64` 的 `Display` 即最短可往返表示且从不使用指数；特殊值按 `+Inf`/`-Inf`/`NaN` 输出。
fn append_float(buf: &mut BytesMut, value: f64) {
    if value.is_nan() {
        buf.extend_from_slice(b"NaN");
    } else if value.is_infinite() {
        buf.extend_from_slice(if value > 0.0 { b"+Inf" } else { b"-Inf" });
    } else {
        let _ = write!(buf, "{value}");
    }
}
