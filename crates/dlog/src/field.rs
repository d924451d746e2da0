//! 带类型的键值字段。
//!
//! # 模块定位（Why）
//! - 日志调用以 `&[Field]` 传入本次上下文，值以借用形式存在，只在本次调用期间有效；
//! - 值的种类是封闭集合，编码器按种类分派，不需要运行时反射。
//!
//! # 契约说明（What）
//! - 空键不会被拒绝，渲染为 `=value`；
//! - [`add_fields`] 按切片顺序写入，遇到自描述对象失败时保留第一个错误并继续写入余下字段。

use std::fmt;

use crate::{
    encoder::{KeyValue, LogMarshaler},
    error::MarshalError,
};

/// 字段值的种类。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Bool,
    Int64,
    Uint64,
    Uintptr,
    Float64,
    Marshaler,
    Object,
}

/// 字段值，借用调用方的数据。
#[derive(Clone, Copy)]
pub enum FieldValue<'a> {
    String(&'a str),
    Bool(bool),
    Int64(i64),
    Uint64(u64),
    Uintptr(usize),
    Float64(f64),
    Marshaler(&'a dyn LogMarshaler),
    Object(&'a dyn fmt::Debug),
}

impl FieldValue<'_> {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::String(_) => FieldKind::String,
            FieldValue::Bool(_) => FieldKind::Bool,
            FieldValue::Int64(_) => FieldKind::Int64,
            FieldValue::Uint64(_) => FieldKind::Uint64,
            FieldValue::Uintptr(_) => FieldKind::Uintptr,
            FieldValue::Float64(_) => FieldKind::Float64,
            FieldValue::Marshaler(_) => FieldKind::Marshaler,
            FieldValue::Object(_) => FieldKind::Object,
        }
    }
}

impl fmt::Debug for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(v) => f.debug_tuple("String").field(v).finish(),
            FieldValue::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            FieldValue::Int64(v) => f.debug_tuple("Int64").field(v).finish(),
            FieldValue::Uint64(v) => f.debug_tuple("Uint64").field(v).finish(),
            FieldValue::Uintptr(v) => write!(f, "Uintptr(0x{v:x})"),
            FieldValue::Float64(v) => f.debug_tuple("Float64").field(v).finish(),
            FieldValue::Marshaler(_) => f.write_str("Marshaler(..)"),
            FieldValue::Object(v) => f.debug_tuple("Object").field(v).finish(),
        }
    }
}

/// 一个键值字段。
#[derive(Clone, Copy, Debug)]
pub struct Field<'a> {
    pub key: &'a str,
    pub value: FieldValue<'a>,
}

impl<'a> Field<'a> {
    pub fn string(key: &'a str, value: &'a str) -> Self {
        Self::new(key, FieldValue::String(value))
    }

    pub fn bool(key: &'a str, value: bool) -> Self {
        Self::new(key, FieldValue::Bool(value))
    }

    pub fn int(key: &'a str, value: isize) -> Self {
        Self::new(key, FieldValue::Int64(value as i64))
    }

    pub fn int64(key: &'a str, value: i64) -> Self {
        Self::new(key, FieldValue::Int64(value))
    }

    pub fn uint(key: &'a str, value: usize) -> Self {
        Self::new(key, FieldValue::Uint64(value as u64))
    }

    pub fn uint64(key: &'a str, value: u64) -> Self {
        Self::new(key, FieldValue::Uint64(value))
    }

    /// 指针宽度整数，渲染为 `0x` 前缀的十六进制。
    pub fn uintptr(key: &'a str, value: usize) -> Self {
        Self::new(key, FieldValue::Uintptr(value))
    }

    pub fn float64(key: &'a str, value: f64) -> Self {
        Self::new(key, FieldValue::Float64(value))
    }

    /// 嵌套的自描述对象，渲染为 `key={...}`。
    pub fn marshaler(key: &'a str, value: &'a dyn LogMarshaler) -> Self {
        Self::new(key, FieldValue::Marshaler(value))
    }

    /// 任意可 `Debug` 的值。
    pub fn object(key: &'a str, value: &'a dyn fmt::Debug) -> Self {
        Self::new(key, FieldValue::Object(value))
    }

    pub const fn new(key: &'a str, value: FieldValue<'a>) -> Self {
        Field { key, value }
    }

    pub fn kind(&self) -> FieldKind {
        self.value.kind()
    }

    /// 把自身写入 `kv`；只有自描述对象可能失败。
    pub fn add_to<K: KeyValue + ?Sized>(&self, kv: &mut K) -> Result<(), MarshalError> {
        match self.value {
            FieldValue::String(v) => kv.add_string(self.key, v),
            FieldValue::Bool(v) => kv.add_bool(self.key, v),
            FieldValue::Int64(v) => kv.add_int64(self.key, v),
            FieldValue::Uint64(v) => kv.add_uint64(self.key, v),
            FieldValue::Uintptr(v) => kv.add_uintptr(self.key, v),
            FieldValue::Float64(v) => kv.add_float64(self.key, v),
            FieldValue::Marshaler(v) => return kv.add_marshaler(self.key, v),
            FieldValue::Object(v) => kv.add_object(self.key, v),
        }
        Ok(())
    }
}

/// 依次写入全部字段，返回遇到的第一个错误。
pub fn add_fields<K: KeyValue + ?Sized>(kv: &mut K, fields: &[Field<'_>]) -> Result<(), MarshalError> {
    let mut first_err = None;
    for field in fields {
        if let Err(err) = field.add_to(kv) {
            first_err.get_or_insert(err);
        }
    }
    match first_err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
