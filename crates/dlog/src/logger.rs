//! 分级结构化日志器。
//!
//! # 模块定位（Why）
//! - 把一次日志调用（级别、消息、字段）变成写入端上的一行文本；
//! - 日志路径上的任何失败都不会中断调用线程，只会以一行文本报告到旁路错误输出。
//!
//! # 设计概要（How）
//! - 先以一次原子读判断级别，未启用时直接返回，不触碰编码器；
//! - 启用时克隆上下文编码器，写入本次字段，再由克隆体拼装整行写入 `output`；
//! - 调用位置来自 `#[track_caller]`，固定为公开日志方法的调用点，只保留文件名部分。
//!
//! # 契约说明（What）
//! - 子日志器（[`Logger::with`]）与父日志器共享级别闸门与输出端，拥有独立的上下文；
//! - 自描述对象失败优先于写出失败报告，同一次调用只报告一个错误；
//! - `fatal` 无论写出是否成功都会调用退出钩子。

use std::{panic::Location, path::Path, sync::Arc};

use crate::{
    clock::{Clock, SystemClock},
    encoder::{Encoder, TextEncoder},
    error::{Error, Result},
    field::{Field, add_fields},
    level::{Level, LevelGate},
    meta::Meta,
    sink::LockedWriteSyncer,
};

/// `fatal` 写出之后调用的退出钩子，参数为退出码。
pub type ExitHook = Arc<dyn Fn(i32) + Send + Sync>;

fn exit_process(code: i32) {
    std::process::exit(code)
}

fn process_exit() -> ExitHook {
    Arc::new(exit_process)
}

/// 分级结构化日志器，所有方法都可并发调用。
pub struct Logger {
    meta: Meta,
    clock: Arc<dyn Clock>,
    exit: ExitHook,
}

impl Logger {
    /// 以给定元数据构造，使用系统时钟与进程退出钩子。
    pub fn new(meta: Meta) -> Self {
        Self {
            meta,
            clock: Arc::new(SystemClock),
            exit: process_exit(),
        }
    }

    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::default()
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn level(&self) -> Level {
        self.meta.level()
    }

    /// 修改整棵日志器树的级别。
    pub fn set_level(&self, level: Level) {
        self.meta.set_level(level);
    }

    pub fn is_enabled(&self, level: Level) -> bool {
        self.meta.enabled(level)
    }

    pub fn level_gate(&self) -> &LevelGate {
        self.meta.level_gate()
    }

    /// 派生带额外上下文的子日志器。
    ///
    /// 上下文字段中的自描述对象失败时，错误报告到错误输出，已写入的字段保留。
    pub fn with(&self, fields: &[Field<'_>]) -> Logger {
        let mut meta = self.meta.clone_meta();
        if let Err(err) = add_fields(&mut *meta.encoder, fields) {
            self.internal_error(&Error::Marshal(err));
        }
        Logger {
            meta,
            clock: Arc::clone(&self.clock),
            exit: Arc::clone(&self.exit),
        }
    }

    #[track_caller]
    pub fn log(&self, level: Level, message: &str, fields: &[Field<'_>]) {
        self.log_at(level, message, fields, Location::caller());
    }

    #[track_caller]
    pub fn debug(&self, message: &str, fields: &[Field<'_>]) {
        self.log_at(Level::DEBUG, message, fields, Location::caller());
    }

    #[track_caller]
    pub fn info(&self, message: &str, fields: &[Field<'_>]) {
        self.log_at(Level::INFO, message, fields, Location::caller());
    }

    #[track_caller]
    pub fn warn(&self, message: &str, fields: &[Field<'_>]) {
        self.log_at(Level::WARN, message, fields, Location::caller());
    }

    #[track_caller]
    pub fn error(&self, message: &str, fields: &[Field<'_>]) {
        self.log_at(Level::ERROR, message, fields, Location::caller());
    }

    /// 以 Panic 级别记录后以同一消息 panic。
    #[track_caller]
    pub fn panic(&self, message: &str, fields: &[Field<'_>]) -> ! {
        self.log_at(Level::PANIC, message, fields, Location::caller());
        panic!("{message}");
    }

    /// 以 Fatal 级别记录后调用退出钩子（默认 `process::exit(1)`）。
    ///
    /// 替换过的钩子若返回，本方法随之正常返回。
    #[track_caller]
    pub fn fatal(&self, message: &str, fields: &[Field<'_>]) {
        self.log_at(Level::FATAL, message, fields, Location::caller());
        (self.exit)(1);
    }

    /// 开发模式下等同 [`Logger::fatal`]，否则以 Error 级别记录且不退出。
    #[track_caller]
    pub fn dfatal(&self, message: &str, fields: &[Field<'_>]) {
        if self.meta.development {
            self.log_at(Level::FATAL, message, fields, Location::caller());
            (self.exit)(1);
        } else {
            self.log_at(Level::ERROR, message, fields, Location::caller());
        }
    }

    /// 同步主输出端。
    pub fn sync(&self) -> Result<()> {
        self.meta.output.sync().map_err(Error::from)
    }

    pub(crate) fn log_at(
        &self,
        level: Level,
        message: &str,
        fields: &[Field<'_>],
        location: &'static Location<'static>,
    ) {
        if !self.meta.enabled(level) {
            return;
        }

        let timestamp = self.clock.now();
        let mut entry = self.meta.encoder.clone_encoder();
        let marshaled = add_fields(&mut *entry, fields);
        let written = entry.write_entry(
            &mut &self.meta.output,
            caller_basename(location.file()),
            location.line(),
            message,
            level,
            timestamp,
        );
        entry.free();

        let outcome = match marshaled {
            Err(err) => Err(Error::Marshal(err)),
            Ok(()) => written,
        };
        if let Err(err) = outcome {
            self.internal_error(&err);
        }
    }

    /// 把错误写成一行到错误输出并同步。
    ///
    /// # 契约说明（What）
    /// - 错误输出自身的写入或同步失败不再上报。
    fn internal_error(&self, err: &Error) {
        let line = format!("{err}\n");
        let mut sink = &self.meta.error_output;
        let _ = std::io::Write::write_all(&mut sink, line.as_bytes());
        let _ = self.meta.error_output.sync();
    }
}

impl Clone for Logger {
    fn clone(&self) -> Self {
        Logger {
            meta: self.meta.clone_meta(),
            clock: Arc::clone(&self.clock),
            exit: Arc::clone(&self.exit),
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

fn caller_basename(file: &str) -> &str {
    Path::new(file)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(file)
}

/// [`Logger`] 构造器。
///
/// 未指定的部分取默认值：RFC3339 文本编码器、Info 级别、标准输出 / 标准错误、系统时钟。
#[derive(Default)]
pub struct LoggerBuilder {
    encoder: Option<Box<dyn Encoder>>,
    level: Option<Level>,
    level_gate: Option<LevelGate>,
    development: bool,
    output: Option<LockedWriteSyncer>,
    error_output: Option<LockedWriteSyncer>,
    clock: Option<Arc<dyn Clock>>,
    exit: Option<ExitHook>,
}

impl LoggerBuilder {
    pub fn encoder<E: Encoder + 'static>(mut self, encoder: E) -> Self {
        self.encoder = Some(Box::new(encoder));
        self
    }

    pub fn boxed_encoder(mut self, encoder: Box<dyn Encoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    /// 与其它日志器共享同一级别闸门；同时指定 `level` 时会覆盖闸门当前值。
    pub fn level_gate(mut self, gate: LevelGate) -> Self {
        self.level_gate = Some(gate);
        self
    }

    pub fn development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    pub fn output(mut self, output: LockedWriteSyncer) -> Self {
        self.output = Some(output);
        self
    }

    pub fn error_output(mut self, error_output: LockedWriteSyncer) -> Self {
        self.error_output = Some(error_output);
        self
    }

    pub fn clock<C: Clock>(mut self, clock: C) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    pub fn exit_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(i32) + Send + Sync + 'static,
    {
        self.exit = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> Logger {
        let encoder = self
            .encoder
            .unwrap_or_else(|| Box::new(TextEncoder::new(&[])) as Box<dyn Encoder>);
        let mut meta = Meta::new(encoder);
        if let Some(gate) = self.level_gate {
            meta = meta.with_level_gate(gate);
        }
        if let Some(level) = self.level {
            meta.set_level(level);
        }
        meta.development = self.development;
        if let Some(output) = self.output {
            meta.output = output;
        }
        if let Some(error_output) = self.error_output {
            meta.error_output = error_output;
        }
        Logger {
            meta,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>),
            exit: self.exit.unwrap_or_else(process_exit),
        }
    }
}
