//! 进程级默认日志器。
//!
//! # 契约说明（What）
//! - [`init`] 只能成功一次，之后的调用返回 [`Error::AlreadyInitialized`]，已安装的日志器不变；
//! - [`default_logger`] 在初始化之前调用会直接 panic，避免日志被静默丢弃；
//! - 顶层 `debug` / `info` / ... 函数转发到默认日志器，调用位置取这些函数的调用点。

use std::{fs::OpenOptions, panic::Location, path::Path, sync::OnceLock};

use crate::{
    encoder::TextEncoder,
    error::{Error, Result},
    field::Field,
    level::Level,
    logger::Logger,
    sink::LockedWriteSyncer,
    sync_task::{DEFAULT_SYNC_INTERVAL, SyncTask},
};

static DEFAULT: OnceLock<Logger> = OnceLock::new();

/// 安装默认日志器。
pub fn init(logger: Logger) -> Result<()> {
    DEFAULT
        .set(logger)
        .map_err(|_rejected| Error::AlreadyInitialized)
}

/// 返回默认日志器。
///
/// # Panics
/// 尚未调用 [`init`] / [`init_file`] 时 panic。
#[track_caller]
pub fn default_logger() -> &'static Logger {
    match DEFAULT.get() {
        Some(logger) => logger,
        None => panic!("dlog: default logger used before init"),
    }
}

pub fn try_default_logger() -> Option<&'static Logger> {
    DEFAULT.get()
}

#[track_caller]
pub fn debug(message: &str, fields: &[Field<'_>]) {
    default_logger().log_at(Level::DEBUG, message, fields, Location::caller());
}

#[track_caller]
pub fn info(message: &str, fields: &[Field<'_>]) {
    default_logger().log_at(Level::INFO, message, fields, Location::caller());
}

#[track_caller]
pub fn warn(message: &str, fields: &[Field<'_>]) {
    default_logger().log_at(Level::WARN, message, fields, Location::caller());
}

#[track_caller]
pub fn error(message: &str, fields: &[Field<'_>]) {
    default_logger().log_at(Level::ERROR, message, fields, Location::caller());
}

#[track_caller]
pub fn panic(message: &str, fields: &[Field<'_>]) -> ! {
    default_logger().panic(message, fields)
}

#[track_caller]
pub fn fatal(message: &str, fields: &[Field<'_>]) {
    default_logger().fatal(message, fields);
}

/// 以追加方式打开（必要时创建）`path`，安装写入该文件的默认日志器，
/// 并启动周期为 [`DEFAULT_SYNC_INTERVAL`] 的同步任务。
///
/// 返回的 [`FileLogGuard`] 负责停止同步任务；文件句柄随默认日志器存活到进程结束。
pub fn init_file(path: impl AsRef<Path>) -> Result<FileLogGuard> {
    let file = OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path.as_ref())?;
    let output = LockedWriteSyncer::new(file);
    let logger = Logger::builder()
        .encoder(TextEncoder::new(&[]))
        .output(output.clone())
        .build();
    // 任务先于安装启动；安装失败时任务随 Drop 停止。
    let task = SyncTask::spawn(output.clone(), DEFAULT_SYNC_INTERVAL)?;
    init(logger)?;
    tracing::debug!(path = %path.as_ref().display(), "file logger installed");
    Ok(FileLogGuard { task, output })
}

/// [`init_file`] 的收尾句柄。
#[derive(Debug)]
#[must_use = "dropping the guard stops periodic syncing"]
pub struct FileLogGuard {
    task: SyncTask,
    output: LockedWriteSyncer,
}

impl FileLogGuard {
    /// 日志文件对应的写入端。
    pub fn output(&self) -> &LockedWriteSyncer {
        &self.output
    }

    /// 停止同步任务并做最后一次同步。
    pub fn close(self) -> Result<()> {
        self.task.stop()
    }
}
