//! 周期性同步任务。
//!
//! # 模块定位（Why）
//! - 文件输出依赖操作系统缓存，定期 `sync` 可以限制进程异常退出时丢失的数据量；
//! - 任务必须可以显式停止，停止时做最后一次同步，避免关闭文件前遗漏尾部数据。
//!
//! # 设计概要（How）
//! - 后台线程在 `recv_timeout` 上等待：超时即同步一次，停止信号或发送端断开即退出；
//! - 同步失败通过 `tracing::warn!` 报告，不终止任务，也不写入其负责的日志流。
//!
//! # 设计权衡（Trade-offs）
//! - 选择独立线程而不是异步运行时：日志核心本身是同步的，不应强迫使用方引入运行时。

use std::{
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

use crate::{
    error::{Error, Result},
    sink::LockedWriteSyncer,
};

/// 默认同步周期。
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_millis(500);

/// 后台同步任务句柄。析构时停止任务并做最后一次同步。
#[derive(Debug)]
pub struct SyncTask {
    target: LockedWriteSyncer,
    interval: Duration,
    shutdown: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl SyncTask {
    /// 启动任务，每隔 `interval` 同步一次 `target`。
    pub fn spawn(target: LockedWriteSyncer, interval: Duration) -> Result<Self> {
        let (shutdown, signal) = channel::bounded(1);
        let worker_target = target.clone();
        let worker = thread::Builder::new()
            .name("dlog-sync".to_owned())
            .spawn(move || run(worker_target, signal, interval))?;
        tracing::debug!(interval_ms = interval.as_millis() as u64, "sync task started");
        Ok(Self {
            target,
            interval,
            shutdown: Some(shutdown),
            worker: Some(worker),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|worker| !worker.is_finished())
    }

    /// 立即唤醒并等待后台线程退出，然后做最后一次同步并返回其结果。
    pub fn stop(mut self) -> Result<()> {
        self.halt();
        self.target.sync().map_err(Error::from)
    }

    /// 停止后台线程；返回本次调用是否真正停止了一个仍在管理中的线程。
    fn halt(&mut self) -> bool {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.try_send(());
        }
        let Some(worker) = self.worker.take() else {
            return false;
        };
        if worker.join().is_err() {
            tracing::warn!("sync task thread panicked");
        }
        true
    }
}

impl Drop for SyncTask {
    fn drop(&mut self) {
        if self.halt() {
            if let Err(err) = self.target.sync() {
                tracing::warn!(error = %err, "final sync failed");
            }
        }
    }
}

fn run(target: LockedWriteSyncer, signal: Receiver<()>, interval: Duration) {
    loop {
        match signal.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {
                if let Err(err) = target.sync() {
                    tracing::warn!(error = %err, "periodic sync failed");
                }
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    tracing::debug!("sync task stopped");
}
