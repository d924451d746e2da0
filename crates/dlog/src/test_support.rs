//! 测试桩：可观测的内存写入端与按需失败的写入端。
//!
//! 单元测试、集成测试与基准共用这些类型，因此以公开模块形式提供。

use std::{
    io::{self, Write},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use parking_lot::Mutex;

use crate::sink::{IntoWriteSyncer, WriteSyncer};

/// 共享的内存写入端，记录写入内容与同步次数。克隆体观察同一份数据。
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    data: Arc<Mutex<Vec<u8>>>,
    syncs: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().clone()
    }

    pub fn contents_string(&self) -> String {
        String::from_utf8_lossy(&self.data.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents_string().lines().map(str::to_owned).collect()
    }

    pub fn sync_count(&self) -> usize {
        self.syncs.load(Ordering::SeqCst)
    }

    /// `write` 被调用的次数。
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.data.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl WriteSyncer for MemorySink {
    fn sync(&mut self) -> io::Result<()> {
        self.syncs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl IntoWriteSyncer for MemorySink {
    type Syncer = MemorySink;

    fn into_write_syncer(self) -> Self {
        self
    }
}

/// 每次 `write` 最多接收 `limit` 字节的写入端，用于触发不完整写入。
#[derive(Debug)]
pub struct ShortWriteSink {
    limit: usize,
    calls: usize,
    accepted: Vec<u8>,
}

impl ShortWriteSink {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            calls: 0,
            accepted: Vec::new(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn accepted(&self) -> &[u8] {
        &self.accepted
    }
}

impl Write for ShortWriteSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.calls += 1;
        let n = buf.len().min(self.limit);
        self.accepted.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl WriteSyncer for ShortWriteSink {
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl IntoWriteSyncer for ShortWriteSink {
    type Syncer = ShortWriteSink;

    fn into_write_syncer(self) -> Self {
        self
    }
}

/// 写入成功但同步总是失败的写入端。
#[derive(Clone, Debug, Default)]
pub struct FailingSyncSink {
    inner: MemorySink,
    attempts: Arc<AtomicUsize>,
}

impl FailingSyncSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sync_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Write for FailingSyncSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl WriteSyncer for FailingSyncSink {
    fn sync(&mut self) -> io::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(io::Error::other("sync rejected"))
    }
}

impl IntoWriteSyncer for FailingSyncSink {
    type Syncer = FailingSyncSink;

    fn into_write_syncer(self) -> Self {
        self
    }
}
