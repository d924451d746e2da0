//! 带显式同步能力的写入端。
//!
//! # 模块定位（Why）
//! - 日志器既要写出整行，也要能在退出或定时任务中把数据刷到持久存储；
//! - 不同写入端的“同步”含义不同：文件是 `sync_all`，带缓冲的写入端是 `flush`，内存缓冲无事可做。
//!
//! # 设计概要（How）
//! - [`WriteSyncer`] 在 [`io::Write`] 之上增加 `sync`；
//! - [`IntoWriteSyncer`] 在包装时由类型决定采用哪种同步语义，之后不再判断；
//! - [`LockedWriteSyncer`] 以一把互斥锁同时保护 `write` 与 `sync`，可克隆后在多个日志器间共享。

use std::{
    fmt,
    fs::File,
    io::{self, BufWriter, Cursor, LineWriter, Stderr, Stdout, Write},
    sync::Arc,
};

use parking_lot::Mutex;

/// 可写且可同步到持久存储的写入端。
pub trait WriteSyncer: Write + Send {
    fn sync(&mut self) -> io::Result<()>;
}

impl WriteSyncer for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

impl<W: WriteSyncer + ?Sized> WriteSyncer for Box<W> {
    fn sync(&mut self) -> io::Result<()> {
        (**self).sync()
    }
}

/// 以 `flush` 充当同步。
#[derive(Debug)]
pub struct FlushSyncer<W>(pub W);

impl<W: Write> Write for FlushSyncer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<W: Write + Send> WriteSyncer for FlushSyncer<W> {
    fn sync(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

/// 同步为空操作。
#[derive(Debug)]
pub struct NopSyncer<W>(pub W);

impl<W: Write> Write for NopSyncer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<W: Write + Send> WriteSyncer for NopSyncer<W> {
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// 把写入端包装为 [`WriteSyncer`]。
///
/// 原生支持同步的类型原样返回，支持 `flush` 的类型得到 [`FlushSyncer`]，
/// 纯内存写入端得到 [`NopSyncer`]。其它自定义类型可直接使用这两个适配器。
pub trait IntoWriteSyncer {
    type Syncer: WriteSyncer;

    fn into_write_syncer(self) -> Self::Syncer;
}

impl IntoWriteSyncer for File {
    type Syncer = File;

    fn into_write_syncer(self) -> File {
        self
    }
}

macro_rules! flush_syncable {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoWriteSyncer for $ty {
                type Syncer = FlushSyncer<$ty>;

                fn into_write_syncer(self) -> Self::Syncer {
                    FlushSyncer(self)
                }
            }
        )*
    };
}

flush_syncable!(Stdout, Stderr);

impl<W: Write + Send> IntoWriteSyncer for BufWriter<W> {
    type Syncer = FlushSyncer<BufWriter<W>>;

    fn into_write_syncer(self) -> Self::Syncer {
        FlushSyncer(self)
    }
}

impl<W: Write + Send> IntoWriteSyncer for LineWriter<W> {
    type Syncer = FlushSyncer<LineWriter<W>>;

    fn into_write_syncer(self) -> Self::Syncer {
        FlushSyncer(self)
    }
}

impl IntoWriteSyncer for Vec<u8> {
    type Syncer = NopSyncer<Vec<u8>>;

    fn into_write_syncer(self) -> Self::Syncer {
        NopSyncer(self)
    }
}

impl IntoWriteSyncer for Cursor<Vec<u8>> {
    type Syncer = NopSyncer<Cursor<Vec<u8>>>;

    fn into_write_syncer(self) -> Self::Syncer {
        NopSyncer(self)
    }
}

impl IntoWriteSyncer for LockedWriteSyncer {
    type Syncer = LockedWriteSyncer;

    fn into_write_syncer(self) -> Self {
        self
    }
}

/// 包装写入端，同步语义在此刻确定。
pub fn add_sync<W: IntoWriteSyncer>(writer: W) -> W::Syncer {
    writer.into_write_syncer()
}

/// 以互斥锁串行化 `write` 与 `sync` 的共享写入端。
///
/// # 契约说明（What）
/// - 每次委托调用在整个调用期间持锁，两次 `write` 的字节不会交错；
/// - 克隆只复制 `Arc`，所有克隆体写入同一底层写入端。
#[derive(Clone)]
pub struct LockedWriteSyncer {
    inner: Arc<Mutex<Box<dyn WriteSyncer>>>,
}

impl LockedWriteSyncer {
    pub fn new<W>(writer: W) -> Self
    where
        W: IntoWriteSyncer,
        W::Syncer: 'static,
    {
        Self::from_syncer(writer.into_write_syncer())
    }

    /// 直接接收已实现 [`WriteSyncer`] 的写入端。
    pub fn from_syncer<S: WriteSyncer + 'static>(syncer: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(syncer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// 持锁同步底层写入端。
    pub fn sync(&self) -> io::Result<()> {
        self.inner.lock().sync()
    }

    /// 两个句柄是否指向同一底层写入端。
    pub fn same_sink(&self, other: &LockedWriteSyncer) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Write for &LockedWriteSyncer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.inner.lock().write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

impl Write for LockedWriteSyncer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self).write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        (&*self).write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&*self).flush()
    }
}

impl WriteSyncer for LockedWriteSyncer {
    fn sync(&mut self) -> io::Result<()> {
        self.inner.lock().sync()
    }
}

impl fmt::Debug for LockedWriteSyncer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockedWriteSyncer")
            .field("handles", &Arc::strong_count(&self.inner))
            .finish()
    }
}
