use std::sync::{Arc, OnceLock};

#[cfg(not(loom))]
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
#[cfg(loom)]
use loom::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use bytes::BytesMut;
use crossbeam::queue::ArrayQueue;

use crate::pooled_buffer::{BufferRecycler, PooledBuffer};

/// 默认初始容量，与单行日志的常见长度同量级。
const DEFAULT_INITIAL_CAPACITY: usize = 1024;
/// 自由链表最多缓存的缓冲数量。
const DEFAULT_MAX_CACHED: usize = 256;
/// 超过该容量的缓冲在归还时直接丢弃。
const DEFAULT_MAX_RETAINED_CAPACITY: usize = 64 * 1024;

/// 缓冲池的构造参数。
///
/// # 契约说明（What）
/// - `initial_capacity`：未命中自由链表时新分配缓冲的容量；
/// - `max_cached`：自由链表容量上限，至少为 1；队列已满时归还的缓冲被丢弃；
/// - `max_retained_capacity`：容量超过此值的缓冲不再回收，避免峰值内存长期驻留。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    pub initial_capacity: usize,
    pub max_cached: usize,
    pub max_retained_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_cached: DEFAULT_MAX_CACHED,
            max_retained_capacity: DEFAULT_MAX_RETAINED_CAPACITY,
        }
    }
}

/// 池统计快照。
///
/// - `hits` / `misses`：租借时命中 / 未命中自由链表的次数；
/// - `returns`：成功回到自由链表的次数；
/// - `discarded`：因容量超限或队列已满而被丢弃的次数；
/// - `active_leases`：当前尚未归还的租约数；
/// - `cached_buffers` / `cached_bytes`：自由链表中的缓冲数量与总容量。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub hits: u64,
    pub misses: u64,
    pub returns: u64,
    pub discarded: u64,
    pub active_leases: usize,
    pub cached_buffers: usize,
    pub cached_bytes: usize,
}

/// `BufferPool` 提供基于无锁自由链表的 `BytesMut` 复用。
///
/// # 模块角色（Why）
/// - 文本编码器每条日志需要租借两块缓冲：一块承载克隆后的上下文，一块拼装行头；
///   池化让这两次分配在稳态下降为两次无锁出入队；
/// - 借助 [`PooledBuffer`] 的析构钩子自动归还，调用方不必显式 `free`。
///
/// # 核心机制（How）
/// - `crossbeam::queue::ArrayQueue` 作为有界 MPMC 队列，`pop`/`push` 均为无锁操作；
/// - `PoolMetrics` 以 `Relaxed` 原子计数器记录命中、归还与丢弃，只服务于观测，不参与同步；
/// - 归还路径统一 `clear()`，只重置长度、保留容量。
///
/// # 契约说明（What）
/// - **线程安全**：实例可 `Clone` 并跨线程共享，内部只有原子状态；
/// - **后置条件**：[`BufferPool::acquire`] 返回的缓冲长度必为 0，且不与任何其它租约共享存储；
/// - **容量策略**：归还时容量超过 `max_retained_capacity` 的缓冲被丢弃，计入 `discarded`。
///
/// # 设计权衡（Trade-offs）
/// - 有界队列意味着突发并发超过 `max_cached` 时会产生额外分配，换取内存上限可预测；
/// - `shrink_to_fit` 采取“清空自由链表”的简单策略，便于压测后归还峰值内存。
#[derive(Clone)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl BufferPool {
    /// 以给定参数创建空池。
    pub fn new(config: PoolConfig) -> Self {
        Self {
            inner: Arc::new(PoolInner::new(config)),
        }
    }

    /// 进程级共享池，默认构造的编码器均从这里租借。
    pub fn global() -> &'static BufferPool {
        static GLOBAL: OnceLock<BufferPool> = OnceLock::new();
        GLOBAL.get_or_init(BufferPool::default)
    }

    /// 租借一块空缓冲。
    pub fn acquire(&self) -> PooledBuffer {
        let buffer = self.inner.acquire_buffer();
        let recycler: Arc<dyn BufferRecycler> = self.inner.clone();
        PooledBuffer::new(buffer, recycler)
    }

    /// 清空自由链表，返回释放的总容量（字节）。
    pub fn shrink_to_fit(&self) -> usize {
        self.inner.shrink_free_list()
    }

    /// 读取统计快照。
    pub fn stats(&self) -> PoolStats {
        self.inner.snapshot()
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("config", &self.inner.config)
            .field("stats", &self.inner.snapshot())
            .finish()
    }
}

struct PoolInner {
    free_list: ArrayQueue<BytesMut>,
    config: PoolConfig,
    metrics: PoolMetrics,
}

impl PoolInner {
    fn new(config: PoolConfig) -> Self {
        Self {
            // ArrayQueue 不接受 0 容量。
            free_list: ArrayQueue::new(config.max_cached.max(1)),
            config,
            metrics: PoolMetrics::new(),
        }
    }

    fn acquire_buffer(&self) -> BytesMut {
        let buffer = match self.free_list.pop() {
            Some(mut buf) => {
                self.metrics.hits.fetch_add(1, Ordering::Relaxed);
                saturating_sub(&self.metrics.cached_bytes, buf.capacity());
                buf.clear();
                buf
            }
            None => {
                self.metrics.misses.fetch_add(1, Ordering::Relaxed);
                BytesMut::with_capacity(self.config.initial_capacity)
            }
        };
        self.metrics.active_leases.fetch_add(1, Ordering::Relaxed);
        buffer
    }

    fn shrink_free_list(&self) -> usize {
        let mut reclaimed = 0;
        while let Some(buf) = self.free_list.pop() {
            reclaimed += buf.capacity();
            saturating_sub(&self.metrics.cached_bytes, buf.capacity());
        }
        tracing::debug!(reclaimed, "buffer pool free list drained");
        reclaimed
    }

    fn snapshot(&self) -> PoolStats {
        PoolStats {
            hits: self.metrics.hits.load(Ordering::Relaxed),
            misses: self.metrics.misses.load(Ordering::Relaxed),
            returns: self.metrics.returns.load(Ordering::Relaxed),
            discarded: self.metrics.discarded.load(Ordering::Relaxed),
            active_leases: self.metrics.active_leases.load(Ordering::Relaxed),
            cached_buffers: self.free_list.len(),
            cached_bytes: self.metrics.cached_bytes.load(Ordering::Relaxed),
        }
    }
}

impl BufferRecycler for PoolInner {
    fn reclaim(&self, mut buffer: BytesMut) {
        saturating_sub(&self.metrics.active_leases, 1);
        let capacity = buffer.capacity();
        if capacity > self.config.max_retained_capacity {
            self.metrics.discarded.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(
                capacity,
                limit = self.config.max_retained_capacity,
                "oversized buffer dropped instead of pooled"
            );
            return;
        }
        buffer.clear();
        // 先记账再入队：出队方的扣减总能对上已记录的容量。
        self.metrics.cached_bytes.fetch_add(capacity, Ordering::Relaxed);
        match self.free_list.push(buffer) {
            Ok(()) => {
                self.metrics.returns.fetch_add(1, Ordering::Relaxed);
            }
            Err(_rejected) => {
                saturating_sub(&self.metrics.cached_bytes, capacity);
                self.metrics.discarded.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

struct PoolMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    returns: AtomicU64,
    discarded: AtomicU64,
    active_leases: AtomicUsize,
    cached_bytes: AtomicUsize,
}

impl PoolMetrics {
    fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            returns: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
            active_leases: AtomicUsize::new(0),
            cached_bytes: AtomicUsize::new(0),
        }
    }
}

fn saturating_sub(target: &AtomicUsize, value: usize) {
    let _ = target.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
        Some(current.saturating_sub(value))
    });
}
