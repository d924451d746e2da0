use std::{
    fmt,
    mem,
    ops::{Deref, DerefMut},
    sync::Arc,
};

use bytes::BytesMut;

/// `BufferRecycler` 描述缓冲在租借结束时的回收入口。
///
/// # 设计初衷（Why）
/// - 池只负责“租借”一侧；归还由 [`PooledBuffer`] 的 `Drop` 统一触发，
///   调用方不会因为遗忘 `free` 而让池统计失真。
///
/// # 契约定义（What）
/// - `buffer`：被归还的 `BytesMut`，长度可能非零，实现方需自行 `clear`；
/// - **前置条件**：实现必须线程安全，且在 `Drop` 路径上不得 panic；
/// - **后置条件**：实现可以选择回收或丢弃该缓冲，但不能再把它交给原持有者。
pub trait BufferRecycler: Send + Sync + 'static {
    /// 接收一块归还的缓冲。
    fn reclaim(&self, buffer: BytesMut);
}

/// `PooledBuffer` 独占持有一块池化 `BytesMut`，析构时自动归还。
///
/// # 设计动机（Why）
/// - 池化对象“同一时刻只有一个持有者”的约定，在 Rust 中直接由所有权表达：
///   没有 `Clone`，归还即 `Drop`，归还后的访问在编译期被拒绝；
/// - 通过 `Deref<Target = BytesMut>` 暴露全部写入能力（`extend_from_slice`、`fmt::Write` 等），
///   编码器无需包装层。
///
/// # 契约说明（What）
/// - 由池租借得到的实例初始长度为 0；
/// - `Drop` 时必然调用一次 [`BufferRecycler::reclaim`]，池的租约计数随之回落；
/// - 不提供取出底层 `BytesMut` 的出口，缓冲只能经由 `Drop` 离开租约。
pub struct PooledBuffer {
    buffer: BytesMut,
    recycler: Option<Arc<dyn BufferRecycler>>,
}

impl PooledBuffer {
    /// 使用给定缓冲与回收句柄构造。
    pub fn new(buffer: BytesMut, recycler: Arc<dyn BufferRecycler>) -> Self {
        Self {
            buffer,
            recycler: Some(recycler),
        }
    }
}

impl Deref for PooledBuffer {
    type Target = BytesMut;

    fn deref(&self) -> &BytesMut {
        &self.buffer
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut BytesMut {
        &mut self.buffer
    }
}

impl AsRef<[u8]> for PooledBuffer {
    fn as_ref(&self) -> &[u8] {
        self.buffer.as_ref()
    }
}

impl fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("len", &self.buffer.len())
            .field("capacity", &self.buffer.capacity())
            .finish()
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        // 先摘下回收器再搬走缓冲，保证 reclaim 至多执行一次。
        if let Some(recycler) = self.recycler.take() {
            recycler.reclaim(mem::take(&mut self.buffer));
        }
    }
}
