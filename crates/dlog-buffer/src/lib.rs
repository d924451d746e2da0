//! `dlog-buffer` 为文本编码器提供可复用的字节缓冲。
//!
//! # 模块定位（Why）
//! - 每条日志至少需要两块缓冲（上下文 + 行头），若每次都向分配器申请，热路径将被堆分配主导；
//! - 将“租借 / 归还”收敛到独立 crate，编码器只关心写字节，不关心内存从哪里来。
//!
//! # 设计概要（How）
//! - `pool` 模块实现 [`BufferPool`]：以 `crossbeam::queue::ArrayQueue` 作为无锁自由链表，
//!   任意线程可并发租借与归还，调用方无需额外加锁；
//! - `pooled_buffer` 模块实现 [`PooledBuffer`]：独占持有一块 `BytesMut`，在 `Drop` 时通过
//!   [`BufferRecycler`] 归还，所有权规则保证“重复归还 / 归还后继续使用”无法通过编译。
//!
//! # 容量策略（What）
//! - 租借时只重置长度、不收缩容量；
//! - 归还时若容量已膨胀到 [`PoolConfig::max_retained_capacity`] 以上，直接丢弃而不回收，
//!   避免单条超大日志让池长期占住峰值内存。

mod pool;
mod pooled_buffer;

pub use pool::{BufferPool, PoolConfig, PoolStats};
pub use pooled_buffer::{BufferRecycler, PooledBuffer};
