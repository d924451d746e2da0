//! `pool_contract` 集成测试：从 crate 公开 API 视角验证 `BufferPool` 的租借 / 归还契约。
//!
//! # 测试目标（Why）
//! - 租借到的缓冲必须为空，且不同租约之间不共享内容；
//! - 统计字段需与真实的租借生命周期一致，便于后续接入监控；
//! - 多线程高频租借时不得出现跨租约的数据串扰。
//!
//! # 结构安排（How）
//! - `stats_track_lease_lifecycle`：单线程下核对命中、归还与活跃租约；
//! - `shrink_to_fit_releases_cached_buffers`：收缩后自由链表为空；
//! - `every_lease_ends_through_the_pool`：任意释放顺序下租约计数都回到 0；
//! - `concurrent_cycles_never_cross_contaminate`：N 线程 × 10,000 次循环的并发压测。

use std::{sync::Arc, thread};

use dlog_buffer::{BufferPool, PoolConfig};

#[test]
fn stats_track_lease_lifecycle() {
    let pool = BufferPool::default();
    assert_eq!(pool.stats().active_leases, 0);

    {
        let _first = pool.acquire();
        let during = pool.stats();
        assert_eq!(during.active_leases, 1);
        assert_eq!(during.misses, 1);
    }

    let after = pool.stats();
    assert_eq!(after.active_leases, 0);
    assert_eq!(after.returns, 1);
    assert_eq!(after.cached_buffers, 1);
    assert!(after.cached_bytes >= PoolConfig::default().initial_capacity);

    {
        let _second = pool.acquire();
        let during = pool.stats();
        assert_eq!(during.hits, 1, "第二次租借应命中自由链表");
        assert_eq!(during.cached_buffers, 0);
    }
}

#[test]
fn shrink_to_fit_releases_cached_buffers() {
    let pool = BufferPool::default();
    let cached_capacity = {
        let buffer = pool.acquire();
        buffer.capacity()
    };
    let reclaimed = pool.shrink_to_fit();
    assert!(reclaimed >= cached_capacity, "回收字节数至少应覆盖已缓存容量");
    let stats = pool.stats();
    assert_eq!(stats.cached_buffers, 0);
    assert_eq!(stats.cached_bytes, 0, "收缩后不应保留闲置容量");
}

#[test]
fn every_lease_ends_through_the_pool() {
    let pool = BufferPool::new(PoolConfig {
        initial_capacity: 32,
        max_cached: 2,
        max_retained_capacity: 64,
    });
    let mut leases: Vec<_> = (0..5).map(|_| pool.acquire()).collect();
    leases[0].extend_from_slice(&[b'x'; 128]);
    assert_eq!(pool.stats().active_leases, 5);

    // 逆序、乱序与过大缓冲混合释放。
    drop(leases.remove(2));
    drop(leases.remove(0));
    while let Some(lease) = leases.pop() {
        drop(lease);
    }

    let stats = pool.stats();
    assert_eq!(stats.active_leases, 0, "每个租约结束后计数都必须回落");
    assert_eq!(stats.returns, 2, "自由链表上限为 2");
    assert_eq!(stats.discarded, 3, "过大缓冲与超出上限的归还都计入丢弃");
    assert_eq!(stats.cached_buffers, 2);
}

#[test]
fn concurrent_cycles_never_cross_contaminate() {
    const THREADS: usize = 8;
    const CYCLES: usize = 10_000;

    let pool = Arc::new(BufferPool::new(PoolConfig {
        initial_capacity: 64,
        max_cached: 4,
        max_retained_capacity: 4096,
    }));

    let workers: Vec<_> = (0..THREADS)
        .map(|id| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                let marker = format!("worker={id}");
                for cycle in 0..CYCLES {
                    let mut buffer = pool.acquire();
                    assert!(buffer.is_empty(), "租借到的缓冲必须为空");
                    buffer.extend_from_slice(marker.as_bytes());
                    buffer.extend_from_slice(format!(" cycle={cycle}").as_bytes());
                    let expected = format!("{marker} cycle={cycle}");
                    assert_eq!(&buffer[..], expected.as_bytes(), "缓冲内容被其它线程污染");
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().expect("工作线程不应 panic");
    }

    let stats = pool.stats();
    assert_eq!(stats.active_leases, 0, "所有租约都应已归还");
    assert_eq!(
        stats.hits + stats.misses,
        (THREADS * CYCLES) as u64,
        "每一次租借都必须计入命中或未命中"
    );
    assert!(stats.cached_buffers <= 4);
}
