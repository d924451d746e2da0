#![cfg(loom)]

//! `BufferPool` 计数器在并发租借与归还下的 loom 模型。
//!
//! 归还路径先记账后入队，租借方出队后扣减；两者在不同线程上以任意顺序交错时，
//! 租约计数必须回到 0，`cached_bytes` 必须等于自由链表中缓冲的容量之和。

use dlog_buffer::{BufferPool, PoolConfig};
use loom::{model, thread};

fn small_pool() -> BufferPool {
    BufferPool::new(PoolConfig {
        initial_capacity: 16,
        max_cached: 2,
        max_retained_capacity: 1024,
    })
}

#[test]
fn concurrent_leases_settle_counters() {
    model(|| {
        let pool = small_pool();
        let workers: Vec<_> = (0..2)
            .map(|_| {
                let pool = pool.clone();
                thread::spawn(move || {
                    let mut buffer = pool.acquire();
                    buffer.extend_from_slice(b"k=v");
                })
            })
            .collect();
        for worker in workers {
            worker.join().expect("租借线程不应 panic");
        }

        let stats = pool.stats();
        assert_eq!(stats.active_leases, 0, "全部租约归还后计数必须归零");
        assert_eq!(stats.hits + stats.misses, 2);
        assert_eq!(stats.returns + stats.discarded, 2);
        let cached = stats.cached_bytes;
        assert_eq!(pool.shrink_to_fit(), cached, "账面容量必须与链表内容一致");
        assert_eq!(pool.stats().cached_bytes, 0);
    });
}

#[test]
fn reuse_across_threads_never_underflows() {
    model(|| {
        let pool = small_pool();
        drop(pool.acquire());

        let taker = {
            let pool = pool.clone();
            thread::spawn(move || {
                let buffer = pool.acquire();
                assert!(buffer.is_empty(), "复用的缓冲必须为空");
            })
        };
        let shrunk = pool.shrink_to_fit();
        taker.join().expect("租借线程不应 panic");

        let stats = pool.stats();
        assert_eq!(stats.active_leases, 0);
        assert_eq!(stats.hits + stats.misses, 2);
        let remaining = stats.cached_bytes;
        assert!(remaining <= 2 * 1024, "cached_bytes 不得回绕：{remaining}");
        assert_eq!(pool.shrink_to_fit(), remaining, "账面容量必须与链表内容一致");
        assert!(shrunk + remaining > 0, "两块缓冲至少有一块留在链表中");
    });
}
