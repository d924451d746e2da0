#![cfg(loom)]

//! [`LevelGate`] 的内存序模型。
//!
//! 在 `cfg(loom)` 下闸门内部使用 loom 原子，这里直接驱动真实的 `LevelGate`，
//! 穷举调度以确认：读到新阈值的线程也能看到写入方在调整阈值之前发布的数据。

use dlog::{Level, LevelGate};
use loom::{
    model,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};

#[test]
fn raised_threshold_publishes_prior_writes() {
    model(|| {
        let gate = LevelGate::new(Level::INFO);
        let payload = Arc::new(AtomicUsize::new(0));

        let writer = {
            let gate = gate.clone();
            let payload = Arc::clone(&payload);
            thread::spawn(move || {
                payload.store(42, Ordering::Relaxed);
                gate.set_level(Level::ERROR);
            })
        };

        if gate.level() == Level::ERROR {
            assert_eq!(
                payload.load(Ordering::Relaxed),
                42,
                "Acquire 读必须看到 Release 之前的写入"
            );
            assert!(!gate.enabled(Level::WARN));
        }

        writer.join().expect("写线程不应 panic");
        assert_eq!(gate.level(), Level::ERROR);
    });
}

#[test]
fn concurrent_setters_leave_one_of_their_values() {
    model(|| {
        let gate = LevelGate::new(Level::INFO);
        let handles: Vec<_> = [Level::WARN, Level::PANIC]
            .into_iter()
            .map(|level| {
                let gate = gate.clone();
                thread::spawn(move || gate.set_level(level))
            })
            .collect();
        for handle in handles {
            handle.join().expect("写线程不应 panic");
        }
        let final_level = gate.level();
        assert!(
            final_level == Level::WARN || final_level == Level::PANIC,
            "阈值不能是中间态：{final_level}"
        );
    });
}
