//! 默认日志器的单次赋值与顶层转发函数。
//!
//! 默认日志器是进程级状态，所有断言集中在一个测试函数中，避免并行测试互相干扰。

use chrono::{TimeZone, Utc};
use dlog::{
    Error, Field, Level, LockedWriteSyncer, Logger, MockClock, TextEncoder,
    test_support::MemorySink,
};

#[test]
fn init_once_then_forward_top_level_calls() {
    let output = MemorySink::new();
    let start = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .expect("固定时间点必须合法");
    let logger = Logger::builder()
        .encoder(TextEncoder::new(&[]))
        .output(LockedWriteSyncer::new(output.clone()))
        .clock(MockClock::new(start))
        .build();
    dlog::init(logger).expect("首次初始化必须成功");

    let second = Logger::builder().build();
    assert!(matches!(dlog::init(second), Err(Error::AlreadyInitialized)));

    dlog::info("reqprice:", &[Field::string("key", "apple"), Field::int("price", 100)]);
    let line = line!() - 1;
    assert_eq!(
        output.contents_string(),
        format!("[I] 2024-01-01T00:00:00Z [default_logger.rs:{line}] reqprice: key=apple price=100\n")
    );

    dlog::debug("hidden", &[]);
    assert_eq!(output.lines().len(), 1, "默认级别为 Info");

    dlog::default_logger().set_level(Level::DEBUG);
    dlog::debug("visible", &[]);
    dlog::warn("careful", &[]);
    dlog::error("failed", &[]);
    let tags: Vec<String> = output
        .lines()
        .iter()
        .map(|line| line[..3].to_owned())
        .collect();
    assert_eq!(tags, vec!["[I]", "[D]", "[W]", "[E]"]);
    assert!(dlog::try_default_logger().is_some());
}
