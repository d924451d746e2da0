//! `text_encoder` 集成测试：从公开 API 视角核对整行格式。
//!
//! # 测试目标（Why）
//! - 行格式是消费端解析日志的依据，级别标签、时间戳、调用位置、消息与上下文的拼接必须逐字节稳定；
//! - 编码器借助共享池工作，多次写出之间不得残留上一行的任何字节。

use chrono::{DateTime, TimeZone, Utc};
use dlog::{
    BufferPool, Encoder, Error, Field, KeyValue, Level, MarshalFn, PoolConfig, TextEncoder,
    add_fields, test_support::ShortWriteSink, text_no_time, text_time_format,
};

fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .expect("固定时间点必须合法")
}

fn render(enc: &dyn Encoder, level: Level) -> String {
    let mut out = Vec::new();
    enc.write_entry(&mut out, "file.go", 42, "reqprice:", level, fixed_time())
        .expect("写入内存缓冲不应失败");
    String::from_utf8(out).expect("输出必须是 UTF-8")
}

#[test]
fn end_to_end_line_matches_reference() {
    let mut enc = TextEncoder::new(&[]);
    add_fields(
        &mut enc,
        &[Field::string("key", "apple"), Field::int("price", 100)],
    )
    .expect("基本字段不会失败");
    assert_eq!(
        render(&enc, Level::INFO),
        "[I] 2024-01-01T00:00:00Z [file.go:42] reqprice: key=apple price=100\n"
    );
}

#[test]
fn every_standard_level_has_its_tag() {
    let enc = TextEncoder::new(&[text_no_time()]);
    let rendered: Vec<String> = Level::STANDARD
        .iter()
        .map(|level| render(&enc, *level))
        .collect();
    assert_eq!(
        rendered,
        vec![
            "[D] [file.go:42] reqprice:\n",
            "[I] [file.go:42] reqprice:\n",
            "[W] [file.go:42] reqprice:\n",
            "[E] [file.go:42] reqprice:\n",
            "[P] [file.go:42] reqprice:\n",
            "[F] [file.go:42] reqprice:\n",
        ]
    );
}

#[test]
fn disabled_timestamp_leaves_single_space_between_segments() {
    let mut enc = TextEncoder::new(&[text_time_format("")]);
    enc.add_bool("ok", false);
    let line = render(&enc, Level::WARN);
    assert_eq!(line, "[W] [file.go:42] reqprice: ok=false\n");
    assert!(!line.contains("  "), "不得出现连续空格");
}

#[test]
fn custom_layout_is_applied() {
    let enc = TextEncoder::new(&[text_time_format("%d/%m/%Y")]);
    assert_eq!(
        render(&enc, Level::ERROR),
        "[E] 01/01/2024 [file.go:42] reqprice:\n"
    );
}

#[test]
fn deeply_nested_marshalers_render_braces() {
    let inner = MarshalFn::new(|kv: &mut dyn KeyValue| {
        kv.add_float64("ratio", 0.25);
        Ok(())
    });
    let outer = MarshalFn::new(|kv: &mut dyn KeyValue| {
        kv.add_string("name", "alice");
        kv.add_marshaler("stats", &inner)
    });
    let mut enc = TextEncoder::new(&[text_no_time()]);
    enc.add_marshaler("user", &outer).expect("回调不应失败");
    enc.add_uintptr("ptr", 4096);
    assert_eq!(
        render(&enc, Level::DEBUG),
        "[D] [file.go:42] reqprice: user={name=alice stats={ratio=0.25}} ptr=0x1000\n"
    );
}

#[test]
fn empty_nested_object_renders_as_empty_braces() {
    let empty = MarshalFn::new(|_: &mut dyn KeyValue| Ok(()));
    let mut enc = TextEncoder::new(&[text_no_time()]);
    enc.add_marshaler("obj", &empty).expect("回调不应失败");
    enc.add_string("next", "x");
    assert_eq!(enc.as_bytes(), b"obj={} next=x");
}

#[test]
fn incomplete_write_carries_counts() {
    let enc = TextEncoder::new(&[text_no_time()]);
    let mut sink = ShortWriteSink::new(3);
    let err = enc
        .write_entry(&mut sink, "file.go", 42, "reqprice:", Level::INFO, fixed_time())
        .expect_err("短写必须报告");
    let expected = "[I] [file.go:42] reqprice:\n".len();
    assert_eq!(
        err.to_string(),
        format!("incomplete write: only wrote 3 of {expected} bytes")
    );
    assert!(matches!(err, Error::IncompleteWrite { written: 3, .. }));
    assert_eq!(sink.accepted(), b"[I]");
}

#[test]
fn repeated_entries_do_not_leak_bytes_between_lines() {
    let pool = BufferPool::new(PoolConfig {
        initial_capacity: 16,
        max_cached: 2,
        max_retained_capacity: 1024,
    });
    let mut context = TextEncoder::with_pool(pool.clone(), &[text_no_time()]);
    context.add_string("svc", "a");

    for round in 0..50 {
        let mut entry = context.clone_text();
        entry.add_int64("round", round);
        let mut out = Vec::new();
        entry
            .write_entry(&mut out, "f.rs", 1, "m", Level::INFO, fixed_time())
            .expect("写入不应失败");
        assert_eq!(
            String::from_utf8(out).expect("UTF-8"),
            format!("[I] [f.rs:1] m svc=a round={round}\n")
        );
    }
    assert_eq!(pool.stats().active_leases, 1, "只剩上下文编码器持有的租约");
}
