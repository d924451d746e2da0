use crate::{
    encoder::Encoder,
    level::{Level, LevelGate},
    sink::LockedWriteSyncer,
};

/// 日志器的配置核心：上下文编码器、输出端与共享级别闸门。
///
/// # 契约说明（What）
/// - `encoder` 保存日志器的上下文字段，构造完成后只读，每次日志调用都从它克隆；
/// - `output` / `error_output` 是带锁写入端，克隆 `Meta` 时共享同一底层写入端；
/// - 级别闸门同样共享，子日志器调整级别会影响整棵日志器树。
pub struct Meta {
    pub development: bool,
    pub encoder: Box<dyn Encoder>,
    pub output: LockedWriteSyncer,
    pub error_output: LockedWriteSyncer,
    level: LevelGate,
}

impl Meta {
    /// 默认 Info 级别，输出到带锁的标准输出 / 标准错误。
    pub fn new(encoder: Box<dyn Encoder>) -> Self {
        Self {
            development: false,
            encoder,
            output: LockedWriteSyncer::stdout(),
            error_output: LockedWriteSyncer::stderr(),
            level: LevelGate::new(Level::INFO),
        }
    }

    pub fn level(&self) -> Level {
        self.level.level()
    }

    pub fn set_level(&self, level: Level) {
        self.level.set_level(level);
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.level.enabled(level)
    }

    pub fn level_gate(&self) -> &LevelGate {
        &self.level
    }

    /// 以外部闸门替换当前闸门，用于让多个根日志器共享同一阈值。
    pub fn with_level_gate(mut self, gate: LevelGate) -> Self {
        self.level = gate;
        self
    }

    /// 深拷贝编码器，共享输出端与级别闸门。
    pub fn clone_meta(&self) -> Meta {
        Meta {
            development: self.development,
            encoder: self.encoder.clone_encoder(),
            output: self.output.clone(),
            error_output: self.error_output.clone(),
            level: self.level.clone(),
        }
    }
}

impl std::fmt::Debug for Meta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Meta")
            .field("development", &self.development)
            .field("level", &self.level())
            .field("output", &self.output)
            .field("error_output", &self.error_output)
            .finish_non_exhaustive()
    }
}
