//! 声明式日志器配置（TOML）。
//!
//! ```toml
//! level = "debug"          # 名称或整数
//! development = false
//! time_format = "%H:%M:%S" # 缺省为 RFC3339，空串表示不输出时间
//! output = "logs/app.log"  # "stdout" / "stderr" / 文件路径
//! error_output = "stderr"
//! sync_interval_ms = 500   # 0 表示不启动同步任务
//! ```

use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::{
    encoder::{TextEncoder, TextOption},
    error::{Error, Result},
    level::Level,
    logger::Logger,
    sink::LockedWriteSyncer,
    sync_task::{DEFAULT_SYNC_INTERVAL, SyncTask},
};

/// 输出目标。
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum OutputTarget {
    Stdout,
    Stderr,
    File(PathBuf),
}

impl TryFrom<String> for OutputTarget {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        match value.trim() {
            "" => Err(Error::Config("output target must not be empty".to_owned())),
            "stdout" => Ok(OutputTarget::Stdout),
            "stderr" => Ok(OutputTarget::Stderr),
            _ => Ok(OutputTarget::File(PathBuf::from(value))),
        }
    }
}

impl OutputTarget {
    fn open(&self) -> Result<LockedWriteSyncer> {
        Ok(match self {
            OutputTarget::Stdout => LockedWriteSyncer::stdout(),
            OutputTarget::Stderr => LockedWriteSyncer::stderr(),
            OutputTarget::File(path) => LockedWriteSyncer::new(open_append(path)?),
        })
    }
}

fn open_append(path: &Path) -> Result<std::fs::File> {
    Ok(OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)?)
}

/// 日志器配置。所有字段都可省略。
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerConfig {
    pub level: Level,
    pub development: bool,
    pub time_format: Option<String>,
    pub output: OutputTarget,
    pub error_output: OutputTarget,
    pub sync_interval_ms: u64,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            development: false,
            time_format: None,
            output: OutputTarget::Stdout,
            error_output: OutputTarget::Stderr,
            sync_interval_ms: DEFAULT_SYNC_INTERVAL.as_millis() as u64,
        }
    }
}

impl LoggerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// 对应的文本编码器选项。
    pub fn text_options(&self) -> Vec<TextOption> {
        self.time_format
            .iter()
            .map(|layout| TextOption::TimeFormat(layout.clone()))
            .collect()
    }

    /// 构造日志器；`sync_interval_ms > 0` 时同时启动同步主输出端的任务。
    ///
    /// 主输出与错误输出指向同一路径时共用一个写入端。
    pub fn build(&self) -> Result<(Logger, Option<SyncTask>)> {
        let encoder = TextEncoder::try_new(&self.text_options())?;
        let output = self.output.open()?;
        let error_output = if self.error_output == self.output {
            output.clone()
        } else {
            self.error_output.open()?
        };

        let sync_task = match self.sync_interval_ms {
            0 => None,
            ms => Some(SyncTask::spawn(output.clone(), Duration::from_millis(ms))?),
        };
        tracing::debug!(
            level = %self.level,
            sync = sync_task.is_some(),
            "logger configuration applied"
        );

        let logger = Logger::builder()
            .encoder(encoder)
            .level(self.level)
            .development(self.development)
            .output(output)
            .error_output(error_output)
            .build();
        Ok((logger, sync_task))
    }
}
