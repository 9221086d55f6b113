//! Process logger: JSON objects over an async drain, matching `core/context`'s
//! `slog` + `slog-async` + `slog-json` stack (see SPEC_FULL.md §2 ambient stack).
use std::io::stdout;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;
use slog::Drain;
use slog::FnValue;
use slog::IgnoreResult;
use slog::Level;
use slog::Logger;
use slog::OwnedKVList;
use slog::Record;
use slog_async::Async;
use slog_json::Json;

/// Minimum severity a log record must have to reach the drain.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    Critical,
    Error,
    Warning,
    Info,
    Debug,
}

impl Default for LoggingLevel {
    fn default() -> LoggingLevel {
        LoggingLevel::Info
    }
}

impl From<LoggingLevel> for Level {
    fn from(level: LoggingLevel) -> Level {
        match level {
            LoggingLevel::Critical => Level::Critical,
            LoggingLevel::Error => Level::Error,
            LoggingLevel::Warning => Level::Warning,
            LoggingLevel::Info => Level::Info,
            LoggingLevel::Debug => Level::Debug,
        }
    }
}

/// Logging configuration options.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Flush logs asynchronously through `slog-async`.
    pub async_drain: bool,

    /// The minimum logging level that reaches the drain.
    pub level: LoggingLevel,
}

impl Default for LoggingConfig {
    fn default() -> LoggingConfig {
        LoggingConfig {
            async_drain: true,
            level: LoggingLevel::default(),
        }
    }
}

/// Alternative implementation of slog's `LevelFilter` with `Ok == ()`, so it can be
/// composed underneath `slog_async::Async` (mirrors `core/context`'s logger module).
#[derive(Debug, Clone)]
struct LevelFilter<D: Drain>(D, Level);
impl<D: Drain> Drain for LevelFilter<D> {
    type Ok = ();
    type Err = D::Err;
    fn log(&self, record: &Record, values: &OwnedKVList) -> Result<Self::Ok, Self::Err> {
        if record.level().is_at_least(self.1) {
            self.0.log(record, values)?;
        }
        Ok(())
    }
}

/// Build the process-wide root [`Logger`] from `config`.
pub fn configure(config: &LoggingConfig) -> Logger {
    let drain = Json::new(stdout())
        .set_newlines(true)
        .set_flush(true)
        .add_default_keys()
        .build();
    let drain = Mutex::new(drain).map(IgnoreResult::new);
    let drain = LevelFilter(drain, config.level.into());
    if config.async_drain {
        let drain = Async::new(drain).build().ignore_res();
        Logger::root(drain, slog::o!("module" => FnValue(|rinfo: &Record| rinfo.module())))
    } else {
        Logger::root(drain, slog::o!("module" => FnValue(|rinfo: &Record| rinfo.module())))
    }
}
