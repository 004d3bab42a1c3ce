//! Dual-sink logger behind the `log` facade.
//!
//! Console records go to stderr (stdout carries the LSP wire protocol) and,
//! when configured, a second sink appends to a log file. The two sinks have
//! independent level thresholds. Record format:
//! `<ISO-8601 timestamp> [LEVEL] message`.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::error::AlsError;

/// Parse a user-supplied level string. Case-insensitive; `critical` maps to
/// the facade's `error`; unknown strings fall back to `info`.
pub fn parse_log_level(s: &str) -> LevelFilter {
    match s.to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" | "critical" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub console_level: LevelFilter,
    pub file_level: LevelFilter,
    pub log_file: Option<PathBuf>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        LoggerConfig {
            console_level: LevelFilter::Info,
            file_level: LevelFilter::Debug,
            log_file: None,
        }
    }
}

struct AlsLogger {
    console_level: LevelFilter,
    file_level: LevelFilter,
    file: Option<Mutex<File>>,
}

impl AlsLogger {
    fn format_record(level: Level, args: &std::fmt::Arguments) -> String {
        let timestamp = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
        format!("{timestamp} [{level}] {args}")
    }
}

impl Log for AlsLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.console_level
            || (self.file.is_some() && metadata.level() <= self.file_level)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = Self::format_record(record.level(), record.args());
        if record.level() <= self.console_level {
            eprintln!("{line}");
        }
        if record.level() <= self.file_level {
            if let Some(file) = &self.file {
                if let Ok(mut f) = file.lock() {
                    let _ = writeln!(f, "{line}");
                }
            }
        }
    }

    fn flush(&self) {
        if let Some(file) = &self.file {
            if let Ok(mut f) = file.lock() {
                let _ = f.flush();
            }
        }
    }
}

/// Install the global logger. Fails if the log file cannot be opened for
/// append or if a logger is already installed.
pub fn init(config: LoggerConfig) -> Result<(), AlsError> {
    let file = match &config.log_file {
        Some(path) => {
            let f = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| AlsError::config(format!("cannot open log file {}: {e}", path.display())))?;
            Some(Mutex::new(f))
        }
        None => None,
    };

    // With no file sink the file threshold is irrelevant to the facade's
    // global maximum.
    let file_level = if file.is_some() {
        config.file_level
    } else {
        LevelFilter::Off
    };
    let max_level = config.console_level.max(file_level);

    let logger = AlsLogger {
        console_level: config.console_level,
        file_level,
        file,
    };

    log::set_boxed_logger(Box::new(logger))
        .map_err(|e| AlsError::config(format!("logger already installed: {e}")))?;
    log::set_max_level(max_level);
    Ok(())
}
