//! Process-wide log setup.
//!
//! Library code only emits `tracing` events; binaries call [`init`] once at
//! startup and keep the returned [`LogGuard`] alive until exit so buffered
//! file output is flushed. The level filter uses `EnvFilter` syntax.

use anyhow::{Context, Result};
use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

pub const LOG_FILTER_ENV: &str = "SCRIPTRUNNER_LOG";
pub const LOG_FILE_ENV: &str = "SCRIPTRUNNER_LOG_FILE";
const DEFAULT_FILTER: &str = "info";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogSettings {
    pub filter: String,
    /// Append to this file instead of writing to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            file: None,
        }
    }
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_values(env::var(LOG_FILTER_ENV).ok(), env::var_os(LOG_FILE_ENV))
    }

    fn from_values(filter: Option<String>, file: Option<std::ffi::OsString>) -> Self {
        Self {
            filter: filter
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FILTER.to_string()),
            file: file.filter(|value| !value.is_empty()).map(PathBuf::from),
        }
    }

    /// Override the log file; `None` keeps the current setting.
    pub fn with_file(mut self, file: Option<PathBuf>) -> Self {
        if file.is_some() {
            self.file = file;
        }
        self
    }
}

/// Keeps the background log writer alive. Drop it to flush and stop logging
/// to file.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _worker: Option<WorkerGuard>,
}

/// Install the global subscriber.
pub fn init(settings: &LogSettings) -> Result<LogGuard> {
    let (subscriber, guard) = build(settings)?;
    subscriber
        .try_init()
        .context("a global log subscriber is already installed")?;
    Ok(guard)
}

fn build(settings: &LogSettings) -> Result<(impl Subscriber + Send + Sync + 'static, LogGuard)> {
    let filter = EnvFilter::try_new(&settings.filter)
        .with_context(|| format!("invalid log filter {:?}", settings.filter))?;

    let (writer, worker) = match &settings.file {
        Some(path) => {
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(
                dir,
                path.file_name().unwrap_or_else(|| OsStr::new("scriptrunner.log")),
            );
            let (non_blocking, worker) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(worker))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(false),
    );
    Ok((subscriber, LogGuard { _worker: worker }))
}
