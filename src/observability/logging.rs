//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Redirect log output to the configured log file
//! - Expose the raw sink for the configuration dump
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` overrides the configured level
//! - Failing to open the log file is fatal; output never goes to a dead sink

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ProxyConfig;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to open log file {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("failed to install log subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Destination of process log output.
#[derive(Debug, Clone)]
pub enum LogSink {
    Stdout,
    File(Arc<File>),
}

impl LogSink {
    /// Open the sink named by `LogFile`; empty means stdout.
    pub fn open(log_file: &str) -> Result<Self, LoggingError> {
        if log_file.is_empty() {
            return Ok(LogSink::Stdout);
        }
        open_log_file(Path::new(log_file)).map(|f| LogSink::File(Arc::new(f)))
    }

    /// Write a block of text to the sink, bypassing level filtering.
    pub fn write_raw(&self, text: &str) -> io::Result<()> {
        match self {
            LogSink::Stdout => {
                let mut out = io::stdout().lock();
                writeln!(out, "{}", text)?;
                out.flush()
            }
            LogSink::File(file) => {
                let mut f: &File = file;
                writeln!(f, "{}", text)?;
                f.flush()
            }
        }
    }
}

/// Open a log file for append, creating it if missing.
pub fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Install the global subscriber writing to the configured sink.
pub fn init_logging(config: &ProxyConfig) -> Result<LogSink, LoggingError> {
    let sink = LogSink::open(&config.log_file)?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)?,
    };

    let (file_layer, stdout_layer) = match &sink {
        LogSink::File(file) => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::clone(file)),
            ),
            None,
        ),
        LogSink::Stdout => (None, Some(tracing_subscriber::fmt::layer())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()?;

    Ok(sink)
}
