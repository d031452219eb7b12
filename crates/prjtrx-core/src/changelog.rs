use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{Local, NaiveDateTime};
use fs2::FileExt;
use thiserror::Error;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum ChangeLogError {
    #[error("Failed to append change log {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// `YYYY-MM-DD HH:MM:SS -- changed <info>`
pub fn format_record(timestamp: &NaiveDateTime, info: &str) -> String {
    format!("{} -- changed <{}>", timestamp.format(TIMESTAMP_FORMAT), info)
}

/// Append-only change log with a console echo.
#[derive(Debug)]
pub struct ChangeLogger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ChangeLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Echoes the record to stdout and appends it to the sink.
    pub fn log_change(&self, info: &str) -> Result<String, ChangeLogError> {
        self.log_change_echoed(&mut std::io::stdout().lock(), info)
    }

    /// Same as `log_change` with the echo going to `console`.
    ///
    /// A failed echo is only warned about; the append is always attempted.
    pub fn log_change_echoed(
        &self,
        console: &mut dyn Write,
        info: &str,
    ) -> Result<String, ChangeLogError> {
        let record = format_record(&Local::now().naive_local(), info);
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = writeln!(console, "{record}").and_then(|()| console.flush()) {
            tracing::warn!(error = %err, "change log echo failed");
        }
        append_line(&self.path, &record).map_err(|source| ChangeLogError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(record)
    }
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    FileExt::lock_exclusive(&file)?;
    let written = writeln!(file, "{line}").and_then(|()| file.flush());
    let unlocked = FileExt::unlock(&file);
    written.and(unlocked)
}
