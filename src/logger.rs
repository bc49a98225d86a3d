use chrono::{DateTime, Local};
use colored::*;
use log::debug;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const DEFAULT_LOG_FILE: &str = "bing_iod.log";
pub const MAX_LOG_SIZE: u64 = 500 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }

    fn colored(&self) -> ColoredString {
        match self {
            LogLevel::Info => self.as_str().green(),
            LogLevel::Warning => self.as_str().yellow(),
            LogLevel::Error => self.as_str().red().bold(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            message: message.into(),
        }
    }

    fn timestamp_str(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    fn console_line(&self) -> String {
        format!("[{}] [{}] {}", self.timestamp_str(), self.level.colored(), self.message)
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] [{}] {}", self.timestamp_str(), self.level.as_str(), self.message)
    }
}

/// Status log mirrored to stdout and appended to a size-bounded file.
///
/// Once the file grows past `max_size` it is moved to `<path>.bak`, replacing
/// any previous backup, and the next line starts a fresh file. Nothing here
/// ever fails the caller.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    backup_path: PathBuf,
    max_size: u64,
    echo: bool,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut backup = path.clone().into_os_string();
        backup.push(".bak");
        Self {
            path,
            backup_path: PathBuf::from(backup),
            max_size: MAX_LOG_SIZE,
            echo: true,
        }
    }

    #[cfg(test)]
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    /// Disables the stdout copy; the file sink is unaffected.
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if let Err(e) = self.rotate_if_needed() {
            debug!("Log rotation failed for {}: {}", self.path.display(), e);
        }

        let entry = LogEntry::new(level, message);
        if self.echo {
            println!("{}", entry.console_line());
        }
        if let Err(e) = self.append(&entry) {
            debug!("Failed to append to {}: {}", self.path.display(), e);
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    fn rotate_if_needed(&self) -> io::Result<()> {
        let size = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        if size <= self.max_size {
            return Ok(());
        }
        if self.backup_path.exists() {
            fs::remove_file(&self.backup_path)?;
        }
        fs::rename(&self.path, &self.backup_path)
    }

    fn append(&self, entry: &LogEntry) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", entry)
    }
}
