//! Rolling Logger
//!
//! File logger with size-based rotation and an in-memory ring of recent lines.
//!
//! `init_logger` installs a `tracing` subscriber whose fmt layer writes into the
//! active log file. Records emitted through the `log` facade are bridged by
//! `tracing-subscriber`'s `tracing-log` support.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use thiserror::Error;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_MAX_BYTES: u64 = 2 * 1024 * 1024;
const DEFAULT_MAX_FILES: usize = 5;
const DEFAULT_RECENT_CAPACITY: usize = 500;

static LOGGER: OnceLock<SharedWriter> = OnceLock::new();

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("logger already initialized")]
    AlreadyInitialized,
    #[error("logger not initialized")]
    NotInitialized,
    #[error("failed to install subscriber: {0}")]
    Subscriber(String),
}

/// Rotation and buffering limits
#[derive(Debug, Clone)]
pub struct RollingConfig {
    /// Size at which the active file is rotated
    pub max_bytes: u64,
    /// Number of rotated files kept next to the active one
    pub max_files: usize,
    /// Lines kept in the in-memory ring
    pub recent_capacity: usize,
}

impl Default for RollingConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            max_files: DEFAULT_MAX_FILES,
            recent_capacity: DEFAULT_RECENT_CAPACITY,
        }
    }
}

/// Active log file plus rotation bookkeeping
pub struct RollingFile {
    dir: PathBuf,
    app_name: String,
    config: RollingConfig,
    file: File,
    written: u64,
    rotations: u32,
    recent: VecDeque<String>,
    partial: String,
}

impl RollingFile {
    pub fn open(dir: &Path, app_name: &str, config: RollingConfig) -> Result<Self, LoggerError> {
        fs::create_dir_all(dir)?;
        let active = dir.join(format!("{}.log", app_name));
        let file = OpenOptions::new().create(true).append(true).open(&active)?;
        let written = file.metadata()?.len();

        Ok(Self {
            dir: dir.to_path_buf(),
            app_name: app_name.to_string(),
            config,
            file,
            written,
            rotations: 0,
            recent: VecDeque::new(),
            partial: String::new(),
        })
    }

    pub fn active_path(&self) -> PathBuf {
        self.dir.join(format!("{}.log", self.app_name))
    }

    /// Rotated files, oldest first
    pub fn rotated_files(&self) -> io::Result<Vec<PathBuf>> {
        let prefix = format!("{}.", self.app_name);
        let active = self.active_path();
        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| *path != active)
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .map(|name| name.starts_with(&prefix) && name.ends_with(".log"))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();
        Ok(files)
    }

    /// Lines currently held in the ring, oldest first
    pub fn recent(&self) -> Vec<String> {
        self.recent.iter().cloned().collect()
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.rotations += 1;
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S%3f");
        let rotated = self
            .dir
            .join(format!("{}.{}.{:04}.log", self.app_name, stamp, self.rotations));
        fs::rename(self.active_path(), rotated)?;

        self.file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.active_path())?;
        self.written = 0;
        self.prune()
    }

    fn prune(&self) -> io::Result<()> {
        let files = self.rotated_files()?;
        if files.len() > self.config.max_files {
            let excess = files.len() - self.config.max_files;
            for path in files.into_iter().take(excess) {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    fn write_bytes(&mut self, buf: &[u8]) -> io::Result<()> {
        let len = buf.len() as u64;
        if self.written > 0 && self.written + len > self.config.max_bytes {
            self.rotate()?;
        }
        self.file.write_all(buf)?;
        self.written += len;
        self.record_recent(buf);
        Ok(())
    }

    fn record_recent(&mut self, buf: &[u8]) {
        if self.config.recent_capacity == 0 {
            return;
        }
        self.partial.push_str(&String::from_utf8_lossy(buf));
        while let Some(pos) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=pos).collect();
            self.recent.push_back(line.trim_end().to_string());
            while self.recent.len() > self.config.recent_capacity {
                self.recent.pop_front();
            }
        }
    }
}

/// Cloneable handle handed to the fmt layer
#[derive(Clone)]
pub struct SharedWriter(Arc<Mutex<RollingFile>>);

impl SharedWriter {
    pub fn new(file: RollingFile) -> Self {
        Self(Arc::new(Mutex::new(file)))
    }

    fn lock(&self) -> MutexGuard<'_, RollingFile> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn recent(&self) -> Vec<String> {
        self.lock().recent()
    }

    pub fn active_path(&self) -> PathBuf {
        self.lock().active_path()
    }
}

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().write_bytes(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().file.flush()
    }
}

impl<'a> MakeWriter<'a> for SharedWriter {
    type Writer = SharedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

// ========================
// Global logger
// ========================

/// Install the rolling file subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init_logger(log_dir: impl AsRef<Path>, app_name: &str) -> Result<(), LoggerError> {
    init_logger_with(log_dir, app_name, RollingConfig::default())
}

pub fn init_logger_with(
    log_dir: impl AsRef<Path>,
    app_name: &str,
    config: RollingConfig,
) -> Result<(), LoggerError> {
    if LOGGER.get().is_some() {
        return Err(LoggerError::AlreadyInitialized);
    }
    let writer = SharedWriter::new(RollingFile::open(log_dir.as_ref(), app_name, config)?);
    LOGGER
        .set(writer.clone())
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init()
        .map_err(|e| LoggerError::Subscriber(e.to_string()))
}

fn ensure_init() -> Result<(), LoggerError> {
    LOGGER.get().map(|_| ()).ok_or(LoggerError::NotInitialized)
}

pub fn info(msg: &str) -> Result<(), LoggerError> {
    ensure_init()?;
    tracing::info!("{}", msg);
    Ok(())
}

pub fn warn(msg: &str) -> Result<(), LoggerError> {
    ensure_init()?;
    tracing::warn!("{}", msg);
    Ok(())
}

pub fn error(msg: &str) -> Result<(), LoggerError> {
    ensure_init()?;
    tracing::error!("{}", msg);
    Ok(())
}

/// Recent log lines, empty before `init_logger`
pub fn recent_lines() -> Vec<String> {
    LOGGER.get().map(|w| w.recent()).unwrap_or_default()
}

pub fn log_file_path() -> Option<PathBuf> {
    LOGGER.get().map(|w| w.active_path())
}
