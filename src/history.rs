//! Persistent command history.
//!
//! Accepted command templates are kept most-recent-first, without
//! duplicates and up to a fixed capacity. The store is owned by the control
//! loop; nothing here is shared across tasks.

mod record;

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio_util::bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::{debug, info, warn};

use crate::search::Matcher;

use self::record::RecordCodec;

/// Capacity used when the configuration does not provide a valid one.
pub const DEFAULT_CAPACITY: usize = 100;

/// Suffix replacing the configuration file's extension.
pub const HISTORY_SUFFIX: &str = "_cmds.dat";

const CONFIG_EXTENSION: &str = "toml";

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("history file is corrupt: {0}")]
    Corrupt(String),
}

/// Derive the history file path from the configuration file path.
///
/// `clipaction/config.toml` becomes `clipaction/config_cmds.dat`. A path
/// without the `.toml` suffix gets the history suffix appended instead.
pub fn history_path(config_path: &Path) -> PathBuf {
    let base = if config_path.extension() == Some(OsStr::new(CONFIG_EXTENSION)) {
        config_path.file_stem()
    } else {
        config_path.file_name()
    };
    let mut name = base.map(OsStr::to_os_string).unwrap_or_default();
    name.push(HISTORY_SUFFIX);
    config_path.with_file_name(name)
}

/// Bounded, deduplicated list of previously accepted command templates.
pub struct HistoryStore {
    entries: Vec<String>,
    capacity: usize,
    path: Option<PathBuf>,
    matcher: Matcher,
}

impl HistoryStore {
    /// Create an empty store.
    ///
    /// Without a path the store lives in memory only and `load`/`save` do
    /// nothing.
    pub fn new(capacity: usize, path: Option<PathBuf>) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
            path,
            matcher: Matcher::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries, most recent first.
    pub fn recent(&self) -> &[String] {
        &self.entries
    }

    /// Record a command template.
    ///
    /// A command that is already present keeps its position and the call
    /// is a no-op. Otherwise the command goes to the front and the oldest
    /// entry is evicted once capacity is exceeded.
    ///
    /// Returns `true` if the command was inserted.
    pub fn add(&mut self, command: impl Into<String>) -> bool {
        let command = command.into();
        if self.entries.contains(&command) {
            return false;
        }

        self.entries.insert(0, command);
        if self.entries.len() > self.capacity {
            self.entries.pop();
        }
        true
    }

    /// Entries fuzzy-matching `pattern`, best match first.
    ///
    /// Equal scores keep recency order; an empty pattern returns everything.
    pub fn suggestions(&self, pattern: &str) -> Vec<&str> {
        self.matcher.rank(self.entries.iter().map(String::as_str), pattern)
    }

    /// Append entries from the history file, in file order.
    ///
    /// A missing or unreadable file leaves the store as it was. A corrupt
    /// tail is dropped and the records before it are kept.
    pub fn load(&mut self) {
        let Some(path) = self.path.clone() else {
            return;
        };

        match self.try_load(&path) {
            Ok(count) => debug!(path = %path.display(), count, "Loaded command history"),
            Err(HistoryError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No command history file");
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "Failed to load command history");
            }
        }
    }

    fn try_load(&mut self, path: &Path) -> Result<usize, HistoryError> {
        let mut buffer = BytesMut::from(fs::read(path)?.as_slice());
        let mut codec = RecordCodec::new();
        let mut count = 0;
        while let Some(command) = codec.decode_eof(&mut buffer)? {
            self.entries.push(command);
            count += 1;
        }
        Ok(count)
    }

    /// Overwrite the history file with the current entries.
    ///
    /// Failures are logged and otherwise ignored.
    pub fn save(&self) {
        let Some(path) = self.path.as_deref() else {
            return;
        };

        match self.try_save(path) {
            Ok(()) => {
                info!(path = %path.display(), count = self.entries.len(), "Saved command history");
            }
            Err(err) => warn!(path = %path.display(), %err, "Failed to save command history"),
        }
    }

    fn try_save(&self, path: &Path) -> Result<(), HistoryError> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)?;
        }

        let buffer = record::encode(self.entries.iter().map(String::as_str))?;
        fs::write(path, buffer)?;
        Ok(())
    }
}
