//! Key-value backends. Each key holds one opaque string value that is always
//! replaced wholesale.
//!
//! ## File Layout
//!
//! ```text
//! <dir>/
//!   websites.json        value of key "websites"
//!   websites.json.tmp    transient, only while a write is in flight
//! ```

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::{SiteError, Result};

/// Durable string storage addressed by key.
pub trait KvStore: Send + Sync {
    /// Current value of `key`, or `None` if it was never written.
    fn get(&self, key: &str) -> Result<Option<String>>;
    /// Replace the value of `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Forget `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

// ─────────────────────────────── FileKv ──────────────────────────────────────

/// One JSON file per key under a base directory.
/// Writes land in a temp file first and are renamed into place, so a crash
/// mid-write leaves the previous value intact.
pub struct FileKv {
    dir: PathBuf,
}

impl FileKv {
    /// Open (creating if needed) the storage directory.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .map_err(|e| SiteError::Storage(format!("Cannot create {}: {e}", dir.display())))?;
        info!(dir = ?dir, "File storage opened");
        Ok(Self { dir: dir.to_path_buf() })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KvStore for FileKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SiteError::Io(e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        let mut file = File::create(&tmp)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &path)?;
        debug!(key, bytes = value.len(), "Value written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SiteError::Io(e)),
        }
    }
}

// ─────────────────────────────── MemoryKv ────────────────────────────────────

/// Volatile backend; contents vanish with the process.
#[derive(Default)]
pub struct MemoryKv {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.write().remove(key);
        Ok(())
    }
}
