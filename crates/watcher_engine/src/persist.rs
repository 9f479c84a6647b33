use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use thiserror::Error;
use watcher_core::ProcessState;
use watcher_logging::{watcher_info, watcher_warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state directory {path:?} missing or not writable: {message}")]
    Directory { path: PathBuf, message: String },
    #[error("io error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Ensure `dir` exists and is a directory; create it if missing.
pub fn ensure_dir(dir: &Path) -> Result<(), StoreError> {
    let unusable = |message: String| StoreError::Directory {
        path: dir.to_path_buf(),
        message,
    };
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| unusable(e.to_string()))?;
        if !meta.is_dir() {
            return Err(unusable("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| unusable(e.to_string()))?;
    }
    Ok(())
}

/// Atomically replaces `{dir}/{filename}`: temp file, fsync, rename, then
/// fsync of the directory so the rename itself survives a crash.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, StoreError> {
        ensure_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let tmp_path = tmp.path().to_path_buf();
        write_synced(&mut tmp, content).map_err(|e| StoreError::io(&tmp_path, e))?;

        tmp.persist(&target)
            .map_err(|e| StoreError::io(&target, e.error))?;
        sync_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        Ok(target)
    }
}

fn write_synced(tmp: &mut NamedTempFile, content: &str) -> io::Result<()> {
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

/// Durable memory of the last processed item.
pub trait StateStore: Send + Sync {
    /// Never fails: anything unreadable counts as "no prior item".
    fn load(&self) -> ProcessState;
    /// Must be durable before returning.
    fn save(&self, title: &str) -> Result<(), StoreError>;
}

/// Keeps the last title as the entire UTF-8 content of one file.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> ProcessState {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                watcher_info!("No state at {:?}; treating every item as new", self.path);
                return ProcessState::empty();
            }
            Err(err) => {
                watcher_warn!(
                    "Failed to read state from {:?}: {}; treating every item as new",
                    self.path,
                    err
                );
                return ProcessState::empty();
            }
        };

        let title = content.trim_end_matches(&['\r', '\n'][..]);
        if title.is_empty() {
            ProcessState::empty()
        } else {
            ProcessState::seen(title)
        }
    }

    fn save(&self, title: &str) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let filename = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| StoreError::Directory {
                path: self.path.clone(),
                message: "state path has no usable file name".into(),
            })?;
        AtomicFileWriter::new(dir).write(filename, title)?;
        watcher_info!("Stored last title {:?} at {:?}", title, self.path);
        Ok(())
    }
}

/// Process-local store, for embedding and tests. Counts saves.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: Mutex<ProcessState>,
    saves: AtomicUsize,
}

impl MemoryStateStore {
    pub fn new(initial: ProcessState) -> Self {
        Self {
            state: Mutex::new(initial),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> ProcessState {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn save(&self, title: &str) -> Result<(), StoreError> {
        *self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = ProcessState::seen(title);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
