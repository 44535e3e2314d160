use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Durable append-only record of acquired items, one name per line.
///
/// Lines already written are never altered or reordered; the file only
/// grows. Callers within one process are serialized by an internal mutex.
/// No advisory file lock is taken: external writers are out of scope for
/// the pocket, so only this process's threads are coordinated.
pub struct Pocket {
    /// Path to the pocket file.
    path: PathBuf,
    /// Owned file handle behind a mutex for thread safety.
    file: Mutex<File>,
}

impl Pocket {
    /// Open (or create) the pocket file at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&path)?;

        debug!(path = %path.display(), "pocket opened");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Append one item at end-of-file.
    ///
    /// `item` must not contain line terminators; embedding one would
    /// corrupt the line framing, so it is rejected before any I/O.
    pub fn append(&self, item: &str) -> StoreResult<()> {
        if item.contains(['\n', '\r']) {
            return Err(StoreError::InvalidItemName(item.to_string()));
        }

        let mut file = self.file.lock().expect("pocket mutex poisoned");
        file.seek(SeekFrom::End(0))?;
        file.write_all(format!("{item}\n").as_bytes())?;
        file.sync_data()?;

        debug!(item, "pocket append");
        Ok(())
    }

    /// All items in append order.
    ///
    /// Restartable: every call re-reads the full current contents. A torn
    /// final line (no terminator) is returned as-is, never dropped or
    /// repaired.
    pub fn read_all(&self) -> StoreResult<Vec<String>> {
        let mut file = self.file.lock().expect("pocket mutex poisoned");
        file.seek(SeekFrom::Start(0))?;

        let reader = BufReader::new(&*file);
        let mut items = Vec::new();
        for line in reader.lines() {
            items.push(line?);
        }
        Ok(items)
    }

    /// Flush and release the backing file.
    ///
    /// Consumes the pocket, so a second close is unrepresentable.
    pub fn close(self) -> StoreResult<()> {
        let file = self.file.into_inner().expect("pocket mutex poisoned");
        file.sync_all()?;
        Ok(())
    }

    /// Path to the pocket file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
