use std::fs::File;

use fs2::FileExt;

use crate::error::StoreResult;

/// RAII guard for an advisory whole-file lock.
///
/// Only processes that also request the lock are excluded, and some
/// network file systems ignore advisory locks entirely, so cross-process
/// exclusion is best-effort.
pub(crate) struct FileLockGuard<'a> {
    file: &'a File,
}

impl<'a> FileLockGuard<'a> {
    /// Block until a shared (read) lock on `file` is granted.
    pub(crate) fn shared(file: &'a File) -> StoreResult<Self> {
        file.lock_shared()?;
        Ok(Self { file })
    }

    /// Block until an exclusive (write) lock on `file` is granted.
    pub(crate) fn exclusive(file: &'a File) -> StoreResult<Self> {
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for FileLockGuard<'_> {
    fn drop(&mut self) {
        // Unlock errors cannot be surfaced from Drop; the OS releases the
        // lock when the descriptor closes in any case.
        let _ = self.file.unlock();
    }
}
