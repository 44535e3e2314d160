use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::flock::FileLockGuard;

/// Durable store for a single non-negative credit balance.
///
/// The whole file is the value: one line of decimal digits followed by a
/// newline. An empty file reads as zero.
///
/// Callers within one process are serialized by an internal mutex; an
/// advisory whole-file lock, held for the duration of each operation,
/// extends the exclusion to cooperating external processes. Lock order is
/// always mutex first, then file lock; guard drop order releases them in
/// reverse.
pub struct Wallet {
    /// Path to the balance file.
    path: PathBuf,
    /// Owned file handle behind a mutex for thread safety.
    file: Mutex<File>,
}

impl Wallet {
    /// Open (or create) the balance file at `path`.
    ///
    /// A missing or empty file starts the balance at zero.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&path)?;

        debug!(path = %path.display(), "wallet opened");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Current balance.
    ///
    /// Takes a shared file lock, so concurrent readers do not block each
    /// other but writers are excluded.
    pub fn balance(&self) -> StoreResult<i64> {
        let file = self.file.lock().expect("wallet mutex poisoned");
        let _flock = FileLockGuard::shared(&file)?;
        read_balance(&file, &self.path)
    }

    /// Overwrite the stored balance with `value`.
    ///
    /// The file is truncated and rewritten in full, so it holds at most one
    /// line at any observable time.
    pub fn set_balance(&self, value: i64) -> StoreResult<()> {
        if value < 0 {
            return Err(StoreError::NegativeAmount(value));
        }

        let file = self.file.lock().expect("wallet mutex poisoned");
        let _flock = FileLockGuard::exclusive(&file)?;
        write_balance(&file, value)?;

        debug!(value, "balance set");
        Ok(())
    }

    /// Atomically withdraw `amount` if the balance covers it.
    ///
    /// The read-compare-write sequence executes under one mutex hold and
    /// one exclusive file lock, so two racing withdrawals can never both
    /// observe the same pre-decrement balance.
    /// Returns `false` and leaves the file untouched when funds are short.
    pub fn withdraw(&self, amount: i64) -> StoreResult<bool> {
        if amount < 0 {
            return Err(StoreError::NegativeAmount(amount));
        }

        let file = self.file.lock().expect("wallet mutex poisoned");
        let _flock = FileLockGuard::exclusive(&file)?;

        let current = read_balance(&file, &self.path)?;
        if current < amount {
            debug!(current, amount, "withdrawal refused");
            return Ok(false);
        }

        let remaining = current - amount;
        write_balance(&file, remaining)?;

        debug!(current, amount, remaining, "withdrawal applied");
        Ok(true)
    }

    /// Flush and release the backing file.
    ///
    /// Consumes the wallet, so a second close is unrepresentable. Dropping
    /// a wallet without calling this releases the descriptor without the
    /// final sync.
    pub fn close(self) -> StoreResult<()> {
        let file = self.file.into_inner().expect("wallet mutex poisoned");
        file.sync_all()?;
        Ok(())
    }

    /// Path to the balance file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read and parse the single balance line.
///
/// Empty or whitespace-only content is balance zero. Anything else that is
/// not a non-negative decimal integer is corruption and is surfaced, never
/// coerced.
fn read_balance(mut file: &File, path: &Path) -> StoreResult<i64> {
    file.seek(SeekFrom::Start(0))?;
    let mut raw = Vec::new();
    file.read_to_end(&mut raw)?;

    let content = String::from_utf8(raw).map_err(|e| StoreError::CorruptBalance {
        path: path.to_path_buf(),
        content: String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })?;

    let text = content.trim();
    if text.is_empty() {
        return Ok(0);
    }

    match text.parse::<i64>() {
        Ok(value) if value >= 0 => Ok(value),
        _ => Err(StoreError::CorruptBalance {
            path: path.to_path_buf(),
            content: text.to_string(),
        }),
    }
}

/// Truncate and rewrite the file so it holds exactly `"<value>\n"`.
fn write_balance(mut file: &File, value: i64) -> StoreResult<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(format!("{value}\n").as_bytes())?;
    file.sync_data()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn open_wallet(dir: &tempfile::TempDir) -> Wallet {
        Wallet::open(dir.path().join("wallet.txt")).unwrap()
    }

    #[test]
    fn fresh_wallet_reads_zero() {
        let dir = tempfile::tempdir().unwrap();
        let wallet = open_wallet(&dir);
        assert_eq!(wallet.balance().unwrap(), 0);
    }

    #[test]
    fn set_then_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let wallet = open_wallet(&dir);
        wallet.set_balance(12345).unwrap();
        assert_eq!(wallet.balance().unwrap(), 12345);
    }

    #[test]
    fn reads_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let wallet = open_wallet(&dir);
        wallet.set_balance(77).unwrap();
        assert_eq!(wallet.balance().unwrap(), 77);
        assert_eq!(wallet.balance().unwrap(), 77);
    }

    #[test]
    fn whitespace_only_file_reads_zero() {
        let dir = tempfile::tempdir().unwrap();
        let wallet = open_wallet(&dir);
        fs::write(wallet.path(), "  \n").unwrap();
        assert_eq!(wallet.balance().unwrap(), 0);
    }

    #[test]
    fn overwrite_leaves_exactly_one_line() {
        let dir = tempfile::tempdir().unwrap();
        let wallet = open_wallet(&dir);
        wallet.set_balance(123_456).unwrap();
        wallet.set_balance(7).unwrap();
        assert_eq!(wallet.balance().unwrap(), 7);
        // The shorter value must not leave a stale tail behind.
        assert_eq!(fs::read_to_string(wallet.path()).unwrap(), "7\n");
    }

    #[test]
    fn withdraw_within_balance() {
        let dir = tempfile::tempdir().unwrap();
        let wallet = open_wallet(&dir);
        wallet.set_balance(100).unwrap();
        assert!(wallet.withdraw(60).unwrap());
        assert_eq!(wallet.balance().unwrap(), 40);
    }

    #[test]
    fn withdraw_exact_balance() {
        let dir = tempfile::tempdir().unwrap();
        let wallet = open_wallet(&dir);
        wallet.set_balance(25).unwrap();
        assert!(wallet.withdraw(25).unwrap());
        assert_eq!(wallet.balance().unwrap(), 0);
    }

    #[test]
    fn withdraw_insufficient_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let wallet = open_wallet(&dir);
        wallet.set_balance(50).unwrap();
        assert!(!wallet.withdraw(60).unwrap());
        assert_eq!(wallet.balance().unwrap(), 50);
        assert_eq!(fs::read_to_string(wallet.path()).unwrap(), "50\n");
    }

    #[test]
    fn withdraw_zero_always_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let wallet = open_wallet(&dir);
        assert!(wallet.withdraw(0).unwrap());
        assert_eq!(wallet.balance().unwrap(), 0);
    }

    #[test]
    fn negative_set_rejected_before_io() {
        let dir = tempfile::tempdir().unwrap();
        let wallet = open_wallet(&dir);
        wallet.set_balance(40).unwrap();
        let err = wallet.set_balance(-1).unwrap_err();
        assert!(matches!(err, StoreError::NegativeAmount(-1)));
        assert_eq!(wallet.balance().unwrap(), 40);
    }

    #[test]
    fn negative_withdraw_rejected_before_io() {
        let dir = tempfile::tempdir().unwrap();
        let wallet = open_wallet(&dir);
        wallet.set_balance(40).unwrap();
        let err = wallet.withdraw(-1).unwrap_err();
        assert!(matches!(err, StoreError::NegativeAmount(-1)));
        assert_eq!(wallet.balance().unwrap(), 40);
    }

    #[test]
    fn non_numeric_content_surfaces_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let wallet = open_wallet(&dir);
        fs::write(wallet.path(), "abc\n").unwrap();
        let err = wallet.balance().unwrap_err();
        assert!(matches!(err, StoreError::CorruptBalance { .. }));
    }

    #[test]
    fn negative_on_disk_value_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let wallet = open_wallet(&dir);
        fs::write(wallet.path(), "-5\n").unwrap();
        let err = wallet.balance().unwrap_err();
        assert!(matches!(err, StoreError::CorruptBalance { .. }));
    }

    #[test]
    fn non_utf8_content_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let wallet = open_wallet(&dir);
        fs::write(wallet.path(), [0xFF, 0xFE, 0x0A]).unwrap();
        let err = wallet.balance().unwrap_err();
        assert!(matches!(err, StoreError::CorruptBalance { .. }));
    }

    #[test]
    fn corruption_does_not_reset_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let wallet = open_wallet(&dir);
        fs::write(wallet.path(), "abc\n").unwrap();
        wallet.balance().unwrap_err();
        // The malformed content must survive for inspection.
        assert_eq!(fs::read_to_string(wallet.path()).unwrap(), "abc\n");
    }

    #[test]
    fn close_flushes_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.txt");
        let wallet = Wallet::open(&path).unwrap();
        wallet.set_balance(99).unwrap();
        wallet.close().unwrap();

        let reopened = Wallet::open(&path).unwrap();
        assert_eq!(reopened.balance().unwrap(), 99);
    }

    #[test]
    fn two_handles_on_one_file_observe_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.txt");
        let a = Wallet::open(&path).unwrap();
        let b = Wallet::open(&path).unwrap();

        a.set_balance(30).unwrap();
        assert_eq!(b.balance().unwrap(), 30);
        assert!(b.withdraw(10).unwrap());
        assert_eq!(a.balance().unwrap(), 20);
    }

    #[test]
    fn racing_withdrawals_spend_only_once() {
        let dir = tempfile::tempdir().unwrap();
        let wallet = Arc::new(open_wallet(&dir));
        wallet.set_balance(100).unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let wallet = Arc::clone(&wallet);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    wallet.withdraw(60).unwrap()
                })
            })
            .collect();

        let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results.iter().filter(|&&ok| ok).count(), 1);
        assert_eq!(wallet.balance().unwrap(), 40);
    }

    #[test]
    fn many_racing_withdrawals_settle_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let wallet = Arc::new(open_wallet(&dir));
        wallet.set_balance(50).unwrap();

        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let wallet = Arc::clone(&wallet);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    wallet.withdraw(10).unwrap()
                })
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&ok| ok)
            .count();
        assert_eq!(successes, 5);
        assert_eq!(wallet.balance().unwrap(), 0);
    }
}
