use std::path::PathBuf;

/// Errors from wallet and pocket operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O failure on the backing file, including lock acquisition.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The balance file holds something other than a non-negative integer.
    #[error("corrupt balance file {path}: {content:?} is not a non-negative integer")]
    CorruptBalance { path: PathBuf, content: String },

    /// Caller supplied a negative balance or withdrawal amount.
    #[error("negative amount: {0}")]
    NegativeAmount(i64),

    /// Item text contains a line terminator and would break line framing.
    #[error("item name contains a line terminator: {0:?}")]
    InvalidItemName(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
