//! File-backed stores for the pouch ledger: a wallet holding a single
//! credit balance and a pocket holding an append-only list of acquired
//! items.
//!
//! Both stores own their backing file for the lifetime of the instance and
//! serialize every operation through an internal mutex. The wallet
//! additionally takes an advisory whole-file lock for the duration of each
//! operation, so cooperating external processes are excluded too.
//!
//! # Design Rules
//!
//! 1. Lock order is always mutex first, then file lock; release is the
//!    reverse, via RAII guards, on every exit path.
//! 2. [`Wallet::withdraw`] runs its read-compare-write sequence under a
//!    single lock hold, so two racing withdrawals can never both spend
//!    the same credits.
//! 3. Corrupt balance content is surfaced, never coerced to zero.
//! 4. Torn pocket lines are returned as-is; higher layers decide.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
mod flock;
pub mod pocket;
pub mod wallet;

pub use error::{StoreError, StoreResult};
pub use pocket::Pocket;
pub use wallet::Wallet;
