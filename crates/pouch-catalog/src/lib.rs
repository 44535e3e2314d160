//! Product catalog for the pouch ledger.
//!
//! The catalog is a pure price lookup consumed by the shopping flow. It
//! never touches the wallet or pocket stores and has no failure mode beyond
//! "unknown product", signalled as `None`.

pub mod catalog;

pub use catalog::{Catalog, InMemoryCatalog, Product};
