//! Ledger state access for the Data Token Ledger.
//!
//! Contract logic reads and writes world state through the [`LedgerStore`]
//! trait. This crate provides:
//!
//! - the composite key codec ([`create_composite_key`],
//!   [`partial_composite_key`], [`split_composite_key`]) used to build
//!   prefix-scannable secondary indexes
//! - [`InMemoryLedger`], committed state with per-key versions, and
//!   [`LedgerTransaction`], a buffered unit of work with read-your-writes
//!   and commit-time conflict detection
//! - [`TxContext`], the per-invocation caller identity and timestamp
//!
//! # Design Rules
//!
//! 1. Scans yield keys in ascending byte order.
//! 2. A transaction's writes are invisible to others until commit.
//! 3. Commit fails if any key or range the transaction read has changed.
//! 4. U+0000 and U+10FFFF never appear inside a composite key component.

pub mod context;
pub mod error;
pub mod key;
pub mod memory;
pub mod traits;

pub use context::{StaticContext, TxContext};
pub use error::{StoreError, StoreResult};
pub use key::{create_composite_key, is_composite_key, partial_composite_key, split_composite_key};
pub use memory::{InMemoryLedger, LedgerSnapshot, LedgerTransaction, SnapshotEntry};
pub use traits::{KeyValue, LedgerStore, StateExt, StateIterator};
