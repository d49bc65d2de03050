//! The [`LedgerStore`] trait and typed helpers layered on top of it.
//!
//! Contract logic talks to ledger state only through this trait: reads,
//! buffered writes, deletes, and ordered prefix scans. Backends may be the
//! in-memory transactional ledger in this crate or a host platform's
//! transaction stub.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{StoreError, StoreResult};
use crate::key::{create_composite_key, partial_composite_key};

/// One key/value pair yielded by a scan.
pub type KeyValue = (String, Vec<u8>);

/// Iterator over the results of a prefix scan, in ascending key order.
///
/// Backends that hold resources for the duration of a scan release them
/// when the iterator is dropped.
pub struct StateIterator<'a> {
    inner: Box<dyn Iterator<Item = StoreResult<KeyValue>> + 'a>,
}

impl<'a> StateIterator<'a> {
    /// Wrap a backend iterator.
    pub fn new(inner: impl Iterator<Item = StoreResult<KeyValue>> + 'a) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }

    /// Iterator over an already materialized result set.
    pub fn from_entries(entries: Vec<KeyValue>) -> Self {
        Self::new(entries.into_iter().map(Ok))
    }
}

impl Iterator for StateIterator<'_> {
    type Item = StoreResult<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl std::fmt::Debug for StateIterator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateIterator").finish_non_exhaustive()
    }
}

/// Transactional key/value access to ledger world state.
///
/// Within one transaction, reads observe the transaction's own earlier
/// writes. Writes become visible to other transactions only when the
/// transaction commits.
pub trait LedgerStore {
    /// Read a value. Returns `Ok(None)` if the key does not exist.
    fn get_state(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Create or overwrite a value.
    fn put_state(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Delete a value. Deleting an absent key is not an error.
    fn del_state(&self, key: &str) -> StoreResult<()>;

    /// Scan all keys starting with `prefix`, in ascending key order.
    fn scan_prefix(&self, prefix: &str) -> StoreResult<StateIterator<'_>>;
}

impl<S: LedgerStore + ?Sized> LedgerStore for &S {
    fn get_state(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        (**self).get_state(key)
    }

    fn put_state(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        (**self).put_state(key, value)
    }

    fn del_state(&self, key: &str) -> StoreResult<()> {
        (**self).del_state(key)
    }

    fn scan_prefix(&self, prefix: &str) -> StoreResult<StateIterator<'_>> {
        (**self).scan_prefix(prefix)
    }
}

/// Typed JSON and composite-key helpers available on every [`LedgerStore`].
pub trait StateExt: LedgerStore {
    /// Read and decode a JSON value.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        match self.get_state(key)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StoreError::Serialization(format!("decoding {key:?}: {e}"))),
            None => Ok(None),
        }
    }

    /// Encode and write a JSON value.
    fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| StoreError::Serialization(format!("encoding {key:?}: {e}")))?;
        self.put_state(key, &bytes)
    }

    /// Read and decode a JSON value stored under a composite key.
    fn get_composite_json<T: DeserializeOwned, A: AsRef<str>>(
        &self,
        index: &str,
        attributes: &[A],
    ) -> StoreResult<Option<T>> {
        let key = create_composite_key(index, attributes)?;
        self.get_json(&key)
    }

    /// Encode and write a JSON value under a composite key.
    fn put_composite_json<T: Serialize + ?Sized, A: AsRef<str>>(
        &self,
        index: &str,
        attributes: &[A],
        value: &T,
    ) -> StoreResult<()> {
        let key = create_composite_key(index, attributes)?;
        self.put_json(&key, value)
    }

    /// Scan every entry under a partial composite key.
    fn scan_partial_composite<A: AsRef<str>>(
        &self,
        index: &str,
        attributes: &[A],
    ) -> StoreResult<StateIterator<'_>> {
        let prefix = partial_composite_key(index, attributes)?;
        self.scan_prefix(&prefix)
    }
}

impl<S: LedgerStore + ?Sized> StateExt for S {}
