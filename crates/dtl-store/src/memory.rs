//! In-memory transactional ledger.
//!
//! [`InMemoryLedger`] keeps committed world state in a `BTreeMap` behind a
//! `RwLock`, with a version number per key. [`LedgerTransaction`] buffers
//! writes, serves reads from its own buffer first, and records the version
//! of every committed key it read. Commit re-validates those versions and
//! fails with [`StoreError::Conflict`] if another transaction changed any of
//! them in the meantime. Dropping an uncommitted transaction discards its
//! writes.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Mutex, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::traits::{KeyValue, LedgerStore, StateIterator};

#[derive(Clone, Debug, PartialEq, Eq)]
struct VersionedValue {
    value: Vec<u8>,
    version: u64,
}

#[derive(Debug, Default)]
struct WorldState {
    entries: BTreeMap<String, VersionedValue>,
    height: u64,
}

impl WorldState {
    fn version_of(&self, key: &str) -> u64 {
        self.entries.get(key).map_or(0, |v| v.version)
    }

    fn versions_under(&self, prefix: &str) -> Vec<(String, u64)> {
        self.entries
            .range::<str, _>((std::ops::Bound::Included(prefix), std::ops::Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.version))
            .collect()
    }

    fn scan(&self, prefix: &str) -> Vec<KeyValue> {
        self.entries
            .range::<str, _>((std::ops::Bound::Included(prefix), std::ops::Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.value.clone()))
            .collect()
    }

    /// Apply a write set as one block and return the new height.
    fn apply(&mut self, writes: BTreeMap<String, Option<Vec<u8>>>) -> u64 {
        self.height += 1;
        let version = self.height;
        for (key, write) in writes {
            match write {
                Some(value) => {
                    self.entries.insert(key, VersionedValue { value, version });
                }
                None => {
                    self.entries.remove(&key);
                }
            }
        }
        self.height
    }
}

fn check_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(StoreError::EmptyKey);
    }
    Ok(())
}

/// Committed ledger world state held in memory.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RwLock<WorldState>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transaction against the current committed state.
    pub fn begin(&self) -> LedgerTransaction<'_> {
        LedgerTransaction {
            ledger: self,
            buffer: Mutex::new(TxBuffer::default()),
        }
    }

    /// Number of committed blocks.
    pub fn height(&self) -> StoreResult<u64> {
        Ok(self.read()?.height)
    }

    /// Number of keys in committed state.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.entries.len())
    }

    /// Whether committed state is empty.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Capture committed state.
    ///
    /// Values must be UTF-8; contract state is always JSON.
    pub fn snapshot(&self) -> StoreResult<LedgerSnapshot> {
        let state = self.read()?;
        let entries = state
            .entries
            .iter()
            .map(|(key, v)| {
                let value = String::from_utf8(v.value.clone()).map_err(|_| {
                    StoreError::Serialization(format!("value under {key:?} is not UTF-8"))
                })?;
                Ok(SnapshotEntry {
                    key: key.clone(),
                    version: v.version,
                    value,
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(LedgerSnapshot {
            height: state.height,
            entries,
        })
    }

    /// Rebuild a ledger from a snapshot.
    pub fn restore(snapshot: LedgerSnapshot) -> Self {
        let entries = snapshot
            .entries
            .into_iter()
            .map(|e| {
                (
                    e.key,
                    VersionedValue {
                        value: e.value.into_bytes(),
                        version: e.version,
                    },
                )
            })
            .collect();
        Self {
            state: RwLock::new(WorldState {
                entries,
                height: snapshot.height,
            }),
        }
    }

    /// Load a ledger from a JSON snapshot file. A missing file yields an
    /// empty ledger.
    pub fn load(path: &Path) -> StoreResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no state file, starting empty");
            return Ok(Self::new());
        }
        let bytes = std::fs::read(path)?;
        let snapshot: LedgerSnapshot = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Serialization(format!("{}: {e}", path.display())))?;
        tracing::debug!(
            path = %path.display(),
            keys = snapshot.entries.len(),
            height = snapshot.height,
            "loaded state file"
        );
        Ok(Self::restore(snapshot))
    }

    /// Write committed state to a JSON snapshot file.
    ///
    /// The file is written beside the target and renamed into place.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let snapshot = self.snapshot()?;
        let bytes = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, path)?;
        tracing::debug!(path = %path.display(), keys = snapshot.entries.len(), "saved state file");
        Ok(())
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, WorldState>> {
        self.state.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, WorldState>> {
        self.state.write().map_err(|_| StoreError::LockPoisoned)
    }
}

/// Direct access commits every write immediately as its own block.
impl LedgerStore for InMemoryLedger {
    fn get_state(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        check_key(key)?;
        Ok(self.read()?.entries.get(key).map(|v| v.value.clone()))
    }

    fn put_state(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        check_key(key)?;
        let mut writes = BTreeMap::new();
        writes.insert(key.to_string(), Some(value.to_vec()));
        self.write()?.apply(writes);
        Ok(())
    }

    fn del_state(&self, key: &str) -> StoreResult<()> {
        check_key(key)?;
        let mut writes = BTreeMap::new();
        writes.insert(key.to_string(), None);
        self.write()?.apply(writes);
        Ok(())
    }

    fn scan_prefix(&self, prefix: &str) -> StoreResult<StateIterator<'_>> {
        Ok(StateIterator::from_entries(self.read()?.scan(prefix)))
    }
}

/// Serializable image of committed ledger state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub height: u64,
    pub entries: Vec<SnapshotEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub key: String,
    pub version: u64,
    pub value: String,
}

#[derive(Debug, Default)]
struct TxBuffer {
    /// `None` marks a buffered delete.
    writes: BTreeMap<String, Option<Vec<u8>>>,
    /// Committed version observed on first read; 0 when absent.
    reads: HashMap<String, u64>,
    /// Committed key versions observed by each prefix scan.
    ranges: Vec<(String, Vec<(String, u64)>)>,
}

/// A unit of work against an [`InMemoryLedger`].
///
/// Nothing is visible outside the transaction until [`commit`] succeeds.
///
/// [`commit`]: LedgerTransaction::commit
#[derive(Debug)]
pub struct LedgerTransaction<'a> {
    ledger: &'a InMemoryLedger,
    buffer: Mutex<TxBuffer>,
}

impl<'a> LedgerTransaction<'a> {
    fn buffer(&self) -> StoreResult<std::sync::MutexGuard<'_, TxBuffer>> {
        self.buffer.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Number of buffered writes and deletes.
    pub fn pending_writes(&self) -> StoreResult<usize> {
        Ok(self.buffer()?.writes.len())
    }

    /// Validate the read set and apply buffered writes atomically.
    ///
    /// Returns the block height the writes were committed at. A transaction
    /// with no writes commits without advancing the height.
    pub fn commit(self) -> StoreResult<u64> {
        let buffer = self
            .buffer
            .into_inner()
            .map_err(|_| StoreError::LockPoisoned)?;
        let mut state = self.ledger.write()?;

        for (key, seen) in &buffer.reads {
            if state.version_of(key) != *seen {
                tracing::warn!(key = %key.escape_debug(), "read conflict at commit");
                return Err(StoreError::Conflict(key.clone()));
            }
        }
        for (prefix, seen) in &buffer.ranges {
            if state.versions_under(prefix) != *seen {
                tracing::warn!(prefix = %prefix.escape_debug(), "range conflict at commit");
                return Err(StoreError::Conflict(prefix.clone()));
            }
        }

        if buffer.writes.is_empty() {
            return Ok(state.height);
        }
        let count = buffer.writes.len();
        let height = state.apply(buffer.writes);
        tracing::debug!(height, writes = count, "transaction committed");
        Ok(height)
    }

    /// Discard buffered writes.
    pub fn rollback(self) {
        if let Ok(buffer) = self.buffer.lock() {
            tracing::debug!(writes = buffer.writes.len(), "transaction rolled back");
        }
    }
}

impl LedgerStore for LedgerTransaction<'_> {
    fn get_state(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        check_key(key)?;
        let mut buffer = self.buffer()?;
        if let Some(write) = buffer.writes.get(key) {
            return Ok(write.clone());
        }
        let state = self.ledger.read()?;
        let committed = state.entries.get(key);
        buffer
            .reads
            .entry(key.to_string())
            .or_insert_with(|| committed.map_or(0, |v| v.version));
        Ok(committed.map(|v| v.value.clone()))
    }

    fn put_state(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        check_key(key)?;
        self.buffer()?
            .writes
            .insert(key.to_string(), Some(value.to_vec()));
        Ok(())
    }

    fn del_state(&self, key: &str) -> StoreResult<()> {
        check_key(key)?;
        self.buffer()?.writes.insert(key.to_string(), None);
        Ok(())
    }

    fn scan_prefix(&self, prefix: &str) -> StoreResult<StateIterator<'_>> {
        let mut buffer = self.buffer()?;
        let state = self.ledger.read()?;

        let mut merged: BTreeMap<String, Vec<u8>> = state.scan(prefix).into_iter().collect();
        buffer
            .ranges
            .push((prefix.to_string(), state.versions_under(prefix)));
        for (key, write) in buffer
            .writes
            .range::<str, _>((std::ops::Bound::Included(prefix), std::ops::Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            match write {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(StateIterator::from_entries(merged.into_iter().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::StateExt;

    fn collect(iter: StateIterator<'_>) -> Vec<KeyValue> {
        iter.collect::<StoreResult<Vec<_>>>().unwrap()
    }

    // ---- Direct access ----

    #[test]
    fn direct_put_get_delete() {
        let ledger = InMemoryLedger::new();
        assert!(ledger.get_state("a").unwrap().is_none());
        ledger.put_state("a", b"1").unwrap();
        assert_eq!(ledger.get_state("a").unwrap(), Some(b"1".to_vec()));
        ledger.del_state("a").unwrap();
        assert!(ledger.get_state("a").unwrap().is_none());
        assert_eq!(ledger.height().unwrap(), 2);
    }

    #[test]
    fn empty_key_rejected() {
        let ledger = InMemoryLedger::new();
        assert!(matches!(ledger.put_state("", b"x"), Err(StoreError::EmptyKey)));
        assert!(matches!(ledger.begin().get_state(""), Err(StoreError::EmptyKey)));
    }

    #[test]
    fn scan_is_ordered_and_bounded() {
        let ledger = InMemoryLedger::new();
        for key in ["p/b", "p/a", "q/a", "p/c", "o/z"] {
            ledger.put_state(key, key.as_bytes()).unwrap();
        }
        let keys: Vec<String> = collect(ledger.scan_prefix("p/").unwrap())
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["p/a", "p/b", "p/c"]);
    }

    // ---- Transactions ----

    #[test]
    fn writes_invisible_until_commit() {
        let ledger = InMemoryLedger::new();
        let tx = ledger.begin();
        tx.put_state("k", b"v").unwrap();
        assert!(ledger.get_state("k").unwrap().is_none());
        assert_eq!(tx.pending_writes().unwrap(), 1);
        tx.commit().unwrap();
        assert_eq!(ledger.get_state("k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn read_your_writes() {
        let ledger = InMemoryLedger::new();
        ledger.put_state("k", b"old").unwrap();
        let tx = ledger.begin();
        tx.put_state("k", b"new").unwrap();
        assert_eq!(tx.get_state("k").unwrap(), Some(b"new".to_vec()));
        tx.del_state("k").unwrap();
        assert!(tx.get_state("k").unwrap().is_none());
    }

    #[test]
    fn drop_rolls_back() {
        let ledger = InMemoryLedger::new();
        {
            let tx = ledger.begin();
            tx.put_state("k", b"v").unwrap();
        }
        let tx = ledger.begin();
        tx.put_state("j", b"v").unwrap();
        tx.rollback();
        assert!(ledger.is_empty().unwrap());
        assert_eq!(ledger.height().unwrap(), 0);
    }

    #[test]
    fn scan_merges_buffered_writes() {
        let ledger = InMemoryLedger::new();
        ledger.put_state("p/a", b"1").unwrap();
        ledger.put_state("p/b", b"2").unwrap();

        let tx = ledger.begin();
        tx.del_state("p/a").unwrap();
        tx.put_state("p/c", b"3").unwrap();
        tx.put_state("p/b", b"20").unwrap();

        let got = collect(tx.scan_prefix("p/").unwrap());
        assert_eq!(
            got,
            vec![
                ("p/b".to_string(), b"20".to_vec()),
                ("p/c".to_string(), b"3".to_vec()),
            ]
        );
    }

    #[test]
    fn stale_read_conflicts() {
        let ledger = InMemoryLedger::new();
        ledger.put_state("balance", b"10").unwrap();

        let first = ledger.begin();
        let second = ledger.begin();
        first.get_state("balance").unwrap();
        second.get_state("balance").unwrap();
        first.put_state("balance", b"5").unwrap();
        second.put_state("balance", b"7").unwrap();

        first.commit().unwrap();
        assert!(matches!(second.commit(), Err(StoreError::Conflict(k)) if k == "balance"));
        assert_eq!(ledger.get_state("balance").unwrap(), Some(b"5".to_vec()));
    }

    #[test]
    fn absent_read_conflicts_with_concurrent_create() {
        let ledger = InMemoryLedger::new();
        let tx = ledger.begin();
        assert!(tx.get_state("alice").unwrap().is_none());
        tx.put_state("alice", b"mine").unwrap();

        ledger.put_state("alice", b"theirs").unwrap();
        assert!(matches!(tx.commit(), Err(StoreError::Conflict(_))));
    }

    #[test]
    fn phantom_in_scanned_range_conflicts() {
        let ledger = InMemoryLedger::new();
        ledger.put_state("p/a", b"1").unwrap();
        let tx = ledger.begin();
        assert_eq!(collect(tx.scan_prefix("p/").unwrap()).len(), 1);
        tx.put_state("other", b"x").unwrap();

        ledger.put_state("p/b", b"2").unwrap();
        assert!(matches!(tx.commit(), Err(StoreError::Conflict(p)) if p == "p/"));
    }

    #[test]
    fn blind_writes_do_not_conflict() {
        let ledger = InMemoryLedger::new();
        let tx = ledger.begin();
        tx.put_state("k", b"tx").unwrap();
        ledger.put_state("k", b"direct").unwrap();
        tx.commit().unwrap();
        assert_eq!(ledger.get_state("k").unwrap(), Some(b"tx".to_vec()));
    }

    #[test]
    fn read_only_commit_keeps_height() {
        let ledger = InMemoryLedger::new();
        ledger.put_state("k", b"v").unwrap();
        let tx = ledger.begin();
        tx.get_state("k").unwrap();
        assert_eq!(tx.commit().unwrap(), 1);
        assert_eq!(ledger.height().unwrap(), 1);
    }

    // ---- Typed helpers ----

    #[test]
    fn json_and_composite_helpers() {
        let ledger = InMemoryLedger::new();
        let tx = ledger.begin();
        tx.put_json("acct", &serde_json::json!({"token": 5})).unwrap();
        let v: serde_json::Value = tx.get_json("acct").unwrap().unwrap();
        assert_eq!(v["token"], 5);

        tx.put_composite_json("title", &["1", "alice", "t1"], &5).unwrap();
        tx.put_composite_json("title", &["1", "bob", "t2"], &6).unwrap();
        let t1: Option<i64> = tx.get_composite_json("title", &["1", "alice", "t1"]).unwrap();
        assert_eq!(t1, Some(5));
        let missing: Option<i64> = tx.get_composite_json("title", &["1", "carol", "t3"]).unwrap();
        assert!(missing.is_none());
        let under_alice = collect(tx.scan_partial_composite("title", &["1", "alice"]).unwrap());
        assert_eq!(under_alice.len(), 1);
    }

    #[test]
    fn get_json_reports_corrupt_value() {
        let ledger = InMemoryLedger::new();
        ledger.put_state("k", b"not json").unwrap();
        let got: StoreResult<Option<serde_json::Value>> = ledger.get_json("k");
        assert!(matches!(got, Err(StoreError::Serialization(_))));
    }

    // ---- Snapshots ----

    #[test]
    fn snapshot_restore_preserves_state_and_versions() {
        let ledger = InMemoryLedger::new();
        ledger.put_state("\u{0}data\u{0}1\u{0}", b"{\"size\":1}").unwrap();
        ledger.put_state("alice", b"{}").unwrap();

        let snapshot = ledger.snapshot().unwrap();
        let json = serde_json::to_string(&snapshot).unwrap();
        let restored = InMemoryLedger::restore(serde_json::from_str(&json).unwrap());

        assert_eq!(restored.height().unwrap(), 2);
        assert_eq!(restored.snapshot().unwrap(), snapshot);
        assert_eq!(restored.get_state("alice").unwrap(), Some(b"{}".to_vec()));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        assert!(InMemoryLedger::load(&path).unwrap().is_empty().unwrap());

        let ledger = InMemoryLedger::new();
        ledger.put_state("\u{0}account\u{0}alice\u{0}", b"{\"token\":5}").unwrap();
        ledger.save(&path).unwrap();

        let loaded = InMemoryLedger::load(&path).unwrap();
        assert_eq!(loaded.snapshot().unwrap(), ledger.snapshot().unwrap());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "[").unwrap();
        assert!(matches!(InMemoryLedger::load(&path), Err(StoreError::Serialization(_))));
    }

    #[test]
    fn snapshot_rejects_binary_values() {
        let ledger = InMemoryLedger::new();
        ledger.put_state("k", &[0xff, 0xfe]).unwrap();
        assert!(matches!(ledger.snapshot(), Err(StoreError::Serialization(_))));
    }
}
