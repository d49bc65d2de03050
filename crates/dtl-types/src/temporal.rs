use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Ledger transaction timestamp.
///
/// Every node executing the same transaction sees the same timestamp: it is
/// assigned by the client that proposed the transaction, not read from the
/// executing node's clock. Receipts record [`TxTimestamp::seconds`].
///
/// Ordering: `seconds` → `nanos` (total order).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxTimestamp {
    /// Seconds since UNIX epoch.
    pub seconds: i64,
    /// Sub-second component.
    pub nanos: u32,
}

impl TxTimestamp {
    /// Create a timestamp with explicit values.
    pub fn new(seconds: i64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    /// Create a timestamp with whole seconds only.
    pub fn from_unix_seconds(seconds: i64) -> Self {
        Self { seconds, nanos: 0 }
    }

    /// Create a timestamp for the current wall-clock time.
    ///
    /// Only transaction proposers should call this; contract code reads the
    /// timestamp from its invocation context.
    pub fn now() -> Self {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self {
            seconds: elapsed.as_secs() as i64,
            nanos: elapsed.subsec_nanos(),
        }
    }

    /// The zero timestamp (UNIX epoch).
    pub const fn zero() -> Self {
        Self {
            seconds: 0,
            nanos: 0,
        }
    }

    /// Seconds since UNIX epoch.
    pub fn as_unix_seconds(&self) -> i64 {
        self.seconds
    }
}

impl Default for TxTimestamp {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Debug for TxTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxTimestamp({}s.{:09})", self.seconds, self.nanos)
    }
}

impl fmt::Display for TxTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}
