//! Invocation context: who is calling and when.

use dtl_types::{Fingerprint, TxTimestamp};

/// Per-transaction facts supplied by the host platform.
pub trait TxContext {
    /// Transaction identifier.
    fn tx_id(&self) -> &str;

    /// Transaction timestamp. Purchase receipts record it as their time.
    fn timestamp(&self) -> TxTimestamp;

    /// Fingerprint of the caller's public key, if the host could derive one.
    fn caller_fingerprint(&self) -> Option<Fingerprint>;
}

/// A fixed [`TxContext`], used by the CLI and tests.
#[derive(Clone, Debug, Default)]
pub struct StaticContext {
    tx_id: String,
    timestamp: TxTimestamp,
    fingerprint: Option<Fingerprint>,
}

impl StaticContext {
    pub fn new(tx_id: impl Into<String>, timestamp: TxTimestamp) -> Self {
        Self {
            tx_id: tx_id.into(),
            timestamp,
            ..Self::default()
        }
    }

    pub fn with_fingerprint(mut self, fingerprint: Fingerprint) -> Self {
        self.fingerprint = Some(fingerprint);
        self
    }
}

impl TxContext for StaticContext {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }

    fn timestamp(&self) -> TxTimestamp {
        self.timestamp
    }

    fn caller_fingerprint(&self) -> Option<Fingerprint> {
        self.fingerprint
    }
}
