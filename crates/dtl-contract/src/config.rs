use serde::{Deserialize, Serialize};

/// What a purchase does when writing a receipt fails after payment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReceiptPolicy {
    /// Log the failure and keep going; the payment stands.
    #[default]
    BestEffort,
    /// Fail the purchase so the surrounding transaction discards the payment.
    Strict,
}

/// Contract behavior switches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    /// Receipt write failure handling during a purchase.
    pub receipt_policy: ReceiptPolicy,
    /// When set and the context supplies a caller fingerprint, the buyer's
    /// public key must hash to that fingerprint.
    pub verify_buyer_identity: bool,
    /// Charge identical purchase items in one request only once.
    pub dedup_purchase_items: bool,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            receipt_policy: ReceiptPolicy::BestEffort,
            verify_buyer_identity: false,
            dedup_purchase_items: true,
        }
    }
}

impl ContractConfig {
    /// Atomic receipts and caller verification.
    pub fn strict() -> Self {
        Self {
            receipt_policy: ReceiptPolicy::Strict,
            verify_buyer_identity: true,
            ..Default::default()
        }
    }
}
