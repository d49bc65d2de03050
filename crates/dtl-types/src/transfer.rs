use serde::{Deserialize, Serialize};

use crate::data::{DataCore, DataType};

/// Proof of purchase stored under the `transfer` index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// Hash of the data item that was paid for.
    pub hash: String,
    /// Per-record price charged.
    pub price: i64,
    /// Transaction timestamp, seconds since epoch.
    pub time: i64,
    /// Number of records paid for.
    pub size: i64,
}

impl TransferReceipt {
    /// Total amount this receipt represents.
    pub fn amount(&self) -> Option<i64> {
        self.price.checked_mul(self.size)
    }
}

/// Purchase payload: `{buyer, data:[{type,owner,title,hash}]}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub buyer: String,
    #[serde(default)]
    pub data: Vec<DataCore>,
}

/// One receipt as returned by a buyer's purchase history query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecordView {
    pub buyer: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub owner: String,
    pub title: String,
    pub record: TransferReceipt,
}

/// A title/hash pair in an entitlement check. `extend` is filled in on the
/// way out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadTitle {
    pub title: String,
    pub hash: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub extend: String,
}

impl DownloadTitle {
    pub fn new(title: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            hash: hash.into(),
            extend: String::new(),
        }
    }
}

/// Entitlement check payload: `{buyer, type, owner, data:[{title,hash}]}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferCheckRequest {
    pub buyer: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub owner: String,
    #[serde(default)]
    pub data: Vec<DownloadTitle>,
}

impl TransferCheckRequest {
    /// The evidence identity of one requested item.
    pub fn data_core(&self, item: &DownloadTitle) -> DataCore {
        DataCore::new(
            self.data_type,
            self.owner.clone(),
            item.title.clone(),
            item.hash.clone(),
        )
    }
}

/// Entitlement check result: the items the buyer is entitled to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferCheckResponse {
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub owner: String,
    pub data: Vec<DownloadTitle>,
}
