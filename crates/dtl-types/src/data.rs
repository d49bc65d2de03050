use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Numeric data category. Encoded as its decimal string inside composite keys.
pub type DataType = i32;

/// Parse a data type from its key/argument form.
pub fn parse_data_type(s: &str) -> Result<DataType, TypeError> {
    s.trim()
        .parse::<DataType>()
        .map_err(|_| TypeError::InvalidDataType(s.to_string()))
}

/// Identity of one evidenced data item: `(type, owner, title, hash)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DataCore {
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub owner: String,
    pub title: String,
    pub hash: String,
}

impl DataCore {
    pub fn new(
        data_type: DataType,
        owner: impl Into<String>,
        title: impl Into<String>,
        hash: impl Into<String>,
    ) -> Self {
        Self {
            data_type,
            owner: owner.into(),
            title: title.into(),
            hash: hash.into(),
        }
    }

    /// Attributes of the `data` index: `[type, owner, title, hash]`.
    pub fn data_attributes(&self) -> Vec<String> {
        vec![
            self.data_type.to_string(),
            self.owner.clone(),
            self.title.clone(),
            self.hash.clone(),
        ]
    }

    /// Attributes of the `title` index: `[type, owner, title]`.
    pub fn title_attributes(&self) -> Vec<String> {
        vec![
            self.data_type.to_string(),
            self.owner.clone(),
            self.title.clone(),
        ]
    }

    /// Attributes of the `transfer` index: `[buyer, type, owner, title]`.
    pub fn transfer_attributes(&self, buyer: &str) -> Vec<String> {
        vec![
            buyer.to_string(),
            self.data_type.to_string(),
            self.owner.clone(),
            self.title.clone(),
        ]
    }
}

/// Evidence value stored under a [`DataCore`] key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataDescription {
    /// Number of records covered by the hash.
    pub size: i64,
    /// Opaque seller metadata, usually JSON.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub extend: String,
}

impl DataDescription {
    pub fn new(size: i64) -> Self {
        Self {
            size,
            extend: String::new(),
        }
    }

    pub fn with_extend(mut self, extend: impl Into<String>) -> Self {
        self.extend = extend.into();
        self
    }
}

/// Data registration payload: `{core, description}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRequest {
    pub core: DataCore,
    pub description: DataDescription,
}
