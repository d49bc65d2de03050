//! Index names and attribute orders of the contract's composite keys.
//!
//! | index      | attributes                     |
//! |------------|--------------------------------|
//! | `data`     | `[type, owner, title, hash]`   |
//! | `title`    | `[type, owner, title]`         |
//! | `transfer` | `[buyer, type, owner, title]`  |
//! | `account`  | `[name]`                       |

use dtl_store::{split_composite_key, StoreError};
use serde::de::DeserializeOwned;

use crate::error::{ContractError, ContractResult};

pub const DATA_INDEX: &str = "data";
pub const TITLE_INDEX: &str = "title";
pub const TRANSFER_INDEX: &str = "transfer";
pub const ACCOUNT_INDEX: &str = "account";

/// Human-readable form of a key's attributes, for error messages and logs.
pub(crate) fn describe<A: AsRef<str>>(index: &str, attributes: &[A]) -> String {
    let parts: Vec<&str> = attributes.iter().map(AsRef::as_ref).collect();
    format!("{index}:{}", parts.join("/"))
}

/// Split a scanned key and check it carries exactly `expected` attributes.
pub(crate) fn split_expecting(key: &str, expected: usize) -> ContractResult<Vec<String>> {
    let (_, attributes) = split_composite_key(key)?;
    if attributes.len() != expected {
        return Err(StoreError::MalformedKey(key.to_string()).into());
    }
    Ok(attributes)
}

/// Decode a scanned JSON value.
pub(crate) fn decode<T: DeserializeOwned>(key: &str, value: &[u8]) -> ContractResult<T> {
    serde_json::from_slice(value).map_err(|e| {
        ContractError::from(StoreError::Serialization(format!(
            "decoding {}: {e}",
            key.escape_debug()
        )))
    })
}
