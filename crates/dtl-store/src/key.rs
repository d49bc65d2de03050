//! Composite key codec.
//!
//! A composite key is an index name followed by ordered attribute values,
//! each component terminated by U+0000 and the whole key prefixed by U+0000:
//!
//! ```text
//! \0data\0<type>\0<owner>\0<title>\0<hash>\0
//! ```
//!
//! Every key built from the same index name and the same leading attributes
//! shares a byte prefix, so a prefix scan over a partial key enumerates all
//! entries under it. U+0000 and U+10FFFF are reserved and rejected in index
//! names and attributes.

use crate::error::{StoreError, StoreResult};

/// Separator between composite key components.
pub const SEPARATOR: char = '\u{0}';

/// Highest code point; reserved as an upper bound for range scans.
pub const MAX_UNICODE_RUNE: char = '\u{10FFFF}';

fn validate_component(value: &str) -> StoreResult<()> {
    if let Some(c) = value
        .chars()
        .find(|c| *c == SEPARATOR || *c == MAX_UNICODE_RUNE)
    {
        return Err(StoreError::InvalidAttribute {
            attribute: value.to_string(),
            reason: format!("contains reserved code point U+{:04X}", c as u32),
        });
    }
    Ok(())
}

fn encode<A: AsRef<str>>(index: &str, attributes: &[A]) -> StoreResult<String> {
    if index.is_empty() {
        return Err(StoreError::EmptyIndexName);
    }
    validate_component(index)?;

    let mut key = String::with_capacity(
        2 + index.len() + attributes.iter().map(|a| a.as_ref().len() + 1).sum::<usize>(),
    );
    key.push(SEPARATOR);
    key.push_str(index);
    key.push(SEPARATOR);
    for attribute in attributes {
        let attribute = attribute.as_ref();
        validate_component(attribute)?;
        key.push_str(attribute);
        key.push(SEPARATOR);
    }
    Ok(key)
}

/// Build the full composite key for an entry.
pub fn create_composite_key<A: AsRef<str>>(index: &str, attributes: &[A]) -> StoreResult<String> {
    encode(index, attributes)
}

/// Build the scan prefix for a leading subset of attributes.
///
/// An empty attribute slice yields the prefix covering the whole index.
pub fn partial_composite_key<A: AsRef<str>>(index: &str, attributes: &[A]) -> StoreResult<String> {
    encode(index, attributes)
}

/// Split a composite key back into its index name and attributes.
pub fn split_composite_key(key: &str) -> StoreResult<(String, Vec<String>)> {
    let body = key
        .strip_prefix(SEPARATOR)
        .and_then(|rest| rest.strip_suffix(SEPARATOR))
        .ok_or_else(|| StoreError::MalformedKey(key.to_string()))?;

    let mut components = body.split(SEPARATOR);
    let index = match components.next() {
        Some(index) if !index.is_empty() => index.to_string(),
        _ => return Err(StoreError::MalformedKey(key.to_string())),
    };
    Ok((index, components.map(str::to_string).collect()))
}

/// Whether a state key was produced by the composite key codec.
pub fn is_composite_key(key: &str) -> bool {
    key.starts_with(SEPARATOR)
}
