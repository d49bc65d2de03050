//! Caller fingerprints.
//!
//! A fingerprint is the domain-separated BLAKE3 hash of a DER-encoded public
//! key. Public keys may be supplied PEM-armored (`-----BEGIN PUBLIC KEY-----`,
//! possibly preceded by other bytes such as an MSP identifier) or as hex DER.
//! Both forms of the same key produce the same fingerprint.
//!
//! Extracting the public key from a full X.509 certificate is left to the
//! invocation context; this module only hashes the key itself.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dtl_types::Fingerprint;

use crate::hasher::{ContentHasher, HasherError};

const PEM_BEGIN: &str = "-----BEGIN ";
const PEM_END: &str = "-----END ";
const PEM_DASHES: &str = "-----";

/// Decode a PEM or hex public key into DER bytes.
pub fn public_key_bytes(text: &str) -> Result<Vec<u8>, HasherError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(HasherError::MalformedKey("empty public key".into()));
    }

    if let Some(begin) = text.find(PEM_BEGIN) {
        let after_label = begin + PEM_BEGIN.len();
        let header_end = text[after_label..]
            .find(PEM_DASHES)
            .map(|i| after_label + i + PEM_DASHES.len())
            .ok_or_else(|| HasherError::MalformedKey("unterminated PEM header".into()))?;
        let end = text[header_end..]
            .find(PEM_END)
            .map(|i| header_end + i)
            .ok_or_else(|| HasherError::MalformedKey("missing PEM footer".into()))?;
        let body: String = text[header_end..end]
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        return STANDARD
            .decode(body)
            .map_err(|e| HasherError::MalformedKey(format!("invalid base64 body: {e}")));
    }

    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(compact).map_err(|e| HasherError::MalformedKey(format!("invalid hex key: {e}")))
}

/// Fingerprint of a PEM or hex public key.
pub fn fingerprint_public_key(text: &str) -> Result<Fingerprint, HasherError> {
    let der = public_key_bytes(text)?;
    Ok(Fingerprint::from_raw(ContentHasher::FINGERPRINT.hash(&der)))
}
