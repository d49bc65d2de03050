/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g., `"dtl-fingerprint-v1"`) that is
/// prepended to every hash computation, so a fingerprint and a credential
/// digest over identical bytes never collide.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for caller public-key fingerprints.
    pub const FINGERPRINT: Self = Self {
        domain: "dtl-fingerprint-v1",
    };
    /// Hasher for account credential digests.
    pub const SECRET: Self = Self {
        domain: "dtl-secret-v1",
    };

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        *hasher.finalize().as_bytes()
    }

    /// Hex-encoded [`ContentHasher::hash`].
    pub fn hash_hex(&self, data: &[u8]) -> String {
        hex::encode(self.hash(data))
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("malformed public key: {0}")]
    MalformedKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let data = b"hello world";
        assert_eq!(
            ContentHasher::FINGERPRINT.hash(data),
            ContentHasher::FINGERPRINT.hash(data)
        );
    }

    #[test]
    fn different_domains_produce_different_hashes() {
        let data = b"same content";
        assert_ne!(
            ContentHasher::FINGERPRINT.hash(data),
            ContentHasher::SECRET.hash(data)
        );
    }

    #[test]
    fn domain_is_prefixed() {
        let expected = blake3::hash(b"dtl-secret-v1:x");
        assert_eq!(ContentHasher::SECRET.hash(b"x"), *expected.as_bytes());
        assert_eq!(ContentHasher::SECRET.hash_hex(b"x"), expected.to_hex().to_string());
    }
}
