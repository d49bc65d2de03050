use sha2::{Digest, Sha512};

use crate::hasher::ContentHasher;

/// SHA-512 rounds applied before the final domain-separated hash.
pub const SECRET_ROUNDS: usize = 3;

/// Digest of an account's authentication material, as stored in the ledger.
///
/// The raw secret is never persisted. The digest is salted with the account
/// name so two accounts with the same password store different values.
pub fn secret_digest(account: &str, secret: &str) -> String {
    let mut middle = Sha512::new()
        .chain_update(account.as_bytes())
        .chain_update(b":")
        .chain_update(secret.as_bytes())
        .finalize()
        .to_vec();
    for _ in 1..SECRET_ROUNDS {
        middle = Sha512::digest(&middle).to_vec();
    }
    ContentHasher::SECRET.hash_hex(&middle)
}
