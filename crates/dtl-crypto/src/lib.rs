//! Hashing primitives for the Data Token Ledger.
//!
//! Provides domain-separated BLAKE3 hashing, the iterated digest used to
//! store account credentials, and the public-key fingerprint that ties an
//! invocation's caller to an account.
//!
//! All crypto operations wrap established libraries; no custom cryptography.

pub mod fingerprint;
pub mod hasher;
pub mod secret;

pub use fingerprint::{fingerprint_public_key, public_key_bytes};
pub use hasher::{ContentHasher, HasherError};
pub use secret::secret_digest;
