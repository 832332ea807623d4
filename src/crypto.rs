//! Invitation token generation and hashing.
//!
//! Plain tokens are random alphanumeric strings; only their SHA-256 digest is
//! persisted. Tokens are high-entropy, so a fast unsalted hash is sufficient and
//! keeps lookups a single indexed equality match.

use rand::Rng;
use rand::distributions::Alphanumeric;
use sha2::{Digest, Sha256};

/// Shortest token the issuer will ever generate.
pub const MIN_TOKEN_LENGTH: usize = 32;

/// Default invitation token length (~238 bits of entropy).
pub const DEFAULT_TOKEN_LENGTH: usize = 40;

/// Generates a random alphanumeric token of `length` characters.
///
/// Lengths below [`MIN_TOKEN_LENGTH`] are raised to it.
///
/// ```rust
/// use tenancy::crypto::generate_token;
///
/// assert_eq!(generate_token(48).len(), 48);
/// assert_eq!(generate_token(8).len(), 32);
/// ```
pub fn generate_token(length: usize) -> String {
    let length = length.max(MIN_TOKEN_LENGTH);
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Hex-encoded SHA-256 digest of a token, as stored in `workspace_invitations`.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
