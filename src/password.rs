//! Password hashing utilities.
//!
//! bcrypt with a fixed work factor. Hashing is salted per call, so two
//! hashes of the same input never match; verification compares through
//! bcrypt's own constant-time check.

use bcrypt::{hash, verify};

/// bcrypt work factor for all stored credentials. Changing this only affects
/// newly created hashes; existing hashes carry their own cost.
pub const HASH_COST: u32 = 10;

/// Hash a plaintext password for storage.
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password, HASH_COST)
}

/// Verify a plaintext password against a stored hash.
///
/// Returns `false` for a wrong password *and* for a malformed hash value;
/// callers treat both as a failed credential check.
pub fn verify_password(password: &str, hash: &str) -> bool {
    verify(password, hash).unwrap_or(false)
}
