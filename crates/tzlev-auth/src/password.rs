//! Password hashing and verification.
//!
//! bcrypt with a fixed cost of 12: expensive enough to resist offline brute
//! force, cheap enough for interactive login latency.

use crate::error::{AuthError, AuthResult};

/// bcrypt work factor applied to every new hash.
const HASH_COST: u32 = 12;

/// Hashes a plaintext password.
///
/// # Errors
///
/// Returns [`AuthError::Internal`] if hashing fails (effectively only under
/// RNG failure).
pub fn hash_password(plain: &str) -> AuthResult<String> {
    bcrypt::hash(plain, HASH_COST)
        .map_err(|e| AuthError::internal(format!("Failed to hash password: {e}")))
}

/// Verifies a plaintext password against a stored hash.
///
/// A wrong password and a malformed hash both return `false`; the caller
/// never learns which it was.
#[must_use]
pub fn verify_password(plain: &str, hash: &str) -> bool {
    bcrypt::verify(plain, hash).unwrap_or(false)
}
