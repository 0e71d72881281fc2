/// Password Hashing and Verification
///
/// bcrypt with a fixed work factor. Strength rules for new passwords live in
/// `validators`; this module only refuses input bcrypt cannot represent.

use bcrypt::{hash, verify, BcryptError};
use lazy_static::lazy_static;

use crate::error::CryptoError;

/// 2^12 rounds
pub const HASH_COST: u32 = 12;

/// bcrypt only looks at the first 72 bytes of its input
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Hash a password using bcrypt
///
/// # Errors
/// Returns `CryptoError::Hashing` for empty input, input longer than 72
/// bytes, input containing NUL, or a bcrypt failure.
pub fn hash_password(password: &str) -> Result<String, CryptoError> {
    if password.is_empty() {
        return Err(CryptoError::Hashing("password is empty".to_string()));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(CryptoError::Hashing(format!(
            "password exceeds {} bytes",
            MAX_PASSWORD_BYTES
        )));
    }
    if password.contains('\0') {
        return Err(CryptoError::Hashing("password contains NUL".to_string()));
    }

    hash(password, HASH_COST).map_err(|e| CryptoError::Hashing(e.to_string()))
}

/// Verify a password against its hash
///
/// Returns `Ok(false)` on mismatch. bcrypt compares digests in constant time.
///
/// # Errors
/// Returns `CryptoError::MalformedHash` when `hash` is not a bcrypt digest
pub fn verify_password(password: &str, hash: &str) -> Result<bool, CryptoError> {
    match verify(password, hash) {
        Ok(valid) => Ok(valid),
        Err(
            e @ (BcryptError::InvalidHash(_)
            | BcryptError::InvalidPrefix(_)
            | BcryptError::InvalidCost(_)
            | BcryptError::InvalidBase64(_)),
        ) => Err(CryptoError::MalformedHash(e.to_string())),
        Err(e) => Err(CryptoError::Hashing(e.to_string())),
    }
}

lazy_static! {
    static ref DUMMY_HASH: Option<String> = hash_password("no-such-account").ok();
}

/// Runs one bcrypt verification against a throwaway digest so that a login
/// for an unknown email costs the same as a wrong password.
pub fn verify_dummy_password(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify(password, hash);
    }
}
