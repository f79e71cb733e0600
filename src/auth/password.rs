use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::error;

#[cfg(test)]
pub(crate) static DUMMY_VERIFICATIONS: std::sync::atomic::AtomicUsize =
    std::sync::atomic::AtomicUsize::new(0);

lazy_static! {
    /// Same parameters as real hashes, so checking against it costs the same.
    static ref DUMMY_HASH: String = hash_password("no-such-account").unwrap_or_default();
}

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("password mismatch")]
    Mismatch,
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
}

/// Hash with a fresh random salt and the default Argon2id parameters.
pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            PasswordError::Hashing(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Check `plain` against a stored PHC hash. The digest comparison is constant-time.
pub fn verify_password(plain: &str, hash: &str) -> Result<(), PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        PasswordError::MalformedHash(e.to_string())
    })?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(()),
        Err(password_hash::Error::Password) => Err(PasswordError::Mismatch),
        Err(e) => Err(PasswordError::MalformedHash(e.to_string())),
    }
}

/// Spend one full verification on an account that does not exist.
///
/// Keeps unknown-email logins as slow as wrong-password ones. The result is
/// meaningless to callers.
pub fn verify_dummy(plain: &str) -> Result<(), PasswordError> {
    #[cfg(test)]
    DUMMY_VERIFICATIONS.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    verify_password(plain, &DUMMY_HASH)
}
