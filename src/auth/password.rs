use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Signup sends the password twice; both copies must agree and be long enough.
pub fn check_new_password(password1: &str, password2: &str) -> Result<(), AppError> {
    if password1 != password2 {
        return Err(AppError::validation("Passwords do not match"));
    }
    if password1.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| {
            error!(error = %e, "argon2 hash failed");
            anyhow::anyhow!("password hashing failed: {e}")
        })
}

/// `Ok(false)` for a wrong password; `Err` only when the stored hash is corrupt.
pub fn verify_password(plain: &str, stored_hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| {
        error!(error = %e, "stored password hash unreadable");
        anyhow::anyhow!("unreadable password hash: {e}")
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}
