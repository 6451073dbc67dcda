//! bcrypt password hashing for stored credentials.
//!
//! Both operations run on the blocking pool so a hash never stalls a runtime
//! worker.

use crate::error::KillrVideoError;

/// Work factor for new hashes.
pub const HASH_COST: u32 = 12;

/// # Errors
/// Returns an error if bcrypt rejects the input or the hashing task dies.
pub async fn hash(password: &str) -> Result<String, KillrVideoError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, HASH_COST)).await??;
    Ok(hashed)
}

/// # Errors
/// Returns an error if `hash` is not a valid bcrypt hash or the task dies.
pub async fn matches(password: &str, hash: &str) -> Result<bool, KillrVideoError> {
    let (password, hash) = (password.to_owned(), hash.to_owned());
    let matched = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
    Ok(matched)
}
