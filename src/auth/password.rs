use crate::error::{AppError, AppResult};

/// Hash a password with bcrypt; every call uses a fresh salt.
pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

/// Constant-time check of a password against a stored bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!("Stored password hash could not be parsed: {}", e);
            false
        }
    }
}

/// `hash_password` on the blocking thread pool, keeping bcrypt off the async workers.
pub async fn hash_password_blocking(password: String, cost: u32) -> AppResult<String> {
    let hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("password hashing task failed: {}", e)))??;
    Ok(hash)
}

/// `verify_password` on the blocking thread pool.
pub async fn verify_password_blocking(password: String, hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("password check task failed: {}", e)))
}
