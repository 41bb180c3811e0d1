//! bcrypt hashing, run on the blocking pool so the runtime keeps serving requests.

use super::StoreError;

pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// Hash a plaintext password with the given bcrypt cost.
///
/// # Errors
/// Returns [`StoreError::Hash`] for an out-of-range cost.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, StoreError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(StoreError::Task)?
        .map_err(StoreError::Hash)
}

/// Compare a plaintext password with a stored bcrypt hash.
///
/// # Errors
/// Returns [`StoreError::Hash`] when the stored hash cannot be parsed.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, StoreError> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(StoreError::Task)?
        .map_err(StoreError::Hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify_matches_only_that_password() -> anyhow::Result<()> {
        let hash = hash_password("correct horse", MIN_COST).await?;
        assert!(hash.starts_with("$2"));
        assert!(!hash.contains("correct horse"));
        assert!(verify_password("correct horse", &hash).await?);
        assert!(!verify_password("wrong horse", &hash).await?);
        Ok(())
    }

    #[tokio::test]
    async fn same_password_hashes_differ_by_salt() -> anyhow::Result<()> {
        let first = hash_password("secret", MIN_COST).await?;
        let second = hash_password("secret", MIN_COST).await?;
        assert_ne!(first, second);
        Ok(())
    }

    #[tokio::test]
    async fn malformed_hash_is_an_error() {
        let result = verify_password("secret", "not-a-bcrypt-hash").await;
        assert!(matches!(result, Err(StoreError::Hash(_))));
    }

    #[tokio::test]
    async fn cost_out_of_range_is_an_error() {
        let result = hash_password("secret", MAX_COST + 1).await;
        assert!(matches!(result, Err(StoreError::Hash(_))));
    }
}
