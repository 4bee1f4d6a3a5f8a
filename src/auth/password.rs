use crate::error::{AppError, AppResult};

/// Hash on the blocking pool; bcrypt at production cost takes a few hundred ms.
pub async fn hash(password: String, cost: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
}

/// Constant-time verify via bcrypt. A missing or malformed hash never matches.
pub async fn verify(password: String, hash: Option<String>) -> AppResult<bool> {
    let Some(hash) = hash else {
        return Ok(false);
    };
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[tokio::test]
    async fn hash_then_verify() {
        let hashed = hash("hunter22".into(), TEST_COST).await.unwrap();
        assert_ne!(hashed, "hunter22");
        assert!(verify("hunter22".into(), Some(hashed.clone())).await.unwrap());
        assert!(!verify("hunter23".into(), Some(hashed)).await.unwrap());
    }

    #[tokio::test]
    async fn hashes_are_salted() {
        let a = hash("same".into(), TEST_COST).await.unwrap();
        let b = hash("same".into(), TEST_COST).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn missing_or_garbage_hash_never_matches() {
        assert!(!verify("anything".into(), None).await.unwrap());
        assert!(!verify("anything".into(), Some("not-bcrypt".into()))
            .await
            .unwrap());
    }
}
