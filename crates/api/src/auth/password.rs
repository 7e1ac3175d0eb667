use crate::error::AppError;

/// bcrypt hashing, run off the async executor.
#[derive(Clone, Copy, Debug)]
pub struct PasswordService {
    rounds: u32,
}

impl PasswordService {
    pub fn new(rounds: u32) -> Self {
        Self { rounds }
    }

    pub async fn hash(&self, password: &str) -> Result<String, AppError> {
        let password = password.to_owned();
        let rounds = self.rounds;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, rounds))
            .await
            .map_err(|e| AppError::Internal(format!("Hashing task failed: {e}")))?
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
    }

    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Hashing task failed: {e}")))?
            .map_err(|e| AppError::Internal(format!("Failed to verify password: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn verifies_only_the_hashed_password() {
        let passwords = PasswordService::new(4);
        let hash = passwords.hash("secret123").await.unwrap();

        assert!(passwords.verify("secret123", &hash).await.unwrap());
        assert!(!passwords.verify("secret124", &hash).await.unwrap());
    }
}
