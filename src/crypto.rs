//! Cryptogragic logics.

use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::{Argon2, Params, Version};
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::config::Argon2 as ArgonConfig;

type Result<T> = std::result::Result<T, CryptoError>;

#[derive(thiserror::Error, Debug)]
pub enum CryptoError {
    #[error("argon2 error: {0}")]
    Argon2(String),
    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Password manager that uses Argon2id and PHC string format for hashing.
#[derive(Clone)]
pub struct PasswordManager {
    params: Params,
}

impl PasswordManager {
    /// Create a new [`PasswordManager`].
    pub fn new(config: Option<ArgonConfig>) -> Result<Self> {
        let config = config.unwrap_or_default();

        let params = Params::new(
            config.memory_cost,
            config.iterations,
            config.parallelism,
            Some(config.hash_length),
        )
        .map_err(|err| CryptoError::Argon2(err.to_string()))?;

        Ok(Self { params })
    }

    /// Hash password using Argon2id with a random salt.
    pub fn hash_password(&self, password: impl AsRef<[u8]>) -> Result<String> {
        let argon2 = Argon2::new(
            argon2::Algorithm::Argon2id,
            Version::V0x13,
            self.params.clone(),
        );
        let salt = SaltString::generate(&mut OsRng);
        let hash = argon2
            .hash_password(password.as_ref(), &salt)
            .map_err(|e| CryptoError::Argon2(e.to_string()))?;

        Ok(hash.to_string())
    }

    /// Hash password on the blocking pool so slow work factors never stall
    /// the executor.
    pub async fn hash(&self, password: &str) -> Result<String> {
        let manager = self.clone();
        let password = Zeroizing::new(password.to_owned());

        tokio::task::spawn_blocking(move || manager.hash_password(&*password))
            .await?
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use argon2::password_hash::{PasswordHash, PasswordVerifier};

    use super::*;

    /// Cheapest parameters Argon2 accepts, for fast tests.
    pub(crate) fn weak_manager() -> PasswordManager {
        PasswordManager::new(Some(ArgonConfig {
            memory_cost: 8,
            iterations: 1,
            parallelism: 1,
            hash_length: 32,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_hash_is_verifiable_phc() {
        let hash = weak_manager().hash("secret123").await.unwrap();

        assert!(hash.starts_with("$argon2id$v=19$"));
        assert!(!hash.contains("secret123"));

        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"secret123", &parsed)
                .is_ok()
        );
        assert!(
            Argon2::default()
                .verify_password(b"secret124", &parsed)
                .is_err()
        );
    }

    #[test]
    fn test_salt_is_random() {
        let pwd = weak_manager();
        assert_ne!(
            pwd.hash_password("secret123").unwrap(),
            pwd.hash_password("secret123").unwrap()
        );
    }

    #[test]
    fn test_invalid_work_factor() {
        let result = PasswordManager::new(Some(ArgonConfig {
            memory_cost: 1,
            iterations: 0,
            parallelism: 1,
            hash_length: 32,
        }));
        assert!(matches!(result, Err(CryptoError::Argon2(_))));
    }
}
