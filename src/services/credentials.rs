use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::errors::ServiceError;
use crate::repositories::user_repository::DUPLICATE_USERNAME;
use crate::repositories::UserRepository;

/// What callers learn about a user. The password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub role: String,
}

/// Username/password store.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Stores a new user unless the username is already taken.
    async fn create_if_absent(
        &self,
        username: &str,
        password: &str,
        role: &str,
    ) -> Result<Credential, ServiceError>;

    /// Checks a username/password pair and returns the stored role.
    async fn verify(&self, username: &str, password: &str) -> Result<Credential, ServiceError>;
}

fn require(field: &str, value: &str) -> Result<(), ServiceError> {
    if value.is_empty() {
        return Err(ServiceError::ValidationError(format!("{} is required", field)));
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::HashError(e.to_string()))
}

fn password_matches(stored_hash: &str, password: &str) -> Result<bool, ServiceError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| ServiceError::HashError(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

async fn blocking<T, F>(f: F) -> Result<T, ServiceError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServiceError::InternalError(format!("Task join error: {}", e)))?
}

/// argon2-hashing [`CredentialStore`] over the `users` table
#[derive(Debug, Clone)]
pub struct CredentialService {
    users: UserRepository,
}

impl CredentialService {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }
}

#[async_trait]
impl CredentialStore for CredentialService {
    #[instrument(skip(self, password))]
    async fn create_if_absent(
        &self,
        username: &str,
        password: &str,
        role: &str,
    ) -> Result<Credential, ServiceError> {
        require("username", username)?;
        require("password", password)?;
        require("role", role)?;

        if self.users.find_by_username(username).await?.is_some() {
            return Err(ServiceError::ValidationError(DUPLICATE_USERNAME.to_string()));
        }

        let password = password.to_owned();
        let password_hash = blocking(move || hash_password(&password)).await?;
        let user = self.users.insert(username, password_hash, role).await?;

        info!(user_id = %user.id, username = %user.username, "User created");
        Ok(Credential {
            username: user.username,
            role: user.role,
        })
    }

    #[instrument(skip(self, password))]
    async fn verify(&self, username: &str, password: &str) -> Result<Credential, ServiceError> {
        require("username", username)?;
        require("password", password)?;

        let Some(user) = self.users.find_by_username(username).await? else {
            warn!("Login attempt for unknown user");
            return Err(ServiceError::InvalidCredentials);
        };

        let stored_hash = user.password_hash.clone();
        let password = password.to_owned();
        if !blocking(move || password_matches(&stored_hash, &password)).await? {
            warn!("Login attempt with wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        Ok(Credential {
            username: user.username,
            role: user.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_salted_and_verifiable() {
        let first = hash_password("s3cret").unwrap();
        let second = hash_password("s3cret").unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("$argon2"));
        assert!(password_matches(&first, "s3cret").unwrap());
        assert!(!password_matches(&first, "S3cret").unwrap());
    }

    #[test]
    fn malformed_stored_hash_is_an_internal_error() {
        assert!(matches!(
            password_matches("plaintext", "plaintext"),
            Err(ServiceError::HashError(_))
        ));
    }

    #[test]
    fn empty_fields_are_rejected() {
        assert!(matches!(
            require("role", ""),
            Err(ServiceError::ValidationError(msg)) if msg == "role is required"
        ));
        assert!(require("role", "admin").is_ok());
    }
}
