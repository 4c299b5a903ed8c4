/// Session and identity service
///
/// Registers users, authenticates them with email and password, and issues
/// signed access/refresh token pairs. The signing secret and lifetimes come
/// from the injected [`TokenConfig`].
///
/// Unknown emails and wrong passwords produce the same `Unauthorized` error;
/// only the log lines differ.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::ValidateEmail;

use super::{ServiceError, ServiceResult};
use crate::auth::jwt::{self, Claims, TokenConfig, TokenType};
use crate::auth::password;
use crate::models::user::{CreateUser, User};
use crate::store::{StoreError, WorkStore};

const INVALID_CREDENTIALS: &str = "invalid email or password";

/// Access and refresh tokens issued at login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn WorkStore>,
    tokens: TokenConfig,
}

impl SessionService {
    pub fn new(store: Arc<dyn WorkStore>, tokens: TokenConfig) -> Self {
        Self { store, tokens }
    }

    /// Creates a user with an Argon2id-hashed password
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a blank name, malformed email or out-of-range password
    /// - `Conflict` if the email is already registered
    pub async fn register(&self, name: &str, email: &str, password: &str) -> ServiceResult<User> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::InvalidInput("name is required".to_string()));
        }
        let email = normalize_email(email);
        if !email.validate_email() {
            return Err(ServiceError::InvalidInput("invalid email format".to_string()));
        }
        password::validate_password_strength(password).map_err(ServiceError::InvalidInput)?;

        let password_hash = hash_off_thread(password.to_string()).await?;

        let user = self
            .store
            .create_user(User::new(CreateUser {
                name: name.to_string(),
                email,
                password_hash,
            }))
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => {
                    ServiceError::Conflict("email is already registered".to_string())
                }
                other => other.into(),
            })?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Verifies credentials and issues a token pair
    ///
    /// # Errors
    ///
    /// `Unauthorized` for an unknown email or a wrong password
    pub async fn authenticate(&self, email: &str, password: &str) -> ServiceResult<TokenPair> {
        let email = normalize_email(email);

        let Some(user) = self.store.find_user_by_email(&email).await? else {
            warn!("Login failed: user not found");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        if !verify_off_thread(password.to_string(), user.password_hash.clone()).await? {
            warn!(user_id = %user.id, "Login failed: invalid credentials");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let access = Claims::new(user.id, TokenType::Access, self.tokens.access_ttl);
        let refresh = Claims::new(user.id, TokenType::Refresh, self.tokens.refresh_ttl);

        let pair = TokenPair {
            access_token: jwt::create_token(&access, &self.tokens.secret)?,
            refresh_token: jwt::create_token(&refresh, &self.tokens.secret)?,
            expires_in: self.tokens.access_ttl.num_seconds(),
        };

        info!(user_id = %user.id, "User logged in");
        Ok(pair)
    }

    /// Exchanges a refresh token for a new access token for the same user
    ///
    /// # Errors
    ///
    /// `Unauthorized` if the token is invalid, expired or an access token
    pub async fn refresh(&self, refresh_token: &str) -> ServiceResult<String> {
        let token = jwt::refresh_access_token(
            refresh_token,
            &self.tokens.secret,
            self.tokens.refreshed_access_ttl,
        )
        .map_err(|e| {
            warn!(error = %e, "Token refresh rejected");
            ServiceError::from(e)
        })?;

        Ok(token)
    }

    /// Validates an access token and returns the user ID it carries
    pub fn verify_access(&self, access_token: &str) -> ServiceResult<Uuid> {
        let claims = jwt::validate_access_token(access_token, &self.tokens.secret)?;
        Ok(claims.sub)
    }

    /// Lifetime of tokens minted by [`Self::refresh`], in seconds
    pub fn refreshed_expires_in(&self) -> i64 {
        self.tokens.refreshed_access_ttl.num_seconds()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// Argon2 runs on the blocking pool
async fn hash_off_thread(password: String) -> ServiceResult<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| ServiceError::Internal(format!("hashing task failed: {e}")))?
        .map_err(ServiceError::from)
}

async fn verify_off_thread(password: String, hash: String) -> ServiceResult<bool> {
    tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .map_err(|e| ServiceError::Internal(format!("verification task failed: {e}")))?
        .map_err(ServiceError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  A@X.com "), "a@x.com");
    }
}
