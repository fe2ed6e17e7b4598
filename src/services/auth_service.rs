use chrono::Utc;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::api::{LoginRequest, RegisterRequest, TokenPair};
use crate::auth::password::Hasher;
use crate::auth::{self, TokenError, TokenType};
use crate::database::manager::DatabaseError;
use crate::database::models::{RefreshToken, User};
use crate::database::repository::{RefreshTokenRepository, UserRepository};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid registration: {0:?}")]
    Validation(HashMap<String, String>),
    #[error("A user with that email already exists.")]
    EmailTaken,
    #[error("Invalid credentials.")]
    InvalidCredentials,
    #[error("{0}")]
    InvalidRefreshToken(&'static str),
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Database(DatabaseError),
}

impl From<DatabaseError> for AuthError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Conflict(_) => AuthError::EmailTaken,
            other => AuthError::Database(other),
        }
    }
}

/// User registration and token issuance
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
    hasher: Arc<dyn Hasher>,
    /// Hash checked against when the email is unknown, so both login paths
    /// cost one password verification
    dummy_hash: Arc<OnceCell<String>>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
        hasher: Arc<dyn Hasher>,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            hasher,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<User, AuthError> {
        request.validate().map_err(AuthError::Validation)?;

        let email = request.email.trim().to_lowercase();
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self
            .hasher
            .generate_hash(&request.password)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        let user = User {
            id: Uuid::new_v4(),
            email,
            password_hash,
            created_at: Utc::now(),
        };

        // The unique index still decides races between two registrations
        let user = self.users.insert(&user).await?;
        tracing::info!("Registered user {}", user.id);
        Ok(user)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<TokenPair, AuthError> {
        let email = request.email.trim().to_lowercase();
        let Some(user) = self.users.find_by_email(&email).await? else {
            self.hasher.check_hash(self.dummy_hash(), &request.password);
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.check_hash(&user.password_hash, &request.password) {
            tracing::warn!("Failed login for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_pair(user.id).await
    }

    /// Exchange a refresh token for a new pair. Each refresh token works once.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = auth::validate_token(refresh_token, TokenType::Refresh)
            .map_err(|_| AuthError::InvalidRefreshToken("Invalid refresh token."))?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::InvalidRefreshToken("Invalid refresh token."))?;

        let stored = self
            .refresh_tokens
            .take(user.id, &auth::hash_token(refresh_token))
            .await?
            .ok_or(AuthError::InvalidRefreshToken(
                "Refresh token not recognized (maybe used or expired?)",
            ))?;

        if stored.expires_at < Utc::now() {
            return Err(AuthError::InvalidRefreshToken(
                "Refresh token not recognized (maybe used or expired?)",
            ));
        }

        self.issue_pair(user.id).await
    }

    fn dummy_hash(&self) -> &str {
        self.dummy_hash.get_or_init(|| {
            self.hasher
                .generate_hash("notes-api-unknown-user")
                .unwrap_or_else(|e| {
                    tracing::error!("Could not build dummy password hash: {}", e);
                    String::new()
                })
        })
    }

    async fn issue_pair(&self, user_id: Uuid) -> Result<TokenPair, AuthError> {
        let access_token = auth::generate_token(user_id, TokenType::Access)?;
        let refresh_token = auth::generate_token(user_id, TokenType::Refresh)?;

        let now = Utc::now();
        let removed = self.refresh_tokens.delete_expired(now).await?;
        if removed > 0 {
            tracing::debug!("Pruned {} expired refresh tokens", removed);
        }

        self.refresh_tokens
            .insert(&RefreshToken {
                user_id,
                hashed_token: auth::hash_token(&refresh_token),
                expires_at: now + auth::token_ttl(TokenType::Refresh),
                created_at: now,
            })
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::Argon2Hasher;
    use crate::database::memory::{MemoryRefreshTokenRepository, MemoryUserRepository};

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(MemoryUserRepository::new()),
            Arc::new(MemoryRefreshTokenRepository::new()),
            Arc::new(Argon2Hasher::new()),
        )
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "Sup3rSecret".to_string(),
        }
    }

    #[tokio::test]
    async fn register_then_login_issues_tokens() {
        let service = service();
        let user = service.register(register_request("Ann@Example.com")).await.unwrap();
        assert_eq!(user.email, "ann@example.com");

        let pair = service
            .login(LoginRequest {
                email: "ann@example.com".to_string(),
                password: "Sup3rSecret".to_string(),
            })
            .await
            .unwrap();

        let claims = auth::validate_token(&pair.access_token, TokenType::Access).unwrap();
        assert_eq!(claims.sub, user.id);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let service = service();
        service.register(register_request("ann@example.com")).await.unwrap();
        assert!(matches!(
            service.register(register_request("ann@example.com")).await,
            Err(AuthError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let service = service();
        service.register(register_request("ann@example.com")).await.unwrap();

        let result = service
            .login(LoginRequest {
                email: "ann@example.com".to_string(),
                password: "Wr0ngPassword".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));

        let unknown = service
            .login(LoginRequest {
                email: "bob@example.com".to_string(),
                password: "Sup3rSecret".to_string(),
            })
            .await;
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
    }

    /// Counts verifications so both login failure paths can be compared
    #[derive(Default)]
    struct CountingHasher {
        inner: Argon2Hasher,
        checks: std::sync::atomic::AtomicUsize,
    }

    impl Hasher for CountingHasher {
        fn generate_hash(&self, password: &str) -> Result<String, argon2::password_hash::Error> {
            self.inner.generate_hash(password)
        }

        fn check_hash(&self, hash: &str, password: &str) -> bool {
            self.checks.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.inner.check_hash(hash, password)
        }
    }

    #[tokio::test]
    async fn unknown_email_still_verifies_a_password() {
        let hasher = Arc::new(CountingHasher::default());
        let service = AuthService::new(
            Arc::new(MemoryUserRepository::new()),
            Arc::new(MemoryRefreshTokenRepository::new()),
            hasher.clone(),
        );

        for _ in 0..2 {
            let result = service
                .login(LoginRequest {
                    email: "nobody@example.com".to_string(),
                    password: "notes-api-unknown-user".to_string(),
                })
                .await;
            assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        }

        assert_eq!(hasher.checks.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn refresh_rotates_and_rejects_reuse() {
        let service = service();
        service.register(register_request("ann@example.com")).await.unwrap();
        let pair = service
            .login(LoginRequest {
                email: "ann@example.com".to_string(),
                password: "Sup3rSecret".to_string(),
            })
            .await
            .unwrap();

        let rotated = service.refresh(&pair.refresh_token).await.unwrap();
        assert_ne!(rotated.refresh_token, pair.refresh_token);

        assert!(matches!(
            service.refresh(&pair.refresh_token).await,
            Err(AuthError::InvalidRefreshToken(_))
        ));
        assert!(service.refresh(&rotated.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn access_token_cannot_refresh() {
        let service = service();
        service.register(register_request("ann@example.com")).await.unwrap();
        let pair = service
            .login(LoginRequest {
                email: "ann@example.com".to_string(),
                password: "Sup3rSecret".to_string(),
            })
            .await
            .unwrap();

        assert!(matches!(
            service.refresh(&pair.access_token).await,
            Err(AuthError::InvalidRefreshToken(_))
        ));
    }
}
