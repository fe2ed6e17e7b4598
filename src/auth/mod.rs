pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: Uuid,
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    /// Unique token ID so two tokens minted in the same second still differ
    pub jti: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, token_type: TokenType, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            token_type,
            jti: Uuid::new_v4(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT secret not configured")]
    MissingSecret,
    #[error("JWT generation error: {0}")]
    Generation(String),
    #[error("Invalid JWT token: {0}")]
    Invalid(String),
    #[error("Expected {expected:?} token, got {actual:?}")]
    WrongType { expected: TokenType, actual: TokenType },
}

/// How long a token of the given type stays valid, from configuration
pub fn token_ttl(token_type: TokenType) -> Duration {
    let security = &config::config().security;
    match token_type {
        TokenType::Access => Duration::minutes(security.access_token_minutes as i64),
        TokenType::Refresh => Duration::days(security.refresh_token_days as i64),
    }
}

/// Sign a new token for `user_id` with the configured secret and lifetime
pub fn generate_token(user_id: Uuid, token_type: TokenType) -> Result<String, TokenError> {
    let claims = Claims::new(user_id, token_type, token_ttl(token_type));
    encode_claims(&claims, &config::config().security.jwt_secret)
}

/// Verify signature and expiry of `token` and check its type
pub fn validate_token(token: &str, expected: TokenType) -> Result<Claims, TokenError> {
    decode_claims(token, expected, &config::config().security.jwt_secret)
}

pub fn encode_claims(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| TokenError::Generation(e.to_string()))
}

pub fn decode_claims(token: &str, expected: TokenType, secret: &str) -> Result<Claims, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| TokenError::Invalid(e.to_string()))?;

    let claims = token_data.claims;
    if claims.token_type != expected {
        return Err(TokenError::WrongType {
            expected,
            actual: claims.token_type,
        });
    }
    Ok(claims)
}

/// SHA-256 of a raw token, hex encoded. Refresh tokens are stored only in this form.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
