//! Bearer-token authentication: bcrypt password hashing, HS256 token
//! issue/verify, and the `CurrentUser` extractor used by protected routes.

use anyhow::{Context as _, Result};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::rest::error::ApiError;
use crate::storage::UserRow;
use crate::AppContext;

/// Token claims: `sub` is the user id.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

/// Pre-built signing/verification keys derived from the configured secret.
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    token_expiry_minutes: i64,
    bcrypt_cost: u32,
}

impl AuthKeys {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret_key.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret_key.as_bytes()),
            token_expiry_minutes: config.token_expiry_minutes,
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String> {
        bcrypt::hash(password, self.bcrypt_cost).context("bcrypt hash failed")
    }

    pub fn verify_password(&self, password: &str, hashed: &str) -> bool {
        bcrypt::verify(password, hashed).unwrap_or(false)
    }

    /// Issue an HS256 bearer token for `user_id` with the configured expiry.
    pub fn issue_token(&self, user_id: &str) -> Result<String> {
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (Utc::now() + Duration::minutes(self.token_expiry_minutes)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding).context("token encode failed")
    }

    /// Decode and validate a bearer token (signature + expiry).
    pub fn decode_token(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .context("token decode failed")?;
        Ok(data.claims)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get(axum::http::header::AUTHORIZATION)?;
    let value = header.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// The authenticated user behind the request. Rejects with 401 when the
/// header is missing, the token fails validation, or the user is gone.
pub struct CurrentUser(pub UserRow);

impl FromRequestParts<Arc<AppContext>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("Could not validate credentials".to_string()))?;
        let claims = ctx
            .auth
            .decode_token(token)
            .map_err(|_| ApiError::Unauthorized("Could not validate credentials".to_string()))?;
        let user = ctx
            .storage
            .user_by_id(&claims.sub)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Could not validate credentials".to_string()))?;
        Ok(CurrentUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> AuthKeys {
        AuthKeys::new(&AuthConfig {
            secret_key: "test-secret".to_string(),
            token_expiry_minutes: 30,
            // Minimum bcrypt cost keeps the test fast.
            bcrypt_cost: 4,
        })
    }

    #[test]
    fn password_hash_round_trip() {
        let keys = keys();
        let hashed = keys.hash_password("s3cret").unwrap();
        assert!(keys.verify_password("s3cret", &hashed));
        assert!(!keys.verify_password("wrong", &hashed));
    }

    #[test]
    fn token_round_trip_carries_subject() {
        let keys = keys();
        let token = keys.issue_token("user-42").unwrap();
        let claims = keys.decode_token(&token).unwrap();
        assert_eq!(claims.sub, "user-42");
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let keys = keys();
        let other = AuthKeys::new(&AuthConfig {
            secret_key: "different".to_string(),
            token_expiry_minutes: 30,
            bcrypt_cost: 4,
        });
        let token = other.issue_token("user-42").unwrap();
        assert!(keys.decode_token(&token).is_err());
    }
}
