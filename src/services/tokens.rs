//! JWT issuing and decoding.
//!
//! Access and refresh tokens are HS256 JWTs signed with two different
//! secrets and told apart by the `typ` claim. Only signature, expiry and
//! type are checked here; whether the token is still the user's current
//! session is decided by the auth service.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{
    Config, SECONDS_PER_MINUTE, TOKEN_KIND_ACCESS, TOKEN_KIND_REFRESH, TOKEN_TYPE_BEARER,
};
use crate::errors::{AppError, AppResult};

/// JWT claims payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    /// `access` or `refresh`
    pub typ: String,
    pub iat: i64,
    pub exp: i64,
    /// Unique per token, so two tokens minted in the same second differ
    pub jti: Uuid,
}

/// Token pair returned by login and refresh
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn as_str(self) -> &'static str {
        match self {
            TokenKind::Access => TOKEN_KIND_ACCESS,
            TokenKind::Refresh => TOKEN_KIND_REFRESH,
        }
    }
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

pub struct TokenIssuer {
    access: KeyPair,
    refresh: KeyPair,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(config: &Config) -> Self {
        Self {
            access: KeyPair::from_secret(config.access_secret_bytes()),
            refresh: KeyPair::from_secret(config.refresh_secret_bytes()),
            access_ttl: Duration::minutes(config.access_token_ttl_minutes),
            refresh_ttl: Duration::hours(config.refresh_token_ttl_hours),
        }
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    fn sign(&self, user_id: Uuid, kind: TokenKind) -> AppResult<String> {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user_id,
            typ: kind.as_str().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4(),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.keys(kind).encoding,
        )?)
    }

    fn verify(&self, token: &str, kind: TokenKind) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        let claims = decode::<Claims>(token, &self.keys(kind).decoding, &validation)
            .map_err(|e| {
                tracing::debug!(error = %e, kind = kind.as_str(), "Token rejected");
                AppError::Unauthorized
            })?
            .claims;

        if claims.typ != kind.as_str() {
            tracing::debug!(expected = kind.as_str(), got = %claims.typ, "Wrong token type");
            return Err(AppError::Unauthorized);
        }
        Ok(claims)
    }

    /// Mint a fresh access/refresh pair for `user_id`.
    pub fn issue_pair(&self, user_id: Uuid) -> AppResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.sign(user_id, TokenKind::Access)?,
            refresh_token: self.sign(user_id, TokenKind::Refresh)?,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: self.access_ttl.num_minutes() * SECONDS_PER_MINUTE,
        })
    }

    pub fn verify_access(&self, token: &str) -> AppResult<Claims> {
        self.verify(token, TokenKind::Access)
    }

    pub fn verify_refresh(&self, token: &str) -> AppResult<Claims> {
        self.verify(token, TokenKind::Refresh)
    }
}
