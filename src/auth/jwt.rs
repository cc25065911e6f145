//! JWT Token Codec
//! Mission: Issue and verify signed, expiring identity tokens

use crate::auth::models::Claims;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use tracing::debug;

/// Fixed validity window of every issued token
pub const TOKEN_TTL_DAYS: i64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Bad signature, malformed encoding or expired
    #[error("invalid token")]
    Invalid,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Signs and verifies HS256 tokens carrying `{sub, iat, exp}`
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::days(TOKEN_TTL_DAYS),
        }
    }

    pub fn issue(&self, subject: &str) -> Result<String, TokenError> {
        self.issue_at(subject, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        debug!(subject, "Issuing token, valid for {} days", TOKEN_TTL_DAYS);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a token and return its subject
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify against an explicit clock. Valid iff the signature checks out
    /// and `now < exp`; no leeway is granted.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| TokenError::Invalid)?;

        if now.timestamp() >= data.claims.exp {
            debug!(subject = %data.claims.sub, "Rejected expired token");
            return Err(TokenError::Invalid);
        }

        Ok(data.claims.sub)
    }
}
