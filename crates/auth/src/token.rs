//! Access-token issuance and validation (HS256 JWT).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use thiserror::Error;

use crate::{ClaimsError, Identity, TokenClaims, validate_claims};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("missing bearer token")]
    Missing,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("invalid token claims: {0}")]
    Claims(ClaimsError),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<ClaimsError> for TokenError {
    fn from(value: ClaimsError) -> Self {
        match value {
            ClaimsError::Expired => TokenError::Expired,
            other => TokenError::Claims(other),
        }
    }
}

/// Signs and verifies access tokens with a shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Issue a token for `identity`, valid for the configured TTL from now.
    pub fn create_access_token(&self, identity: &Identity) -> Result<String, TokenError> {
        self.create_access_token_at(identity, Utc::now())
    }

    pub fn create_access_token_at(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = TokenClaims::new(identity, now, self.ttl);
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify the signature and claims of `token` as of now.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.decode_at(token, Utc::now())
    }

    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time checks run in `validate_claims` against the caller's clock.
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed(e.to_string()),
            })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }

    /// Resolve the caller identity from a raw `Authorization` header value.
    pub fn get_user_identity(&self, authorization: Option<&str>) -> Result<Identity, TokenError> {
        let token = extract_bearer(authorization)?;
        let claims = self.decode(token)?;
        tracing::debug!(identity = %claims.sub, "resolved bearer identity");
        Ok(claims.identity())
    }
}

/// Pull the token out of a `Bearer <token>` header value.
pub fn extract_bearer(authorization: Option<&str>) -> Result<&str, TokenError> {
    let header = authorization.ok_or(TokenError::Missing)?;
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .ok_or(TokenError::Missing)?
        .trim();

    if token.is_empty() {
        return Err(TokenError::Missing);
    }
    Ok(token)
}
