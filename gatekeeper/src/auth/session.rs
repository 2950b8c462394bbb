//! JWT session token creation and verification, and the `Set-Cookie` values that carry them.

use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::JwtSessionConfig, errors::Error, types::PrincipalId};

/// JWT session claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: PrincipalId, // Subject (principal ID)
    pub exp: i64,         // Expiration time
    pub iat: i64,         // Issued at
}

impl SessionClaims {
    /// Create new session claims for a principal, valid for the configured session TTL
    pub fn new(principal_id: PrincipalId, config: &JwtSessionConfig) -> Self {
        Self::issued_at(principal_id, config, Utc::now())
    }

    fn issued_at(principal_id: PrincipalId, config: &JwtSessionConfig, now: DateTime<Utc>) -> Self {
        let exp = now + config.session_ttl;
        Self {
            sub: principal_id,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }

    /// Seconds of validity left at `now`. Negative once expired.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        self.exp - now.timestamp()
    }
}

/// Create a JWT token for a principal session
pub fn create_session_token(principal_id: PrincipalId, secret_key: &str, config: &JwtSessionConfig) -> Result<String, Error> {
    let claims = SessionClaims::new(principal_id, config);
    encode_claims(&claims, secret_key)
}

pub(crate) fn encode_claims(claims: &SessionClaims, secret_key: &str) -> Result<String, Error> {
    let key = EncodingKey::from_secret(secret_key.as_bytes());
    encode(&Header::default(), claims, &key).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })
}

/// Verify and decode a JWT session token
pub fn verify_session_token(token: &str, secret_key: &str) -> Result<SessionClaims, Error> {
    let key = DecodingKey::from_secret(secret_key.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        // Client errors - malformed tokens, invalid claims, expired tokens
        jsonwebtoken::errors::ErrorKind::InvalidToken
        | jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::ExpiredSignature
        | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_)
        | jsonwebtoken::errors::ErrorKind::InvalidIssuer
        | jsonwebtoken::errors::ErrorKind::InvalidAudience
        | jsonwebtoken::errors::ErrorKind::InvalidSubject
        | jsonwebtoken::errors::ErrorKind::ImmatureSignature
        | jsonwebtoken::errors::ErrorKind::Base64(_)
        | jsonwebtoken::errors::ErrorKind::Json(_)
        | jsonwebtoken::errors::ErrorKind::Utf8(_)
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => Error::Unauthenticated { message: None },

        // Server errors - key issues, internal failures
        jsonwebtoken::errors::ErrorKind::InvalidEcdsaKey
        | jsonwebtoken::errors::ErrorKind::InvalidRsaKey(_)
        | jsonwebtoken::errors::ErrorKind::RsaFailedSigning
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithmName
        | jsonwebtoken::errors::ErrorKind::InvalidKeyFormat
        | jsonwebtoken::errors::ErrorKind::MissingAlgorithm
        | jsonwebtoken::errors::ErrorKind::Crypto(_) => Error::Internal {
            operation: format!("JWT verification: {e}"),
        },

        _ => Error::Internal {
            operation: format!("JWT verification (unknown error): {e}"),
        },
    })?;

    Ok(token_data.claims)
}

/// `Set-Cookie` value carrying a session token
pub fn session_cookie(token: &str, config: &JwtSessionConfig) -> String {
    format!(
        "{}={}; Path=/; HttpOnly;{} SameSite={}; Max-Age={}",
        config.cookie_name,
        token,
        secure_attribute(config),
        config.cookie_same_site,
        config.session_ttl.as_secs()
    )
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_session_cookie(config: &JwtSessionConfig) -> String {
    format!(
        "{}=; Path=/; HttpOnly;{} SameSite={}; Max-Age=0",
        config.cookie_name,
        secure_attribute(config),
        config.cookie_same_site
    )
}

fn secure_attribute(config: &JwtSessionConfig) -> &'static str {
    if config.cookie_secure { " Secure;" } else { "" }
}
