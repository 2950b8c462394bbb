//! Identity collaborator abstraction.
//!
//! The gatekeeper never owns sessions. It hands the caller's credentials (the `Cookie` header)
//! to an [`IdentityProvider`], which answers with the principal those credentials belong to and
//! any cookies that must be written back on the response (sliding refresh, logout).
//!
//! Two providers ship with the crate:
//!
//! - [`JwtIdentityProvider`]: sessions are HS256 JWTs in a cookie signed with `secret_key`
//! - [`RemoteIdentityProvider`](crate::auth::remote::RemoteIdentityProvider): an external
//!   session service reached over HTTP

use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, instrument, trace};

use crate::{
    auth::session::{self, SessionClaims},
    config::JwtSessionConfig,
    errors::Error,
    types::{PrincipalId, abbrev_uuid},
};

/// Failure talking to, or inside, the identity collaborator.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity provider is not configured: {0}")]
    NotConfigured(String),

    #[error("failed to sign session: {0}")]
    Signing(String),

    #[error("failed to verify session: {0}")]
    Verification(String),

    #[error("identity service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("identity service answered {status}")]
    UnexpectedStatus { status: u16 },

    #[error("identity service response could not be decoded: {0}")]
    Decode(String),
}

/// The caller's opaque credential set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    cookie_header: Option<String>,
}

impl Credentials {
    /// Collect every `Cookie` header of a request. Multiple headers are joined the way a single
    /// header would carry them. Non-UTF-8 headers are ignored.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let cookies: Vec<&str> = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .collect();

        Self {
            cookie_header: (!cookies.is_empty()).then(|| cookies.join("; ")),
        }
    }

    pub fn from_cookie_header(cookie_header: impl Into<String>) -> Self {
        Self {
            cookie_header: Some(cookie_header.into()),
        }
    }

    pub fn cookie_header(&self) -> Option<&str> {
        self.cookie_header.as_deref()
    }

    /// Value of the first cookie with this name
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookie_header.as_deref()?.split(';').find_map(|cookie| {
            let (cookie_name, value) = cookie.trim().split_once('=')?;
            (cookie_name == name).then_some(value)
        })
    }
}

/// Outcome of a session refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshedSession {
    pub principal_id: Option<PrincipalId>,
    /// `Set-Cookie` values to write back on the response, in order
    pub set_cookies: Vec<String>,
}

impl RefreshedSession {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(principal_id: PrincipalId) -> Self {
        Self {
            principal_id: Some(principal_id),
            set_cookies: Vec::new(),
        }
    }

    pub fn with_cookie(mut self, set_cookie: String) -> Self {
        self.set_cookies.push(set_cookie);
        self
    }
}

/// Refresh primitive of the identity collaborator.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the caller's principal and the cookies to propagate. An invalid or expired session
    /// is not an error: it resolves to an anonymous session.
    async fn refresh_session(&self, credentials: &Credentials) -> Result<RefreshedSession, IdentityError>;
}

/// Identity provider backed by locally signed JWT session cookies.
///
/// Sessions slide: a valid token with less than `refresh_window` left is replaced with a fresh
/// one on the response.
#[derive(Clone)]
pub struct JwtIdentityProvider {
    secret_key: Option<String>,
    config: JwtSessionConfig,
}

impl JwtIdentityProvider {
    pub fn new(secret_key: Option<String>, config: JwtSessionConfig) -> Self {
        Self { secret_key, config }
    }

    fn secret(&self) -> Result<&str, IdentityError> {
        self.secret_key
            .as_deref()
            .ok_or_else(|| IdentityError::NotConfigured("JWT sessions: secret_key is required".to_string()))
    }

    /// Mint a session for a principal and return the `Set-Cookie` value carrying it. Used by the
    /// login collaborator.
    pub fn issue_session(&self, principal_id: PrincipalId) -> Result<String, IdentityError> {
        let token = session::create_session_token(principal_id, self.secret()?, &self.config)
            .map_err(|e| IdentityError::Signing(e.to_string()))?;
        Ok(session::session_cookie(&token, &self.config))
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    #[instrument(skip_all)]
    async fn refresh_session(&self, credentials: &Credentials) -> Result<RefreshedSession, IdentityError> {
        let Some(token) = credentials.cookie(&self.config.cookie_name) else {
            trace!("No session cookie present");
            return Ok(RefreshedSession::anonymous());
        };
        let secret = self.secret()?;

        let claims = match session::verify_session_token(token, secret) {
            Ok(claims) => claims,
            Err(Error::Unauthenticated { .. }) => {
                debug!("Session cookie invalid or expired, clearing it");
                return Ok(RefreshedSession::anonymous().with_cookie(session::clear_session_cookie(&self.config)));
            }
            Err(e) => return Err(IdentityError::Verification(e.to_string())),
        };

        let mut refreshed = RefreshedSession::authenticated(claims.sub);

        let refresh_window = i64::try_from(self.config.refresh_window.as_secs()).unwrap_or(i64::MAX);
        if claims.remaining_secs(Utc::now()) < refresh_window {
            debug!(principal_id = %abbrev_uuid(&claims.sub), "Session close to expiry, re-issuing");
            let fresh = SessionClaims::new(claims.sub, &self.config);
            let token = session::encode_claims(&fresh, secret).map_err(|e| IdentityError::Signing(e.to_string()))?;
            refreshed = refreshed.with_cookie(session::session_cookie(&token, &self.config));
        }

        Ok(refreshed)
    }
}
