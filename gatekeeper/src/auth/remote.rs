//! Identity provider that delegates to an external session service over HTTP.
//!
//! The caller's `Cookie` header is forwarded to `identity.remote.refresh_url`. A 2xx answer with
//! a JSON body `{"principal_id": "<uuid>" | null}` resolves the principal; every `Set-Cookie`
//! header on that answer is propagated to the caller unchanged.

use async_trait::async_trait;
use reqwest::header::{COOKIE, SET_COOKIE};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::{
    auth::identity::{Credentials, IdentityError, IdentityProvider, RefreshedSession},
    config::RemoteIdentityConfig,
    types::PrincipalId,
};

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    principal_id: Option<PrincipalId>,
}

#[derive(Clone)]
pub struct RemoteIdentityProvider {
    client: reqwest::Client,
    refresh_url: Url,
}

impl RemoteIdentityProvider {
    pub fn new(config: &RemoteIdentityConfig) -> Result<Self, IdentityError> {
        let refresh_url = config
            .refresh_url
            .clone()
            .ok_or_else(|| IdentityError::NotConfigured("identity.remote.refresh_url is required".to_string()))?;

        // reqwest is built without a bundled provider and panics if none is installed
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self { client, refresh_url })
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentityProvider {
    #[instrument(skip_all, fields(url = %self.refresh_url))]
    async fn refresh_session(&self, credentials: &Credentials) -> Result<RefreshedSession, IdentityError> {
        let mut request = self.client.post(self.refresh_url.clone());
        if let Some(cookie_header) = credentials.cookie_header() {
            request = request.header(COOKIE, cookie_header);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IdentityError::UnexpectedStatus { status: status.as_u16() });
        }

        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|value| {
                value
                    .to_str()
                    .map(str::to_string)
                    .map_err(|e| IdentityError::Decode(format!("Set-Cookie header: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let body = response.bytes().await?;
        let parsed: RefreshResponse = serde_json::from_slice(&body).map_err(|e| IdentityError::Decode(e.to_string()))?;

        debug!(authenticated = parsed.principal_id.is_some(), cookies = set_cookies.len(), "Session refreshed");

        Ok(RefreshedSession {
            principal_id: parsed.principal_id,
            set_cookies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uuid::Uuid;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer, timeout: Duration) -> RemoteIdentityProvider {
        RemoteIdentityProvider::new(&RemoteIdentityConfig {
            refresh_url: Some(Url::parse(&format!("{}/session/refresh", server.uri())).unwrap()),
            timeout,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_forwards_cookies_and_collects_set_cookie() {
        let server = MockServer::start().await;
        let principal_id = Uuid::new_v4();
        Mock::given(method("POST"))
            .and(path("/session/refresh"))
            .and(header("cookie", "sid=abc"))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", "sid=def; Path=/; HttpOnly")
                    .append_header("set-cookie", "csrf=xyz; Path=/")
                    .set_body_json(serde_json::json!({ "principal_id": principal_id })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let refreshed = provider_for(&server, Duration::from_secs(5))
            .refresh_session(&Credentials::from_cookie_header("sid=abc"))
            .await
            .unwrap();

        assert_eq!(refreshed.principal_id, Some(principal_id));
        assert_eq!(
            refreshed.set_cookies,
            vec!["sid=def; Path=/; HttpOnly".to_string(), "csrf=xyz; Path=/".to_string()]
        );
    }

    #[tokio::test]
    async fn test_null_principal_is_anonymous() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "principal_id": null })))
            .mount(&server)
            .await;

        let refreshed = provider_for(&server, Duration::from_secs(5))
            .refresh_session(&Credentials::default())
            .await
            .unwrap();
        assert_eq!(refreshed, RefreshedSession::anonymous());
    }

    #[tokio::test]
    async fn test_error_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = provider_for(&server, Duration::from_secs(5))
            .refresh_session(&Credentials::default())
            .await;
        assert!(matches!(result, Err(IdentityError::UnexpectedStatus { status: 503 })));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let result = provider_for(&server, Duration::from_secs(5))
            .refresh_session(&Credentials::default())
            .await;
        assert!(matches!(result, Err(IdentityError::Decode(_))));
    }

    #[tokio::test]
    async fn test_timeout_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(2))
                    .set_body_json(serde_json::json!({ "principal_id": null })),
            )
            .mount(&server)
            .await;

        let result = provider_for(&server, Duration::from_millis(100))
            .refresh_session(&Credentials::default())
            .await;
        assert!(matches!(result, Err(IdentityError::Transport(_))));
    }

    #[test]
    fn test_requires_refresh_url() {
        let result = RemoteIdentityProvider::new(&RemoteIdentityConfig::default());
        assert!(matches!(result, Err(IdentityError::NotConfigured(_))));
    }

    #[test]
    fn test_builds_without_startup_crypto_install() {
        // No crypto provider installed up front, as for library callers
        let config = RemoteIdentityConfig {
            refresh_url: Some(Url::parse("http://identity.internal/session/refresh").unwrap()),
            timeout: Duration::from_secs(1),
        };
        assert!(RemoteIdentityProvider::new(&config).is_ok());
        assert!(RemoteIdentityProvider::new(&config).is_ok());
    }
}
