use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::trace;

use crate::{
    errors::{Error, Result},
    tenant::TenantContext,
    types::PrincipalId,
};

/// The principal the gate middleware resolved for this request.
///
/// Handlers behind the gate take this as an extractor. Requests that reached a handler without a
/// principal (public paths, the JSON API) are rejected with `401`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentPrincipal {
    pub id: PrincipalId,
    pub tenant: TenantContext,
}

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        match parts.extensions.get::<CurrentPrincipal>() {
            Some(principal) => Ok(principal.clone()),
            None => {
                trace!("No principal attached to request");
                Err(Error::Unauthenticated { message: None })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::TenantKind;
    use axum::{Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use uuid::Uuid;

    async fn whoami(principal: CurrentPrincipal) -> String {
        principal.id.to_string()
    }

    #[tokio::test]
    async fn test_missing_principal_is_unauthorized() {
        let app = Router::new().route("/whoami", get(whoami));
        let server = TestServer::new(app).unwrap();

        let response = server.get("/whoami").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_attached_principal_is_extracted() {
        let id = Uuid::new_v4();
        let principal = CurrentPrincipal {
            id,
            tenant: TenantContext {
                kind: TenantKind::Dev,
                hostname: "localhost".to_string(),
            },
        };
        let app = Router::new()
            .route("/whoami", get(whoami))
            .layer(axum::Extension(principal));
        let server = TestServer::new(app).unwrap();

        let response = server.get("/whoami").await;
        response.assert_status_ok();
        response.assert_text(id.to_string());
    }
}
