use axum::Json;

use crate::{api::models::session::SessionResponse, auth::current_user::CurrentPrincipal};

/// Get the caller's session
#[utoipa::path(
    get,
    path = "/session",
    tag = "session",
    summary = "Current session",
    responses(
        (status = 200, description = "The authenticated principal and the tenant it was resolved on", body = SessionResponse),
        (status = 401, description = "No session"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_session(principal: CurrentPrincipal) -> Json<SessionResponse> {
    Json(SessionResponse {
        principal_id: principal.id,
        tenant: principal.tenant.kind,
        hostname: principal.tenant.hostname,
    })
}

#[cfg(test)]
mod tests {
    use crate::api::models::session::SessionResponse;
    use crate::db::store::InMemoryAccessStore;
    use crate::tenant::TenantKind;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_get_session() {
        let store = InMemoryAccessStore::with_default_catalogue();
        let server = create_test_app(store.clone());
        let principal = create_test_principal(&store);

        let response = server
            .get("/api/v1/session")
            .add_header("cookie", session_cookie_for(principal.id))
            .await;

        response.assert_status_ok();
        let session: SessionResponse = response.json();
        assert_eq!(session.principal_id, principal.id);
        assert_eq!(session.tenant, TenantKind::Dev);
    }

    #[tokio::test]
    async fn test_get_session_anonymous_is_401_not_redirect() {
        let server = create_test_app(InMemoryAccessStore::new());

        let response = server.get("/api/v1/session").await;
        response.assert_status_unauthorized();
    }
}
