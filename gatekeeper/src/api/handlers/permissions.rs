use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::permissions::{PermissionCheckRequest, PermissionCheckResponse},
    auth::current_user::CurrentPrincipal,
    authz,
    errors::{Error, Result},
};

/// Check whether the caller holds a permission
#[utoipa::path(
    post,
    path = "/permissions/check",
    tag = "permissions",
    summary = "Check permission",
    description = "Answers whether the caller may perform `action`, organization-wide or within the project `scope_id`.
A failure to read the caller's roles is answered with `allowed: false`.",
    request_body = PermissionCheckRequest,
    responses(
        (status = 200, description = "Check result", body = PermissionCheckResponse),
        (status = 400, description = "Empty action"),
        (status = 401, description = "No session"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn check_permission(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
    Json(request): Json<PermissionCheckRequest>,
) -> Result<Json<PermissionCheckResponse>> {
    if request.action.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "action must not be empty".to_string(),
        });
    }

    let allowed = authz::has_permission(state.store.as_ref(), principal.id, &request.action, request.scope_id).await;
    Ok(Json(PermissionCheckResponse { allowed }))
}
