use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    api::models::role_assignments::{RoleAssignmentCreate, RoleAssignmentResponse},
    auth::current_user::CurrentPrincipal,
    authz,
    errors::Result,
    types::RoleScope,
};

/// Action a caller needs to grant roles
pub const MANAGE_MEMBERS: &str = "members.manage";

/// Grant a role to a principal
#[utoipa::path(
    post,
    path = "/role-assignments",
    tag = "role-assignments",
    summary = "Assign role",
    description = "Grants the role identified by `(role_name, scope)`. The caller needs `members.manage`
organization-wide for organization roles, or on `scope_id` for project roles.",
    request_body = RoleAssignmentCreate,
    responses(
        (status = 201, description = "Role assigned", body = RoleAssignmentResponse),
        (status = 400, description = "Scope id missing, unexpected, or naming no project"),
        (status = 401, description = "No session"),
        (status = 403, description = "Caller may not manage members here"),
        (status = 404, description = "No role with this name at this scope"),
        (status = 500, description = "Internal server error"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_role_assignment(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
    Json(create): Json<RoleAssignmentCreate>,
) -> Result<(StatusCode, Json<RoleAssignmentResponse>)> {
    let store = state.store.as_ref();

    let required_scope = match create.scope {
        RoleScope::Organization => None,
        RoleScope::Project => create.scope_id,
    };
    authz::require_permission(store, principal.id, MANAGE_MEMBERS, required_scope).await?;

    let assignment = authz::assign_role_to_user(store, create.principal_id, &create.role_name, create.scope, create.scope_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(RoleAssignmentResponse::new(assignment, create.role_name, create.scope)),
    ))
}

#[cfg(test)]
mod tests {
    use crate::api::models::{permissions::PermissionCheckResponse, role_assignments::RoleAssignmentResponse};
    use crate::authz::assign_role_to_user;
    use crate::db::store::InMemoryAccessStore;
    use crate::test_utils::*;
    use crate::types::RoleScope;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_project_manager_can_grant_on_their_project() {
        let store = InMemoryAccessStore::with_default_catalogue();
        let server = create_test_app(store.clone());
        let manager = create_test_principal(&store);
        let invitee = create_test_principal(&store);
        let p1 = create_test_project(&store);
        assign_role_to_user(&store, manager.id, "Manager", RoleScope::Project, Some(p1))
            .await
            .unwrap();

        let response = server
            .post("/api/v1/role-assignments")
            .add_header("cookie", session_cookie_for(manager.id))
            .json(&json!({
                "principal_id": invitee.id,
                "role_name": "Viewer",
                "scope": "project",
                "scope_id": p1,
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let assignment: RoleAssignmentResponse = response.json();
        assert_eq!(assignment.principal_id, invitee.id);
        assert_eq!(assignment.role_name, "Viewer");
        assert_eq!(assignment.scope, RoleScope::Project);
        assert_eq!(assignment.scope_id, Some(p1));

        // The grant is visible to the very next check
        let response = server
            .post("/api/v1/permissions/check")
            .add_header("cookie", session_cookie_for(invitee.id))
            .json(&json!({ "action": "report.read", "scope_id": p1 }))
            .await;
        assert!(response.json::<PermissionCheckResponse>().allowed);
    }

    #[tokio::test]
    async fn test_project_manager_cannot_grant_elsewhere() {
        let store = InMemoryAccessStore::with_default_catalogue();
        let server = create_test_app(store.clone());
        let manager = create_test_principal(&store);
        let p1 = create_test_project(&store);
        let p2 = create_test_project(&store);
        assign_role_to_user(&store, manager.id, "Manager", RoleScope::Project, Some(p1))
            .await
            .unwrap();

        let response = server
            .post("/api/v1/role-assignments")
            .add_header("cookie", session_cookie_for(manager.id))
            .json(&json!({
                "principal_id": manager.id,
                "role_name": "Manager",
                "scope": "project",
                "scope_id": p2,
            }))
            .await;
        response.assert_status_forbidden();

        let response = server
            .post("/api/v1/role-assignments")
            .add_header("cookie", session_cookie_for(manager.id))
            .json(&json!({
                "principal_id": manager.id,
                "role_name": "Admin",
                "scope": "organization",
            }))
            .await;
        response.assert_status_forbidden();
        assert_eq!(store.role_assignment_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_role_and_bad_scope() {
        let store = InMemoryAccessStore::with_default_catalogue();
        let server = create_test_app(store.clone());
        let owner = create_test_principal(&store);
        assign_role_to_user(&store, owner.id, "Owner", RoleScope::Organization, None)
            .await
            .unwrap();
        let p1 = create_test_project(&store);

        let response = server
            .post("/api/v1/role-assignments")
            .add_header("cookie", session_cookie_for(owner.id))
            .json(&json!({
                "principal_id": owner.id,
                "role_name": "NoSuchRole",
                "scope": "project",
                "scope_id": p1,
            }))
            .await;
        response.assert_status_not_found();

        let response = server
            .post("/api/v1/role-assignments")
            .add_header("cookie", session_cookie_for(owner.id))
            .json(&json!({
                "principal_id": owner.id,
                "role_name": "Viewer",
                "scope": "project",
            }))
            .await;
        response.assert_status_bad_request();

        assert_eq!(store.role_assignment_count(), 1);
    }
}
