//! Granting named, scoped roles to principals.

use tracing::{error, info, instrument};

use crate::{
    db::{
        models::role_assignments::{RoleAssignmentCreateDBRequest, RoleAssignmentDBResponse},
        store::AccessStore,
    },
    errors::{Error, Result},
    types::{PrincipalId, ProjectId, RoleScope, abbrev_uuid},
};

/// Grant the role `(role_name, scope)` to a principal.
///
/// Project roles need the id of an existing project; organization roles must not carry one.
/// Nothing is inserted when the role is unknown or the scope is wrong. Identical assignments are
/// not deduplicated.
#[instrument(skip(store), fields(principal_id = %abbrev_uuid(&principal_id)), err)]
pub async fn assign_role_to_user(
    store: &dyn AccessStore,
    principal_id: PrincipalId,
    role_name: &str,
    scope: RoleScope,
    scope_id: Option<ProjectId>,
) -> Result<RoleAssignmentDBResponse> {
    let role = store.find_role(role_name, scope).await?.ok_or_else(|| Error::RoleNotFound {
        name: role_name.to_string(),
        scope,
    })?;

    match (scope, scope_id) {
        (RoleScope::Organization, None) => {}
        (RoleScope::Organization, Some(_)) => {
            return Err(Error::InvalidScope {
                message: format!("organization role {role_name} cannot be bound to a project"),
            });
        }
        (RoleScope::Project, None) => {
            return Err(Error::InvalidScope {
                message: format!("project role {role_name} requires a project id"),
            });
        }
        (RoleScope::Project, Some(project_id)) => {
            if !store.project_exists(project_id).await? {
                return Err(Error::InvalidScope {
                    message: format!("project {project_id} does not exist"),
                });
            }
        }
    }

    let assignment = store
        .create_role_assignment(&RoleAssignmentCreateDBRequest {
            principal_id,
            role_id: role.id,
            scope_id,
        })
        .await?;

    info!(assignment_id = %abbrev_uuid(&assignment.id), "Role assigned");
    Ok(assignment)
}

/// [`assign_role_to_user`] as a side effect of another operation: failures are logged and
/// swallowed so the primary operation still succeeds.
pub async fn grant_role_best_effort(
    store: &dyn AccessStore,
    principal_id: PrincipalId,
    role_name: &str,
    scope: RoleScope,
    scope_id: Option<ProjectId>,
) -> Option<RoleAssignmentDBResponse> {
    match assign_role_to_user(store, principal_id, role_name, scope, scope_id).await {
        Ok(assignment) => Some(assignment),
        Err(e) => {
            error!(
                principal_id = %abbrev_uuid(&principal_id),
                role = role_name,
                %scope,
                error = %e,
                "Failed to grant role"
            );
            None
        }
    }
}
