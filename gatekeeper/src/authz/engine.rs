//! Permission resolution across organization- and project-scoped role assignments.

use std::collections::HashSet;

use tracing::{error, instrument, trace};

use crate::{
    db::{
        models::{role_assignments::AssignmentGrantRow, roles::OWNER_ROLE},
        store::AccessStore,
    },
    errors::{Error, Result},
    types::{PrincipalId, ProjectId, RoleScope, abbrev_uuid},
};

/// What a role grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleGrant {
    /// The organization owner role: every action, no permission rows needed
    Owner,
    /// Exactly these actions
    Named(HashSet<String>),
}

impl RoleGrant {
    fn allows(&self, action: &str) -> bool {
        match self {
            RoleGrant::Owner => true,
            RoleGrant::Named(actions) => actions.contains(action),
        }
    }
}

/// One loaded role assignment, reduced to what permission checks need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedGrant {
    pub scope: RoleScope,
    /// Project the assignment is bound to (project-scoped roles only)
    pub scope_id: Option<ProjectId>,
    pub grant: RoleGrant,
}

impl From<AssignmentGrantRow> for ScopedGrant {
    fn from(row: AssignmentGrantRow) -> Self {
        let grant = match row.role_scope {
            RoleScope::Organization if row.role_name == OWNER_ROLE => RoleGrant::Owner,
            _ => RoleGrant::Named(row.actions.into_iter().collect()),
        };
        Self {
            scope: row.role_scope,
            scope_id: row.scope_id,
            grant,
        }
    }
}

impl ScopedGrant {
    /// Organization grants apply everywhere. Project grants apply only to a request for their own
    /// project.
    pub fn grants(&self, action: &str, scope_id: Option<ProjectId>) -> bool {
        match self.scope {
            RoleScope::Organization => self.grant.allows(action),
            RoleScope::Project => self.scope_id.is_some() && self.scope_id == scope_id && self.grant.allows(action),
        }
    }
}

/// Whether `principal_id` may perform `action`, globally or within project `scope_id`.
///
/// Any failure loading the principal's assignments is a denial. Nothing is retried.
#[instrument(skip(store), fields(principal_id = %abbrev_uuid(&principal_id)))]
pub async fn has_permission(store: &dyn AccessStore, principal_id: PrincipalId, action: &str, scope_id: Option<ProjectId>) -> bool {
    let rows = match store.list_assignment_grants(principal_id).await {
        Ok(rows) => rows,
        Err(e) => {
            error!(error = %e, "Permission check failed, denying");
            return false;
        }
    };

    let allowed = rows.into_iter().map(ScopedGrant::from).any(|grant| grant.grants(action, scope_id));
    trace!(allowed, "Permission check");
    allowed
}

/// [`has_permission`] for handlers: a denial becomes [`Error::InsufficientPermissions`].
pub async fn require_permission(
    store: &dyn AccessStore,
    principal_id: PrincipalId,
    action: &str,
    scope_id: Option<ProjectId>,
) -> Result<()> {
    if has_permission(store, principal_id, action, scope_id).await {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            action: action.to_string(),
            scope: scope_id,
        })
    }
}
