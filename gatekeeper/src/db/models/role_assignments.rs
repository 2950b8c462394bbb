//! Database models for role assignments.

use crate::types::{PrincipalId, ProjectId, RoleAssignmentId, RoleId, RoleScope};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating a role assignment
#[derive(Debug, Clone)]
pub struct RoleAssignmentCreateDBRequest {
    pub principal_id: PrincipalId,
    pub role_id: RoleId,
    /// Project id for project-scoped roles, `None` for organization-scoped ones
    pub scope_id: Option<ProjectId>,
}

/// Database response for a role assignment
#[derive(Debug, Clone, FromRow)]
pub struct RoleAssignmentDBResponse {
    pub id: RoleAssignmentId,
    pub principal_id: PrincipalId,
    pub role_id: RoleId,
    pub scope_id: Option<ProjectId>,
    pub created_at: DateTime<Utc>,
}

/// A principal's role assignment joined to its role and the role's granted actions.
#[derive(Debug, Clone, FromRow)]
pub struct AssignmentGrantRow {
    pub assignment_id: RoleAssignmentId,
    pub scope_id: Option<ProjectId>,
    pub role_name: String,
    pub role_scope: RoleScope,
    pub actions: Vec<String>,
}
