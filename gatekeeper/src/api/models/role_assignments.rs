//! API request/response models for role assignments.

use crate::db::models::role_assignments::RoleAssignmentDBResponse;
use crate::types::{PrincipalId, ProjectId, RoleAssignmentId, RoleId, RoleScope};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for granting a role.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleAssignmentCreate {
    /// Principal receiving the role
    #[schema(value_type = String, format = "uuid")]
    pub principal_id: PrincipalId,
    /// Role name, looked up together with `scope`
    #[schema(example = "Manager")]
    pub role_name: String,
    pub scope: RoleScope,
    /// Project id. Required for project roles, forbidden for organization roles.
    #[serde(default)]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub scope_id: Option<ProjectId>,
}

/// A role assignment as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleAssignmentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: RoleAssignmentId,
    #[schema(value_type = String, format = "uuid")]
    pub principal_id: PrincipalId,
    #[schema(value_type = String, format = "uuid")]
    pub role_id: RoleId,
    pub role_name: String,
    pub scope: RoleScope,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub scope_id: Option<ProjectId>,
    pub created_at: DateTime<Utc>,
}

impl RoleAssignmentResponse {
    pub fn new(assignment: RoleAssignmentDBResponse, role_name: String, scope: RoleScope) -> Self {
        Self {
            id: assignment.id,
            principal_id: assignment.principal_id,
            role_id: assignment.role_id,
            role_name,
            scope,
            scope_id: assignment.scope_id,
            created_at: assignment.created_at,
        }
    }
}
