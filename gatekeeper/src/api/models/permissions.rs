//! API request/response models for permission checks.

use crate::types::ProjectId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Ask whether the caller may perform an action.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PermissionCheckRequest {
    /// Action identifier
    #[schema(example = "okr.write")]
    pub action: String,
    /// Project to check within. Omit for an organization-wide check.
    #[serde(default)]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub scope_id: Option<ProjectId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PermissionCheckResponse {
    pub allowed: bool,
}
