//! Database models for organizations and the projects they own.

use crate::types::{OrganizationId, ProjectId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating an organization
#[derive(Debug, Clone)]
pub struct OrganizationCreateDBRequest {
    pub name: String,
}

/// Database response for an organization
#[derive(Debug, Clone, FromRow)]
pub struct OrganizationDBResponse {
    pub id: OrganizationId,
    pub name: String,
    /// Flipped by the setup flow; never flips back.
    pub setup_completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Database request for creating a project
#[derive(Debug, Clone)]
pub struct ProjectCreateDBRequest {
    pub organization_id: OrganizationId,
    pub name: String,
}

/// Database response for a project
#[derive(Debug, Clone, FromRow)]
pub struct ProjectDBResponse {
    pub id: ProjectId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
