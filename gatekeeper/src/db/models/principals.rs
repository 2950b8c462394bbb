//! Database models for principals.

use crate::types::{OrganizationId, PrincipalId, PrincipalTier};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating a principal profile
#[derive(Debug, Clone)]
pub struct PrincipalCreateDBRequest {
    pub tier: PrincipalTier,
    pub organization_id: Option<OrganizationId>,
    pub onboarding_completed: bool,
}

/// Database response for a principal profile
#[derive(Debug, Clone, FromRow)]
pub struct PrincipalDBResponse {
    pub id: PrincipalId,
    pub tier: PrincipalTier,
    pub onboarding_completed: bool,
    pub organization_id: Option<OrganizationId>,
    pub created_at: DateTime<Utc>,
}
