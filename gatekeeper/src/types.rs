//! Common type definitions shared by the gatekeeper pipeline and the authorization engine.
//!
//! # ID Types
//!
//! All entity IDs are UUIDs wrapped in type aliases for readability:
//!
//! - [`PrincipalId`]: authenticated actor
//! - [`OrganizationId`]: tenant organization
//! - [`ProjectId`]: project, the only resource scope below an organization
//! - [`RoleId`], [`PermissionId`], [`RoleAssignmentId`]: RBAC catalogue rows
//!
//! # Scopes
//!
//! A [`RoleScope`] says at which granularity a role applies. The same role name may exist at
//! both scopes, so `(name, scope)` is the lookup key for a role.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

// Type aliases for IDs
pub type PrincipalId = Uuid;
pub type OrganizationId = Uuid;
pub type ProjectId = Uuid;
pub type RoleId = Uuid;
pub type PermissionId = Uuid;
pub type RoleAssignmentId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// Granularity at which a role applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "role_scope", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RoleScope {
    Organization,
    Project,
}

impl fmt::Display for RoleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleScope::Organization => write!(f, "organization"),
            RoleScope::Project => write!(f, "project"),
        }
    }
}

/// Principal tier. Elevated principals administer an organization and must finish its setup
/// before they reach the main app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "principal_tier", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PrincipalTier {
    Elevated,
    Standard,
}
