//! Database models for the role/permission catalogue.

use crate::types::{RoleId, RoleScope};
use sqlx::FromRow;

/// Name of the organization-scoped role that bypasses per-permission checks.
pub const OWNER_ROLE: &str = "Owner";

/// Database response for a role
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RoleDBResponse {
    pub id: RoleId,
    pub name: String,
    pub scope: RoleScope,
}

/// Roles provisioned by the seed migration, with the actions each one is granted.
///
/// Kept in sync with `migrations/0002_seed_roles.sql`; the in-memory store seeds from it.
pub const DEFAULT_ROLE_CATALOGUE: &[(&str, RoleScope, &[&str])] = &[
    (OWNER_ROLE, RoleScope::Organization, &[]),
    (
        "Admin",
        RoleScope::Organization,
        &[
            "organization.manage",
            "members.manage",
            "project.create",
            "project.read",
            "project.update",
            "project.delete",
            "okr.read",
            "okr.write",
            "chat.read",
            "chat.write",
            "report.read",
        ],
    ),
    (
        "Member",
        RoleScope::Organization,
        &["project.create", "project.read", "okr.read", "chat.read", "chat.write", "report.read"],
    ),
    (
        "Manager",
        RoleScope::Project,
        &[
            "project.read",
            "project.update",
            "members.manage",
            "okr.read",
            "okr.write",
            "chat.read",
            "chat.write",
            "report.read",
        ],
    ),
    (
        "Contributor",
        RoleScope::Project,
        &["project.read", "okr.read", "okr.write", "chat.read", "chat.write"],
    ),
    ("Viewer", RoleScope::Project, &["project.read", "okr.read", "chat.read", "report.read"]),
];
