//! Access store: the persistence collaborator the gatekeeper and the authorization engine read
//! from, and the role assignment service writes to.
//!
//! Two implementations are provided:
//!
//! - [`postgres::PgAccessStore`]: the production store over a `sqlx` PostgreSQL pool
//! - [`in_memory::InMemoryAccessStore`]: a process-local store for tests and local development
//!
//! The core performs no locking and no retries against the store. It relies on the store's
//! own read-after-write guarantee so that a role granted in one flow is visible to the next
//! permission check in the same flow.

use crate::db::errors::Result;
use crate::db::models::{
    organizations::OrganizationDBResponse,
    principals::PrincipalDBResponse,
    role_assignments::{AssignmentGrantRow, RoleAssignmentCreateDBRequest, RoleAssignmentDBResponse},
    roles::RoleDBResponse,
};
use crate::types::{OrganizationId, PrincipalId, ProjectId, RoleScope};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryAccessStore;
pub use postgres::PgAccessStore;

/// Storage trait for principals, organizations and the RBAC tables.
#[async_trait::async_trait]
pub trait AccessStore: Send + Sync {
    /// Load a principal profile by id.
    async fn get_principal(&self, id: PrincipalId) -> Result<Option<PrincipalDBResponse>>;

    /// Load an organization by id.
    async fn get_organization(&self, id: OrganizationId) -> Result<Option<OrganizationDBResponse>>;

    /// Whether a project with this id exists.
    async fn project_exists(&self, id: ProjectId) -> Result<bool>;

    /// Resolve a role by its compound `(name, scope)` key.
    async fn find_role(&self, name: &str, scope: RoleScope) -> Result<Option<RoleDBResponse>>;

    /// Load every role assignment held by a principal, joined to its role and the role's
    /// granted actions. Roles without permission rows carry an empty action list.
    async fn list_assignment_grants(&self, principal_id: PrincipalId) -> Result<Vec<AssignmentGrantRow>>;

    /// Insert a role assignment. No deduplication is performed.
    async fn create_role_assignment(&self, request: &RoleAssignmentCreateDBRequest) -> Result<RoleAssignmentDBResponse>;
}
