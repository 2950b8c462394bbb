//! In-memory implementation of [`AccessStore`].
//!
//! Holds every table in a single `RwLock`, so each call observes a consistent snapshot and
//! writes are immediately visible to later reads. Suitable for tests and local development.
//! Data is lost on restart.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::anyhow;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::db::{
    errors::{DbError, Result},
    models::{
        organizations::{OrganizationCreateDBRequest, OrganizationDBResponse, ProjectCreateDBRequest, ProjectDBResponse},
        principals::{PrincipalCreateDBRequest, PrincipalDBResponse},
        role_assignments::{AssignmentGrantRow, RoleAssignmentCreateDBRequest, RoleAssignmentDBResponse},
        roles::{DEFAULT_ROLE_CATALOGUE, RoleDBResponse},
    },
    store::AccessStore,
};
use crate::types::{OrganizationId, PrincipalId, ProjectId, RoleId, RoleScope};

#[derive(Default)]
struct Tables {
    principals: HashMap<PrincipalId, PrincipalDBResponse>,
    organizations: HashMap<OrganizationId, OrganizationDBResponse>,
    projects: HashMap<ProjectId, ProjectDBResponse>,
    roles: HashMap<RoleId, RoleDBResponse>,
    role_actions: HashMap<RoleId, Vec<String>>,
    // Insertion order is kept so listings are deterministic.
    assignments: Vec<RoleAssignmentDBResponse>,
}

/// In-memory access store.
///
/// # Example
/// ```ignore
/// let store = InMemoryAccessStore::with_default_catalogue();
/// let org = store.insert_organization(OrganizationCreateDBRequest { name: "Acme".into() });
/// ```
#[derive(Clone, Default)]
pub struct InMemoryAccessStore {
    tables: Arc<RwLock<Tables>>,
    fail_reads: Arc<AtomicBool>,
}

impl InMemoryAccessStore {
    /// Create an empty store with no roles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the same role catalogue as the seed migration.
    pub fn with_default_catalogue() -> Self {
        let store = Self::new();
        for (name, scope, actions) in DEFAULT_ROLE_CATALOGUE {
            store.insert_role(name, *scope, actions);
        }
        store
    }

    /// Make every read fail with a store error until reset. Writes are unaffected.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check_reads(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DbError::Other(anyhow!("in-memory store reads are disabled")));
        }
        Ok(())
    }

    pub fn insert_organization(&self, request: OrganizationCreateDBRequest) -> OrganizationDBResponse {
        let organization = OrganizationDBResponse {
            id: Uuid::new_v4(),
            name: request.name,
            setup_completed: false,
            created_at: Utc::now(),
        };
        self.tables.write().organizations.insert(organization.id, organization.clone());
        organization
    }

    /// Flip an organization's setup flag to complete. There is no way back.
    pub fn complete_organization_setup(&self, id: OrganizationId) -> Result<()> {
        let mut tables = self.tables.write();
        let organization = tables.organizations.get_mut(&id).ok_or(DbError::NotFound)?;
        organization.setup_completed = true;
        Ok(())
    }

    pub fn insert_principal(&self, request: PrincipalCreateDBRequest) -> PrincipalDBResponse {
        let principal = PrincipalDBResponse {
            id: Uuid::new_v4(),
            tier: request.tier,
            onboarding_completed: request.onboarding_completed,
            organization_id: request.organization_id,
            created_at: Utc::now(),
        };
        self.tables.write().principals.insert(principal.id, principal.clone());
        principal
    }

    pub fn insert_project(&self, request: ProjectCreateDBRequest) -> ProjectDBResponse {
        let project = ProjectDBResponse {
            id: Uuid::new_v4(),
            organization_id: request.organization_id,
            name: request.name,
            created_at: Utc::now(),
        };
        self.tables.write().projects.insert(project.id, project.clone());
        project
    }

    /// Provision a role with the given granted actions.
    pub fn insert_role(&self, name: &str, scope: RoleScope, actions: &[&str]) -> RoleDBResponse {
        let role = RoleDBResponse {
            id: Uuid::new_v4(),
            name: name.to_string(),
            scope,
        };
        let mut tables = self.tables.write();
        tables.roles.insert(role.id, role.clone());
        tables
            .role_actions
            .insert(role.id, actions.iter().map(|action| action.to_string()).collect());
        role
    }

    /// Remove every assignment of a principal. Used to model revocation.
    pub fn remove_assignments(&self, principal_id: PrincipalId) -> usize {
        let mut tables = self.tables.write();
        let before = tables.assignments.len();
        tables.assignments.retain(|a| a.principal_id != principal_id);
        before - tables.assignments.len()
    }

    pub fn role_assignment_count(&self) -> usize {
        self.tables.read().assignments.len()
    }
}

#[async_trait::async_trait]
impl AccessStore for InMemoryAccessStore {
    async fn get_principal(&self, id: PrincipalId) -> Result<Option<PrincipalDBResponse>> {
        self.check_reads()?;
        Ok(self.tables.read().principals.get(&id).cloned())
    }

    async fn get_organization(&self, id: OrganizationId) -> Result<Option<OrganizationDBResponse>> {
        self.check_reads()?;
        Ok(self.tables.read().organizations.get(&id).cloned())
    }

    async fn project_exists(&self, id: ProjectId) -> Result<bool> {
        self.check_reads()?;
        Ok(self.tables.read().projects.contains_key(&id))
    }

    async fn find_role(&self, name: &str, scope: RoleScope) -> Result<Option<RoleDBResponse>> {
        self.check_reads()?;
        let tables = self.tables.read();
        Ok(tables.roles.values().find(|r| r.name == name && r.scope == scope).cloned())
    }

    async fn list_assignment_grants(&self, principal_id: PrincipalId) -> Result<Vec<AssignmentGrantRow>> {
        self.check_reads()?;
        let tables = self.tables.read();

        let rows = tables
            .assignments
            .iter()
            .filter(|a| a.principal_id == principal_id)
            .filter_map(|a| {
                let role = tables.roles.get(&a.role_id)?;
                Some(AssignmentGrantRow {
                    assignment_id: a.id,
                    scope_id: a.scope_id,
                    role_name: role.name.clone(),
                    role_scope: role.scope,
                    actions: tables.role_actions.get(&role.id).cloned().unwrap_or_default(),
                })
            })
            .collect();

        Ok(rows)
    }

    async fn create_role_assignment(&self, request: &RoleAssignmentCreateDBRequest) -> Result<RoleAssignmentDBResponse> {
        let mut tables = self.tables.write();

        if !tables.principals.contains_key(&request.principal_id) {
            return Err(DbError::ForeignKeyViolation {
                constraint: Some("role_assignments_principal_id_fkey".to_string()),
                table: Some("role_assignments".to_string()),
                message: format!("principal {} does not exist", request.principal_id),
            });
        }
        if !tables.roles.contains_key(&request.role_id) {
            return Err(DbError::ForeignKeyViolation {
                constraint: Some("role_assignments_role_id_fkey".to_string()),
                table: Some("role_assignments".to_string()),
                message: format!("role {} does not exist", request.role_id),
            });
        }
        if let Some(scope_id) = request.scope_id
            && !tables.projects.contains_key(&scope_id)
        {
            return Err(DbError::ForeignKeyViolation {
                constraint: Some("role_assignments_scope_id_fkey".to_string()),
                table: Some("role_assignments".to_string()),
                message: format!("project {scope_id} does not exist"),
            });
        }

        let assignment = RoleAssignmentDBResponse {
            id: Uuid::new_v4(),
            principal_id: request.principal_id,
            role_id: request.role_id,
            scope_id: request.scope_id,
            created_at: Utc::now(),
        };
        tables.assignments.push(assignment.clone());
        Ok(assignment)
    }
}
