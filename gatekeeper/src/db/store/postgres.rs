//! PostgreSQL implementation of [`AccessStore`].

use crate::db::{
    errors::Result,
    models::{
        organizations::OrganizationDBResponse,
        principals::PrincipalDBResponse,
        role_assignments::{AssignmentGrantRow, RoleAssignmentCreateDBRequest, RoleAssignmentDBResponse},
        roles::RoleDBResponse,
    },
    store::AccessStore,
};
use crate::types::{OrganizationId, PrincipalId, ProjectId, RoleScope, abbrev_uuid};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

/// Access store backed by a PostgreSQL pool.
///
/// Every method runs as a single statement on a pooled connection, so reads observe any
/// assignment committed before them.
#[derive(Clone)]
pub struct PgAccessStore {
    pool: PgPool,
}

impl PgAccessStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl AccessStore for PgAccessStore {
    #[instrument(skip(self), fields(principal_id = %abbrev_uuid(&id)), err)]
    async fn get_principal(&self, id: PrincipalId) -> Result<Option<PrincipalDBResponse>> {
        let principal = sqlx::query_as::<_, PrincipalDBResponse>(
            "SELECT id, tier, onboarding_completed, organization_id, created_at FROM principals WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(principal)
    }

    #[instrument(skip(self), fields(organization_id = %abbrev_uuid(&id)), err)]
    async fn get_organization(&self, id: OrganizationId) -> Result<Option<OrganizationDBResponse>> {
        let organization = sqlx::query_as::<_, OrganizationDBResponse>(
            "SELECT id, name, setup_completed, created_at FROM organizations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(organization)
    }

    #[instrument(skip(self), fields(project_id = %abbrev_uuid(&id)), err)]
    async fn project_exists(&self, id: ProjectId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    #[instrument(skip(self), err)]
    async fn find_role(&self, name: &str, scope: RoleScope) -> Result<Option<RoleDBResponse>> {
        let role = sqlx::query_as::<_, RoleDBResponse>("SELECT id, name, scope FROM roles WHERE name = $1 AND scope = $2")
            .bind(name)
            .bind(scope)
            .fetch_optional(&self.pool)
            .await?;

        Ok(role)
    }

    #[instrument(skip(self), fields(principal_id = %abbrev_uuid(&principal_id)), err)]
    async fn list_assignment_grants(&self, principal_id: PrincipalId) -> Result<Vec<AssignmentGrantRow>> {
        let rows = sqlx::query_as::<_, AssignmentGrantRow>(
            r#"
            SELECT
                ra.id AS assignment_id,
                ra.scope_id,
                r.name AS role_name,
                r.scope AS role_scope,
                COALESCE(array_agg(p.action) FILTER (WHERE p.action IS NOT NULL), '{}') AS actions
            FROM role_assignments ra
            JOIN roles r ON r.id = ra.role_id
            LEFT JOIN role_permissions rp ON rp.role_id = r.id
            LEFT JOIN permissions p ON p.id = rp.permission_id
            WHERE ra.principal_id = $1
            GROUP BY ra.id, ra.scope_id, r.name, r.scope
            "#,
        )
        .bind(principal_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    #[instrument(skip(self, request), fields(principal_id = %abbrev_uuid(&request.principal_id), role_id = %abbrev_uuid(&request.role_id)), err)]
    async fn create_role_assignment(&self, request: &RoleAssignmentCreateDBRequest) -> Result<RoleAssignmentDBResponse> {
        let assignment = sqlx::query_as::<_, RoleAssignmentDBResponse>(
            r#"
            INSERT INTO role_assignments (id, principal_id, role_id, scope_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, principal_id, role_id, scope_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.principal_id)
        .bind(request.role_id)
        .bind(request.scope_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(assignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::{assign_role_to_user, has_permission};
    use crate::db::errors::DbError;
    use crate::db::models::roles::DEFAULT_ROLE_CATALOGUE;
    use crate::types::PrincipalTier;

    async fn insert_organization(pool: &PgPool, setup_completed: bool) -> OrganizationId {
        sqlx::query_scalar("INSERT INTO organizations (id, name, setup_completed) VALUES ($1, $2, $3) RETURNING id")
            .bind(Uuid::new_v4())
            .bind("Acme")
            .bind(setup_completed)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn insert_principal(pool: &PgPool, tier: PrincipalTier, organization_id: Option<OrganizationId>) -> PrincipalId {
        sqlx::query_scalar("INSERT INTO principals (id, tier, onboarding_completed, organization_id) VALUES ($1, $2, TRUE, $3) RETURNING id")
            .bind(Uuid::new_v4())
            .bind(tier)
            .bind(organization_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn insert_project(pool: &PgPool, organization_id: OrganizationId) -> ProjectId {
        sqlx::query_scalar("INSERT INTO projects (id, organization_id, name) VALUES ($1, $2, 'Roadmap') RETURNING id")
            .bind(Uuid::new_v4())
            .bind(organization_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test]
    async fn test_profile_reads(pool: PgPool) {
        let store = PgAccessStore::new(pool.clone());
        let org_id = insert_organization(&pool, false).await;
        let principal_id = insert_principal(&pool, PrincipalTier::Elevated, Some(org_id)).await;
        let project_id = insert_project(&pool, org_id).await;

        let principal = store.get_principal(principal_id).await.unwrap().unwrap();
        assert_eq!(principal.tier, PrincipalTier::Elevated);
        assert_eq!(principal.organization_id, Some(org_id));

        let organization = store.get_organization(org_id).await.unwrap().unwrap();
        assert!(!organization.setup_completed);

        assert!(store.project_exists(project_id).await.unwrap());
        assert!(!store.project_exists(Uuid::new_v4()).await.unwrap());
        assert!(store.get_principal(Uuid::new_v4()).await.unwrap().is_none());
        assert!(store.get_organization(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn test_seeded_catalogue_matches_in_memory_catalogue(pool: PgPool) {
        let store = PgAccessStore::new(pool.clone());
        let org_id = insert_organization(&pool, true).await;
        let project_id = insert_project(&pool, org_id).await;

        for (name, scope, actions) in DEFAULT_ROLE_CATALOGUE {
            let role = store.find_role(name, *scope).await.unwrap();
            assert!(role.is_some(), "{name} ({scope}) should be seeded");

            let principal_id = insert_principal(&pool, PrincipalTier::Standard, Some(org_id)).await;
            let scope_id = (*scope == RoleScope::Project).then_some(project_id);
            assign_role_to_user(&store, principal_id, name, *scope, scope_id).await.unwrap();

            let grants = store.list_assignment_grants(principal_id).await.unwrap();
            assert_eq!(grants.len(), 1);
            assert_eq!(grants[0].role_name, *name);
            assert_eq!(grants[0].role_scope, *scope);
            assert_eq!(grants[0].scope_id, scope_id);

            let mut seeded = grants[0].actions.clone();
            seeded.sort();
            let mut expected: Vec<String> = actions.iter().map(|a| a.to_string()).collect();
            expected.sort();
            assert_eq!(seeded, expected, "{name} ({scope})");
        }

        assert!(store.find_role("Manager", RoleScope::Organization).await.unwrap().is_none());
        assert!(store.find_role("owner", RoleScope::Organization).await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn test_owner_grant_has_no_listed_actions(pool: PgPool) {
        let store = PgAccessStore::new(pool.clone());
        let org_id = insert_organization(&pool, true).await;
        let project_id = insert_project(&pool, org_id).await;
        let principal_id = insert_principal(&pool, PrincipalTier::Elevated, Some(org_id)).await;

        assign_role_to_user(&store, principal_id, "Owner", RoleScope::Organization, None)
            .await
            .unwrap();

        let grants = store.list_assignment_grants(principal_id).await.unwrap();
        assert_eq!(grants.len(), 1);
        assert!(grants[0].actions.is_empty());

        assert!(has_permission(&store, principal_id, "organization.delete", None).await);
        assert!(has_permission(&store, principal_id, "okr.write", Some(project_id)).await);
    }

    #[sqlx::test]
    async fn test_duplicate_assignments_are_separate_rows(pool: PgPool) {
        let store = PgAccessStore::new(pool.clone());
        let org_id = insert_organization(&pool, true).await;
        let project_id = insert_project(&pool, org_id).await;
        let principal_id = insert_principal(&pool, PrincipalTier::Standard, Some(org_id)).await;

        let first = assign_role_to_user(&store, principal_id, "Viewer", RoleScope::Project, Some(project_id))
            .await
            .unwrap();
        let second = assign_role_to_user(&store, principal_id, "Viewer", RoleScope::Project, Some(project_id))
            .await
            .unwrap();
        assert_ne!(first.id, second.id);

        let grants = store.list_assignment_grants(principal_id).await.unwrap();
        assert_eq!(grants.len(), 2);
        assert!(has_permission(&store, principal_id, "report.read", Some(project_id)).await);
        assert!(!has_permission(&store, principal_id, "okr.write", Some(project_id)).await);
    }

    #[sqlx::test]
    async fn test_dangling_references_are_foreign_key_violations(pool: PgPool) {
        let store = PgAccessStore::new(pool.clone());
        let org_id = insert_organization(&pool, true).await;
        let principal_id = insert_principal(&pool, PrincipalTier::Standard, Some(org_id)).await;
        let viewer = store.find_role("Viewer", RoleScope::Project).await.unwrap().unwrap();
        let project_id = insert_project(&pool, org_id).await;

        let err = store
            .create_role_assignment(&RoleAssignmentCreateDBRequest {
                principal_id: Uuid::new_v4(),
                role_id: viewer.id,
                scope_id: Some(project_id),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::ForeignKeyViolation { constraint: Some(ref c), .. } if c == "role_assignments_principal_id_fkey"
        ));

        let err = store
            .create_role_assignment(&RoleAssignmentCreateDBRequest {
                principal_id,
                role_id: viewer.id,
                scope_id: Some(Uuid::new_v4()),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::ForeignKeyViolation { constraint: Some(ref c), .. } if c == "role_assignments_scope_id_fkey"
        ));

        assert!(store.list_assignment_grants(principal_id).await.unwrap().is_empty());
    }
}
