//! Test utilities shared by unit and handler tests.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{ServiceExt, middleware::from_fn_with_state};
use axum_test::TestServer;
use parking_lot::Mutex;
use tower::Layer;

use crate::{
    AppState,
    auth::{
        identity::{Credentials, IdentityError, IdentityProvider, JwtIdentityProvider, RefreshedSession},
        refresher::SessionRefresher,
        session,
    },
    config::{Config, DatabaseConfig, IdentityConfig, IdentityProviderKind, JwtSessionConfig, RoutesConfig, TenantsConfig},
    db::{
        models::{
            organizations::{OrganizationCreateDBRequest, ProjectCreateDBRequest},
            principals::{PrincipalCreateDBRequest, PrincipalDBResponse},
        },
        store::InMemoryAccessStore,
    },
    gate::{Gatekeeper, middleware::gate_middleware},
    types::{PrincipalId, PrincipalTier, ProjectId},
};

pub const TEST_SECRET_KEY: &str = "test-secret-key-for-testing-only";

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: None,
        database: DatabaseConfig::Memory,
        secret_key: Some(TEST_SECRET_KEY.to_string()),
        enable_otel_export: false,
        tenants: TenantsConfig {
            admin_host: "admin.example.com".to_string(),
            app_host: "app.example.com".to_string(),
            production: false,
            ..Default::default()
        },
        routes: RoutesConfig::default(),
        identity: IdentityConfig {
            provider: IdentityProviderKind::Jwt,
            jwt: JwtSessionConfig {
                cookie_secure: false,
                ..Default::default()
            },
            ..Default::default()
        },
    }
}

/// Identity provider whose answer is set by the test.
#[derive(Default)]
pub struct StaticIdentityProvider {
    principal: Mutex<Option<PrincipalId>>,
    set_cookies: Mutex<Vec<String>>,
}

impl StaticIdentityProvider {
    pub fn sign_in(&self, principal_id: PrincipalId) {
        *self.principal.lock() = Some(principal_id);
    }

    pub fn set_cookies(&self, cookies: Vec<String>) {
        *self.set_cookies.lock() = cookies;
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn refresh_session(&self, _credentials: &Credentials) -> Result<RefreshedSession, IdentityError> {
        Ok(RefreshedSession {
            principal_id: *self.principal.lock(),
            set_cookies: self.set_cookies.lock().clone(),
        })
    }
}

/// App state over an in-memory store, authenticating with real JWT session cookies.
pub fn create_test_app_state(store: InMemoryAccessStore, config: Config) -> AppState {
    let store: Arc<dyn crate::db::store::AccessStore> = Arc::new(store);
    let identity = Arc::new(JwtIdentityProvider::new(config.secret_key.clone(), config.identity.jwt.clone()));
    let gatekeeper = Arc::new(Gatekeeper::new(&config, store.clone(), SessionRefresher::new(identity)));

    AppState::builder().store(store).gatekeeper(gatekeeper).build()
}

/// Full router behind the gate middleware, as `Application::serve` runs it.
pub fn create_test_app(store: InMemoryAccessStore) -> TestServer {
    let state = create_test_app_state(store, create_test_config());
    let gatekeeper = state.gatekeeper.clone();
    let router = crate::build_router(state);

    let service = from_fn_with_state(gatekeeper, gate_middleware).layer(router);
    TestServer::new(service.into_make_service()).expect("Failed to create test server")
}

/// `Cookie` header value carrying a valid session for `principal_id` under the test config.
pub fn session_cookie_for(principal_id: PrincipalId) -> String {
    let config = create_test_config();
    let token = session::create_session_token(principal_id, TEST_SECRET_KEY, &config.identity.jwt).expect("Failed to sign test session");
    format!("{}={}", config.identity.jwt.cookie_name, token)
}

/// An onboarded principal with no organization.
pub fn create_test_principal(store: &InMemoryAccessStore) -> PrincipalDBResponse {
    store.insert_principal(PrincipalCreateDBRequest {
        tier: PrincipalTier::Standard,
        organization_id: None,
        onboarding_completed: true,
    })
}

pub fn create_test_project(store: &InMemoryAccessStore) -> ProjectId {
    let org = store.insert_organization(OrganizationCreateDBRequest {
        name: format!("org-{}", uuid::Uuid::new_v4()),
    });
    store
        .insert_project(ProjectCreateDBRequest {
            organization_id: org.id,
            name: "Test Project".to_string(),
        })
        .id
}
