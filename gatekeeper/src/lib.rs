//! # gatekeeper: edge request gating and scoped RBAC
//!
//! `gatekeeper` sits in front of a multi-tenant workspace product that serves an admin console and
//! a customer-facing app from one process. Every inbound request passes through one pipeline that
//! decides, before any handler runs, whether to pass it through, redirect it, rewrite it onto an
//! internal path, or reject it. Behind the pipeline a small RBAC engine answers whether a principal
//! may perform an action, organization-wide or within a single project.
//!
//! ## Request Flow
//!
//! ```text
//!   request ──► tenant ──► session refresh ──► cross-tenant ──► auth ──► onboarding ──► rewrite
//!               (host)     (cookies out)       (app + /admin)   (login)  (setup)        (admin)
//! ```
//!
//! The **tenant resolver** ([`tenant`]) classifies the hostname as admin, app or dev. The
//! **session refresher** ([`auth`]) asks the identity collaborator to refresh the caller's session
//! on every request; refreshed cookies ride back on whatever response goes out, redirects and
//! rejections included. The **gate** ([`gate`]) then applies the tenant boundary, authentication,
//! the onboarding state machine and the admin path rewrite. It must run before route matching, so
//! [`Application`] wraps the whole router with it rather than adding it as a router layer.
//!
//! The **authorization engine** ([`authz`]) resolves `has_permission` over organization- and
//! project-scoped role assignments, and grants roles with `assign_role_to_user`. Both read through
//! the [`db::store::AccessStore`] trait, backed by PostgreSQL or an in-memory store.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use gatekeeper::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = gatekeeper::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     gatekeeper::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod authz;
pub mod config;
pub mod db;
pub mod errors;
pub mod gate;
mod openapi;
pub mod telemetry;
pub mod tenant;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{
    auth::{
        identity::{IdentityProvider, JwtIdentityProvider},
        refresher::SessionRefresher,
        remote::RemoteIdentityProvider,
    },
    config::{DatabaseConfig, IdentityProviderKind},
    db::store::{AccessStore, InMemoryAccessStore, PgAccessStore},
    gate::{Gatekeeper, middleware::gate_middleware},
    openapi::ApiDoc,
};
use axum::{
    Router, ServiceExt,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::Layer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use db::migrator;

/// Application state shared across all request handlers.
///
/// # Fields
///
/// - `store`: RBAC and principal profile store
/// - `gatekeeper`: The request pipeline, shared with the gate middleware
#[derive(Clone, Builder)]
pub struct AppState {
    pub store: Arc<dyn AccessStore>,
    pub gatekeeper: Arc<Gatekeeper>,
}

/// Build the identity collaborator selected by `identity.provider`.
pub fn build_identity_provider(config: &Config) -> anyhow::Result<Arc<dyn IdentityProvider>> {
    match config.identity.provider {
        IdentityProviderKind::Jwt => {
            info!("Using JWT session cookies (cookie: {})", config.identity.jwt.cookie_name);
            Ok(Arc::new(JwtIdentityProvider::new(
                config.secret_key.clone(),
                config.identity.jwt.clone(),
            )))
        }
        IdentityProviderKind::Remote => {
            let provider = RemoteIdentityProvider::new(&config.identity.remote)?;
            info!("Using remote identity provider");
            Ok(Arc::new(provider))
        }
    }
}

/// Connect the configured store, running migrations for PostgreSQL.
async fn setup_store(config: &Config) -> anyhow::Result<(Arc<dyn AccessStore>, Option<PgPool>)> {
    match &config.database {
        DatabaseConfig::External { url, pool } => {
            info!("Using external database");
            let pg = PgPoolOptions::new()
                .max_connections(pool.max_connections)
                .min_connections(pool.min_connections)
                .acquire_timeout(pool.acquire_timeout)
                .idle_timeout(pool.idle_timeout)
                .connect(url)
                .await?;
            migrator().run(&pg).await?;
            Ok((Arc::new(PgAccessStore::new(pg.clone())), Some(pg)))
        }
        DatabaseConfig::Memory => {
            info!("Using in-memory store: role assignments are lost on shutdown");
            Ok((Arc::new(InMemoryAccessStore::with_default_catalogue()), None))
        }
    }
}

/// Build the API router. The result still needs the gate wrapped around it.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/session", get(api::handlers::session::get_session))
        .route("/permissions/check", post(api::handlers::permissions::check_permission))
        .route("/role-assignments", post(api::handlers::role_assignments::create_role_assignment))
        .with_state(state);

    Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/api/docs", ApiDoc::openapi()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Main application struct that owns all resources and manages the lifecycle.
///
/// 1. **Create**: [`Application::new`] connects the store, runs migrations and builds the pipeline
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: When the shutdown signal is received, closes the pool and flushes telemetry
pub struct Application {
    router: Router,
    app_state: AppState,
    config: Config,
    pool: Option<PgPool>,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting gatekeeper with configuration: {:#?}", config);

        let (store, pool) = setup_store(&config).await?;
        let identity = build_identity_provider(&config)?;
        let gatekeeper = Arc::new(Gatekeeper::new(&config, store.clone(), SessionRefresher::new(identity)));

        let app_state = AppState::builder().store(store).gatekeeper(gatekeeper).build();
        let router = build_router(app_state.clone());

        Ok(Self {
            router,
            app_state,
            config,
            pool,
        })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        let middleware = from_fn_with_state(self.app_state.gatekeeper, gate_middleware);
        let service = middleware.layer(self.router).into_make_service();
        axum_test::TestServer::new(service).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Gatekeeper listening on http://{} (admin: {}, app: {})",
            bind_addr, self.config.tenants.admin_host, self.config.tenants.app_host
        );

        // Apply the gate before path matching so rewrites pick the route
        let middleware = from_fn_with_state(self.app_state.gatekeeper, gate_middleware);
        let service = middleware.layer(self.router);

        axum::serve(listener, service.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        if let Some(pool) = self.pool {
            info!("Closing database connections...");
            pool.close().await;
        }

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
