//! Edge request gatekeeper.
//!
//! Every request passes through one pipeline that produces exactly one [`RoutingDecision`]:
//!
//! 1. **Tenant resolution** - classify the hostname ([`crate::tenant::TenantResolver`]). An
//!    unknown host in production is rejected before anything else runs.
//! 2. **Session refresh** - resolve the principal through the identity collaborator
//!    ([`crate::auth::refresher::SessionRefresher`]). Always runs, so refreshed cookies reach the
//!    client whatever the decision.
//! 3. **Cross-tenant check** - admin-prefixed paths on the app hostname are rejected, whether or
//!    not the caller is authenticated.
//! 4. **Authentication** - anonymous callers on non-public paths are sent to the login page.
//! 5. **Onboarding** - see [`onboarding::OnboardingGate`].
//! 6. **Rewrite** - see [`rewrite::PathRewriter`].
//!
//! A redirect from steps 4 or 5 short-circuits rewriting. The [`middleware`] module applies the
//! resulting [`GateOutcome`] to live axum requests.

use std::fmt;
use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode, Uri};
use tracing::{debug, instrument, warn};

use crate::{
    auth::{identity::Credentials, refresher::SessionRefresher},
    config::Config,
    db::store::AccessStore,
    tenant::{TenantContext, TenantResolver, request_host},
    types::PrincipalId,
};

pub mod middleware;
pub mod onboarding;
pub mod rewrite;
pub mod routes;

use onboarding::OnboardingGate;
use rewrite::PathRewriter;
use routes::RouteRules;

/// What the edge does with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    /// Serve the request as-is
    Passthrough,
    /// Client-visible temporary redirect to this path
    Redirect(String),
    /// Serve this internal path (and query) while keeping the visible URL
    Rewrite(String),
    /// Refuse with this status
    Reject(StatusCode),
}

impl fmt::Display for RoutingDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingDecision::Passthrough => write!(f, "passthrough"),
            RoutingDecision::Redirect(path) => write!(f, "redirect {path}"),
            RoutingDecision::Rewrite(path) => write!(f, "rewrite {path}"),
            RoutingDecision::Reject(status) => write!(f, "reject {}", status.as_u16()),
        }
    }
}

/// Routing-layer outcomes that stop a request from being served as asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateRejection {
    UnknownTenant { host: Option<String> },
    CrossTenantViolation { path: String },
    Unauthenticated { login_path: String },
    OnboardingRequired { onboarding_path: String },
    OnboardingAlreadyDone { home_path: String },
}

impl GateRejection {
    pub fn decision(&self) -> RoutingDecision {
        match self {
            GateRejection::UnknownTenant { .. } | GateRejection::CrossTenantViolation { .. } => {
                RoutingDecision::Reject(StatusCode::FORBIDDEN)
            }
            GateRejection::Unauthenticated { login_path } => RoutingDecision::Redirect(login_path.clone()),
            GateRejection::OnboardingRequired { onboarding_path } => RoutingDecision::Redirect(onboarding_path.clone()),
            GateRejection::OnboardingAlreadyDone { home_path } => RoutingDecision::Redirect(home_path.clone()),
        }
    }
}

/// The parts of an inbound request the pipeline looks at.
#[derive(Debug, Clone)]
pub struct GateRequest {
    pub host: Option<String>,
    pub path: String,
    pub query: Option<String>,
    pub credentials: Credentials,
}

impl GateRequest {
    pub fn from_parts(headers: &HeaderMap, uri: &Uri) -> Self {
        Self {
            host: request_host(headers, uri),
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            credentials: Credentials::from_headers(headers),
        }
    }
}

/// Result of running the pipeline for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOutcome {
    pub decision: RoutingDecision,
    /// `Set-Cookie` values from the session refresh, to be written on whatever response is sent
    pub set_cookies: Vec<String>,
    pub principal: Option<PrincipalId>,
    /// `None` only when the hostname was rejected
    pub tenant: Option<TenantContext>,
}

/// The composed request pipeline. Immutable after construction.
pub struct Gatekeeper {
    resolver: TenantResolver,
    refresher: SessionRefresher,
    onboarding: OnboardingGate,
    rewriter: PathRewriter,
    routes: Arc<RouteRules>,
}

impl Gatekeeper {
    pub fn new(config: &Config, store: Arc<dyn AccessStore>, refresher: SessionRefresher) -> Self {
        let routes = Arc::new(RouteRules::new(&config.routes).with_admin_prefix(&config.tenants.admin_prefix));
        Self {
            resolver: TenantResolver::new(&config.tenants),
            refresher,
            onboarding: OnboardingGate::new(store, routes.clone()),
            rewriter: PathRewriter::new(config.tenants.admin_prefix.clone(), routes.clone()),
            routes,
        }
    }

    pub fn routes(&self) -> &RouteRules {
        &self.routes
    }

    #[instrument(skip_all, fields(host = ?request.host, path = %request.path, decision = tracing::field::Empty))]
    pub async fn decide(&self, request: &GateRequest) -> GateOutcome {
        let tenant = match self.resolver.classify(request.host.as_deref()) {
            Ok(tenant) => tenant,
            Err(_) => {
                let rejection = GateRejection::UnknownTenant {
                    host: request.host.clone(),
                };
                warn!(?rejection, "Rejecting request for unknown tenant host");
                return self.finish(rejection.decision(), Vec::new(), None, None);
            }
        };

        let session = self.refresher.refresh(&request.credentials).await;
        let path = request.path.as_str();

        if let Some(rejection) = self.rewriter.check_cross_tenant(tenant.kind, path) {
            warn!(?rejection, "Rejecting admin path on the app hostname");
            return self.finish(rejection.decision(), session.set_cookies, session.principal_id, Some(tenant));
        }

        let Some(principal_id) = session.principal_id else {
            if self.routes.is_public(path) {
                let decision = self.rewrite_decision(&tenant, request);
                return self.finish(decision, session.set_cookies, None, Some(tenant));
            }
            let rejection = GateRejection::Unauthenticated {
                login_path: self.routes.login_path.clone(),
            };
            debug!(?rejection, "Anonymous request on a protected path");
            return self.finish(rejection.decision(), session.set_cookies, None, Some(tenant));
        };

        if !self.routes.is_asset(path)
            && let Some(rejection) = self.onboarding.check(principal_id, path).await
        {
            debug!(?rejection, "Onboarding state mismatch");
            return self.finish(rejection.decision(), session.set_cookies, Some(principal_id), Some(tenant));
        }

        let decision = self.rewrite_decision(&tenant, request);
        self.finish(decision, session.set_cookies, Some(principal_id), Some(tenant))
    }

    fn rewrite_decision(&self, tenant: &TenantContext, request: &GateRequest) -> RoutingDecision {
        match self.rewriter.rewrite(tenant.kind, &request.path, request.query.as_deref()) {
            Some(target) => RoutingDecision::Rewrite(target),
            None => RoutingDecision::Passthrough,
        }
    }

    fn finish(
        &self,
        decision: RoutingDecision,
        set_cookies: Vec<String>,
        principal: Option<PrincipalId>,
        tenant: Option<TenantContext>,
    ) -> GateOutcome {
        tracing::Span::current().record("decision", tracing::field::display(&decision));
        GateOutcome {
            decision,
            set_cookies,
            principal,
            tenant,
        }
    }
}
