//! Onboarding state machine.
//!
//! An elevated principal starts in [`OnboardingState::NeedsOnboarding`] and moves to
//! [`OnboardingState::Active`] once its organization's setup flag flips. The flag is only ever
//! set by the setup flow, so the transition never goes back.

use std::sync::Arc;

use tracing::{instrument, trace, warn};

use crate::{
    db::{
        models::{organizations::OrganizationDBResponse, principals::PrincipalDBResponse},
        store::AccessStore,
    },
    gate::{GateRejection, routes::RouteRules},
    types::{PrincipalId, PrincipalTier, abbrev_uuid},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingState {
    NeedsOnboarding,
    Active,
}

impl OnboardingState {
    /// Elevated principals need onboarding until their organization exists and has finished setup.
    pub fn derive(principal: &PrincipalDBResponse, organization: Option<&OrganizationDBResponse>) -> Self {
        match (principal.tier, organization) {
            (PrincipalTier::Elevated, Some(org)) if org.setup_completed => OnboardingState::Active,
            (PrincipalTier::Elevated, _) => OnboardingState::NeedsOnboarding,
            (PrincipalTier::Standard, _) => OnboardingState::Active,
        }
    }
}

pub struct OnboardingGate {
    store: Arc<dyn AccessStore>,
    routes: Arc<RouteRules>,
}

impl OnboardingGate {
    pub fn new(store: Arc<dyn AccessStore>, routes: Arc<RouteRules>) -> Self {
        Self { store, routes }
    }

    /// Load the principal's onboarding state. `None` when the profile cannot be loaded.
    #[instrument(skip(self), fields(principal_id = %abbrev_uuid(&principal_id)))]
    pub async fn state_for(&self, principal_id: PrincipalId) -> Option<OnboardingState> {
        let principal = match self.store.get_principal(principal_id).await {
            Ok(Some(principal)) => principal,
            Ok(None) => {
                warn!("Principal profile not found, skipping onboarding gate");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to load principal profile, skipping onboarding gate");
                return None;
            }
        };

        let organization = match principal.organization_id {
            Some(org_id) => match self.store.get_organization(org_id).await {
                Ok(organization) => organization,
                Err(e) => {
                    warn!(error = %e, "Failed to load organization, skipping onboarding gate");
                    return None;
                }
            },
            None => None,
        };

        let state = OnboardingState::derive(&principal, organization.as_ref());
        trace!(?state, "Derived onboarding state");
        Some(state)
    }

    /// Routing rule for a principal in `state` requesting `path`.
    pub fn route(&self, state: OnboardingState, path: &str) -> Option<GateRejection> {
        match state {
            OnboardingState::NeedsOnboarding if !self.routes.is_onboarding(path) => Some(GateRejection::OnboardingRequired {
                onboarding_path: self.routes.onboarding_path.clone(),
            }),
            OnboardingState::Active if self.routes.is_onboarding(path) => Some(GateRejection::OnboardingAlreadyDone {
                home_path: self.routes.home_path.clone(),
            }),
            _ => None,
        }
    }

    /// Load the state and apply the routing rule. Never interferes when the profile is unavailable.
    pub async fn check(&self, principal_id: PrincipalId, path: &str) -> Option<GateRejection> {
        let state = self.state_for(principal_id).await?;
        self.route(state, path)
    }
}
