//! Session refresh step of the request pipeline.

use std::sync::Arc;

use tracing::{instrument, warn};

use crate::auth::identity::{Credentials, IdentityProvider, RefreshedSession};

/// Resolves the caller's principal through the identity collaborator.
///
/// Never fails: any provider error degrades the request to anonymous, with no outgoing cookies.
#[derive(Clone)]
pub struct SessionRefresher {
    provider: Arc<dyn IdentityProvider>,
}

impl SessionRefresher {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    #[instrument(skip_all)]
    pub async fn refresh(&self, credentials: &Credentials) -> RefreshedSession {
        match self.provider.refresh_session(credentials).await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Identity provider unavailable, treating request as anonymous");
                RefreshedSession::anonymous()
            }
        }
    }
}
