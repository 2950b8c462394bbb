//! Axum middleware applying the gatekeeper to live requests.
//!
//! Must wrap the router from the outside (`from_fn_with_state(..).layer(router)`), not be added
//! with `Router::layer`: rewrites replace the request URI, and that only changes which route is
//! served if it happens before route matching.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{OriginalUri, Request, State},
    http::{HeaderMap, HeaderValue, Uri, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{error, trace};

use crate::{
    auth::current_user::CurrentPrincipal,
    errors::Error,
    gate::{GateRequest, Gatekeeper, RoutingDecision},
};

/// Run the pipeline and apply its decision.
///
/// Rewrites are dispatched internally with the visible URL kept in [`OriginalUri`]. Redirects
/// answer `307`, rejections answer the status with a plain-text body. Refreshed session cookies
/// are appended to whichever response goes out.
pub async fn gate_middleware(State(gatekeeper): State<Arc<Gatekeeper>>, mut request: Request, next: Next) -> Response {
    let gate_request = GateRequest::from_parts(request.headers(), request.uri());
    let outcome = gatekeeper.decide(&gate_request).await;

    let cookies = match validate_cookies(&outcome.set_cookies) {
        Ok(cookies) => cookies,
        Err(e) => {
            error!(error = %e, "Dropping refreshed session cookies");
            Vec::new()
        }
    };

    if let Some(tenant) = outcome.tenant.clone() {
        if let Some(id) = outcome.principal {
            request.extensions_mut().insert(CurrentPrincipal {
                id,
                tenant: tenant.clone(),
            });
        }
        request.extensions_mut().insert(tenant);
    }

    let mut response = match outcome.decision {
        RoutingDecision::Passthrough => next.run(request).await,
        RoutingDecision::Rewrite(target) => match rewrite_uri(request.uri(), &target) {
            Ok(uri) => {
                trace!(from = %request.uri(), to = %uri, "Rewriting request");
                let original = request.uri().clone();
                request.extensions_mut().insert(OriginalUri(original));
                *request.uri_mut() = uri;
                next.run(request).await
            }
            Err(e) => Error::Other(e).into_response(),
        },
        RoutingDecision::Redirect(location) => Redirect::temporary(&location).into_response(),
        RoutingDecision::Reject(status) => (status, status.canonical_reason().unwrap_or("Rejected")).into_response(),
    };

    append_cookies(response.headers_mut(), cookies);
    response
}

/// Parse every cookie value up front so they are either all appended or none are.
pub(crate) fn validate_cookies(set_cookies: &[String]) -> anyhow::Result<Vec<HeaderValue>> {
    set_cookies
        .iter()
        .map(|cookie| HeaderValue::from_str(cookie).with_context(|| "Invalid Set-Cookie value from identity provider"))
        .collect()
}

fn append_cookies(headers: &mut HeaderMap, cookies: Vec<HeaderValue>) {
    for cookie in cookies {
        headers.append(header::SET_COOKIE, cookie);
    }
}

/// Replace the path and query of `uri` with `target` (a path with optional query).
fn rewrite_uri(uri: &Uri, target: &str) -> anyhow::Result<Uri> {
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(
        target
            .parse()
            .with_context(|| format!("Failed to parse rewritten path: {target}"))?,
    );
    Uri::from_parts(parts).with_context(|| "Failed to construct URI from parts")
}
