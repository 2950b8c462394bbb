//! Hostname classification.
//!
//! Every inbound request is classified into exactly one [`TenantKind`] from its hostname before
//! anything else happens. The admin surface and the public app share one process; only the
//! hostname tells them apart. Loopback names (and any extra `dev_hosts`) classify as
//! [`TenantKind::Dev`], where nothing is rewritten and both surfaces are reachable by explicit
//! path.
//!
//! In production an unrecognised hostname is rejected outright ([`Error::UnknownTenant`]).
//! Outside production it falls back to dev so preview deployments and tunnels work without
//! extra configuration.

use axum::http::{HeaderMap, Uri, header};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::config::TenantsConfig;
use crate::errors::Error;

/// Which surface a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TenantKind {
    Admin,
    App,
    Dev,
}

impl fmt::Display for TenantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TenantKind::Admin => write!(f, "admin"),
            TenantKind::App => write!(f, "app"),
            TenantKind::Dev => write!(f, "dev"),
        }
    }
}

/// The classification derived for one request. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    pub kind: TenantKind,
    /// Normalized hostname (lowercase, port stripped)
    pub hostname: String,
}

/// Stateless hostname classifier, built once at startup.
#[derive(Debug, Clone)]
pub struct TenantResolver {
    admin_host: String,
    app_host: String,
    dev_hosts: Vec<String>,
    production: bool,
}

impl TenantResolver {
    pub fn new(config: &TenantsConfig) -> Self {
        Self {
            admin_host: normalize_host(&config.admin_host).unwrap_or_default(),
            app_host: normalize_host(&config.app_host).unwrap_or_default(),
            dev_hosts: config.dev_hosts.iter().filter_map(|h| normalize_host(h)).collect(),
            production: config.production,
        }
    }

    /// Classify a raw hostname (as found in the `Host` header, port allowed).
    pub fn classify(&self, raw_host: Option<&str>) -> Result<TenantContext, Error> {
        let hostname = raw_host.and_then(normalize_host);

        let kind = match hostname.as_deref() {
            Some(host) if !self.admin_host.is_empty() && host == self.admin_host => Some(TenantKind::Admin),
            Some(host) if !self.app_host.is_empty() && host == self.app_host => Some(TenantKind::App),
            Some(host) if is_loopback(host) || self.dev_hosts.iter().any(|d| d == host) => Some(TenantKind::Dev),
            _ if !self.production => Some(TenantKind::Dev),
            _ => None,
        };

        match kind {
            Some(kind) => Ok(TenantContext {
                kind,
                hostname: hostname.unwrap_or_default(),
            }),
            None => Err(Error::UnknownTenant { host: hostname }),
        }
    }
}

/// Raw hostname of a request: the `Host` header, falling back to the URI authority.
pub fn request_host(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| uri.authority().map(|authority| authority.as_str().to_string()))
}

fn is_loopback(host: &str) -> bool {
    host == "localhost" || host.ends_with(".localhost") || host == "127.0.0.1" || host == "::1"
}

/// Lowercase a hostname and strip any `:port` suffix. Bracketed IPv6 literals lose their
/// brackets. Returns `None` for an empty or malformed host.
fn normalize_host(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let host = if let Some(rest) = raw.strip_prefix('[') {
        // [::1]:8080 or [::1]
        let (inner, tail) = rest.split_once(']')?;
        if !(tail.is_empty() || tail.starts_with(':')) {
            return None;
        }
        inner
    } else if raw.matches(':').count() > 1 {
        // Unbracketed IPv6 literal, there is no port to strip
        raw
    } else {
        raw.split(':').next().unwrap_or(raw)
    };

    let host = host.trim_end_matches('.');
    if host.is_empty() || host.contains(char::is_whitespace) || host.contains('/') {
        return None;
    }
    Some(host.to_ascii_lowercase())
}
