//! Per-tenant path rewriting.
//!
//! The admin surface is mounted under an internal prefix (`/admin` by default). On the admin
//! hostname, public paths are dispatched onto that prefix without the client seeing it. On the
//! app hostname, anything under the prefix is refused so the admin surface cannot be discovered
//! from the public site.

use std::sync::Arc;

use crate::{
    gate::{
        GateRejection,
        routes::{RouteRules, has_prefix_segment},
    },
    tenant::TenantKind,
};

pub struct PathRewriter {
    admin_prefix: String,
    routes: Arc<RouteRules>,
}

impl PathRewriter {
    pub fn new(admin_prefix: impl Into<String>, routes: Arc<RouteRules>) -> Self {
        let admin_prefix = admin_prefix.into();
        Self {
            admin_prefix: admin_prefix.trim_end_matches('/').to_string(),
            routes,
        }
    }

    pub fn admin_prefix(&self) -> &str {
        &self.admin_prefix
    }

    pub fn carries_admin_prefix(&self, path: &str) -> bool {
        has_prefix_segment(path, &self.admin_prefix)
    }

    /// Admin-prefixed paths are never served on the app hostname, authenticated or not.
    pub fn check_cross_tenant(&self, kind: TenantKind, path: &str) -> Option<GateRejection> {
        (kind == TenantKind::App && self.carries_admin_prefix(path)).then(|| GateRejection::CrossTenantViolation {
            path: path.to_string(),
        })
    }

    /// Internal target for a request, or `None` when it passes through unchanged.
    pub fn rewrite(&self, kind: TenantKind, path: &str, query: Option<&str>) -> Option<String> {
        if kind != TenantKind::Admin || self.carries_admin_prefix(path) || self.routes.is_excluded(path) {
            return None;
        }

        let mut target = if path == "/" || path.is_empty() {
            self.admin_prefix.clone()
        } else {
            format!("{}{}", self.admin_prefix, path)
        };
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            target.push('?');
            target.push_str(query);
        }
        Some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoutesConfig;

    fn rewriter() -> PathRewriter {
        PathRewriter::new("/admin", Arc::new(RouteRules::new(&RoutesConfig::default())))
    }

    #[test]
    fn test_admin_paths_are_rewritten() {
        let r = rewriter();
        assert_eq!(r.rewrite(TenantKind::Admin, "/licenses", None), Some("/admin/licenses".to_string()));
        assert_eq!(r.rewrite(TenantKind::Admin, "/", None), Some("/admin".to_string()));
        assert_eq!(
            r.rewrite(TenantKind::Admin, "/licenses", Some("page=2&sort=name")),
            Some("/admin/licenses?page=2&sort=name".to_string())
        );
        assert_eq!(r.rewrite(TenantKind::Admin, "/administrator", None), Some("/admin/administrator".to_string()));
    }

    #[test]
    fn test_admin_passthrough() {
        let r = rewriter();
        for path in ["/admin", "/admin/licenses", "/login", "/auth/callback", "/api/v1/session", "/static/a.css", "/logo.png"] {
            assert_eq!(r.rewrite(TenantKind::Admin, path, None), None, "{path}");
        }
    }

    #[test]
    fn test_app_and_dev_never_rewrite() {
        let r = rewriter();
        assert_eq!(r.rewrite(TenantKind::App, "/licenses", None), None);
        assert_eq!(r.rewrite(TenantKind::Dev, "/licenses", None), None);
    }

    #[test]
    fn test_cross_tenant() {
        let r = rewriter();
        assert!(r.check_cross_tenant(TenantKind::App, "/admin").is_some());
        assert!(r.check_cross_tenant(TenantKind::App, "/admin/licenses").is_some());
        assert!(r.check_cross_tenant(TenantKind::App, "/administrator").is_none());
        assert!(r.check_cross_tenant(TenantKind::Admin, "/admin/licenses").is_none());
        assert!(r.check_cross_tenant(TenantKind::Dev, "/admin/licenses").is_none());
    }
}
