//! Well-known paths and path matching shared by the pipeline steps.

use crate::config::RoutesConfig;

/// Whether `path` carries `prefix` as a whole segment: it equals the prefix or continues with a
/// `/` after it. `/administrator` does not carry `/admin`. An empty or root prefix matches nothing.
pub fn has_prefix_segment(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return false;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Drop a trailing `/` unless the path is the root.
pub fn normalize_path(path: &str) -> &str {
    if path.len() > 1 {
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() { "/" } else { trimmed }
    } else {
        path
    }
}

/// Path rules compiled from [`RoutesConfig`].
#[derive(Debug, Clone)]
pub struct RouteRules {
    pub login_path: String,
    pub onboarding_path: String,
    pub home_path: String,
    /// The onboarding page as served under the admin prefix
    admin_onboarding_path: Option<String>,
    auth_callback_prefix: String,
    api_prefix: String,
    public_paths: Vec<String>,
    excluded_prefixes: Vec<String>,
    excluded_paths: Vec<String>,
    excluded_extensions: Vec<String>,
}

impl RouteRules {
    pub fn new(config: &RoutesConfig) -> Self {
        Self {
            login_path: normalize_path(&config.login_path).to_string(),
            onboarding_path: normalize_path(&config.onboarding_path).to_string(),
            home_path: normalize_path(&config.home_path).to_string(),
            admin_onboarding_path: None,
            auth_callback_prefix: config.auth_callback_prefix.clone(),
            api_prefix: config.api_prefix.clone(),
            public_paths: config.public_paths.iter().map(|p| normalize_path(p).to_string()).collect(),
            excluded_prefixes: config.excluded_prefixes.clone(),
            excluded_paths: config.excluded_paths.iter().map(|p| normalize_path(p).to_string()).collect(),
            excluded_extensions: config
                .excluded_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Also treat `<admin_prefix><onboarding_path>` as the onboarding page.
    pub fn with_admin_prefix(mut self, admin_prefix: &str) -> Self {
        let admin_prefix = admin_prefix.trim_end_matches('/');
        if !admin_prefix.is_empty() {
            self.admin_onboarding_path = Some(format!("{admin_prefix}{}", self.onboarding_path));
        }
        self
    }

    pub fn is_login(&self, path: &str) -> bool {
        normalize_path(path) == self.login_path
    }

    pub fn is_onboarding(&self, path: &str) -> bool {
        let normalized = normalize_path(path);
        normalized == self.onboarding_path || self.admin_onboarding_path.as_deref() == Some(normalized)
    }

    /// Paths that are never rewritten: login, auth callbacks, the JSON API, the configured exact
    /// paths and every [asset](Self::is_asset).
    pub fn is_excluded(&self, path: &str) -> bool {
        if self.is_login(path)
            || has_prefix_segment(path, &self.auth_callback_prefix)
            || has_prefix_segment(path, &self.api_prefix)
        {
            return true;
        }

        let normalized = normalize_path(path);
        self.excluded_paths.iter().any(|p| p == normalized) || self.is_asset(path)
    }

    /// Static asset prefixes and image files. These are the only paths that skip the onboarding
    /// gate.
    pub fn is_asset(&self, path: &str) -> bool {
        if self.excluded_prefixes.iter().any(|prefix| has_prefix_segment(path, prefix)) {
            return true;
        }

        let last_segment = path.rsplit('/').next().unwrap_or_default();
        match last_segment.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => {
                let ext = ext.to_ascii_lowercase();
                self.excluded_extensions.iter().any(|e| *e == ext)
            }
            _ => false,
        }
    }

    /// Paths reachable without a session.
    pub fn is_public(&self, path: &str) -> bool {
        if self.is_excluded(path) {
            return true;
        }
        let normalized = normalize_path(path);
        self.public_paths.iter().any(|p| p == normalized)
    }
}
