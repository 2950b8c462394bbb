//! OpenAPI documentation for the gatekeeper's JSON API at `/api/v1/*`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::{api, tenant::TenantKind, types::RoleScope};

/// Session cookie security scheme.
struct CookieSecurityAddon;

impl Modify for CookieSecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "CookieAuth".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "gk_session",
                    "Session cookie set by the identity provider. The cookie name is configurable \
                     (`identity.jwt.cookie_name`); sessions are refreshed on every request.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    servers(
        (url = "/api/v1", description = "Gatekeeper API")
    ),
    modifiers(&CookieSecurityAddon),
    paths(
        api::handlers::session::get_session,
        api::handlers::permissions::check_permission,
        api::handlers::role_assignments::create_role_assignment,
    ),
    components(schemas(
        api::models::session::SessionResponse,
        api::models::permissions::PermissionCheckRequest,
        api::models::permissions::PermissionCheckResponse,
        api::models::role_assignments::RoleAssignmentCreate,
        api::models::role_assignments::RoleAssignmentResponse,
        TenantKind,
        RoleScope,
    )),
    tags(
        (name = "session", description = "Session introspection"),
        (name = "permissions", description = "Scoped permission checks"),
        (name = "role-assignments", description = "Granting roles to principals"),
    ),
    info(
        title = "Gatekeeper API",
        description = "Session and role-based access control endpoints served behind the tenant gate.",
    )
)]
pub struct ApiDoc;
