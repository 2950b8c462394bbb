//! API response models for session introspection.

use crate::tenant::TenantKind;
use crate::types::PrincipalId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The caller as the gatekeeper sees it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    /// Authenticated principal
    #[schema(value_type = String, format = "uuid")]
    pub principal_id: PrincipalId,
    /// Surface the request was addressed to
    pub tenant: TenantKind,
    /// Normalized request hostname
    #[schema(example = "admin.example.com")]
    pub hostname: String,
}
