//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # API Structure
//!
//! - **Session** (`/api/v1/session`): who the gatekeeper thinks the caller is
//! - **Permissions** (`/api/v1/permissions/check`): `has_permission` for the caller
//! - **Role assignments** (`/api/v1/role-assignments`): `assign_role_to_user`, guarded by
//!   `members.manage`
//!
//! API documentation is served at `/api/docs`.

pub mod handlers;
pub mod models;
