//! API request and response data models.
//!
//! API models are kept separate from the database models in [`crate::db::models`] and are
//! annotated with `utoipa` for the generated API docs.
//!
//! - [`session`]: the caller's principal and tenant
//! - [`permissions`]: permission check requests and answers
//! - [`role_assignments`]: role grant requests and the created assignment

pub mod permissions;
pub mod role_assignments;
pub mod session;
