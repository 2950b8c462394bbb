//! HTTP request handlers for the JSON API.
//!
//! All handlers sit behind the gate middleware and take the caller from
//! [`crate::auth::current_user::CurrentPrincipal`]. The API prefix is public to the gate, so an
//! anonymous caller gets `401` from the handler rather than a login redirect.
//!
//! - [`session`]: session introspection
//! - [`permissions`]: permission checks for the caller
//! - [`role_assignments`]: granting roles

pub mod permissions;
pub mod role_assignments;
pub mod session;
