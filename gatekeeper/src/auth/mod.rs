//! Session handling.
//!
//! The gatekeeper does not own identity. Sessions belong to an external collaborator reached
//! through the [`identity::IdentityProvider`] trait; this module provides that trait, its two
//! implementations, and the pipeline step that calls it.
//!
//! # Modules
//!
//! - [`identity`]: provider trait, credentials, and the JWT cookie provider
//! - [`remote`]: provider that delegates to an external session service over HTTP
//! - [`session`]: JWT claims, signing/verification and session cookie formatting
//! - [`refresher`]: the Session Refresher step, which degrades provider failures to anonymous
//! - [`current_user`]: extractor for the principal the gate attached to a request
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use gatekeeper::auth::current_user::CurrentPrincipal;
//!
//! async fn protected_handler(principal: CurrentPrincipal) -> String {
//!     format!("Hello, {}!", principal.id)
//! }
//! ```

pub mod current_user;
pub mod identity;
pub mod refresher;
pub mod remote;
pub mod session;
