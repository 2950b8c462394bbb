//! Database record models matching table schemas.
//!
//! These structs correspond to rows of the tables the gatekeeper reads and writes. Repository
//! implementations in [`crate::db::store`] return them; the authorization engine and the
//! pipeline convert them into their own types.
//!
//! - [`principals`]: principal profiles (tier, onboarding flag, organization)
//! - [`organizations`]: organizations and their projects
//! - [`roles`]: the role catalogue and the distinguished owner role
//! - [`role_assignments`]: grants of roles to principals, and the joined grant view

pub mod organizations;
pub mod principals;
pub mod role_assignments;
pub mod roles;
