//! Scoped role-based authorization.
//!
//! Principals hold roles through role assignments. A role is either organization-scoped (it
//! applies everywhere in the organization) or project-scoped (it applies to the one project named
//! by the assignment). Roles grant actions, plain strings such as `okr.write`.
//!
//! - [`engine`]: `has_permission`, the single yes/no question application code asks
//! - [`assignment`]: `assign_role_to_user`, used by resource creation and invitation flows
//!
//! There is no explicit deny. Revoking access means deleting the assignment.

pub mod assignment;
pub mod engine;

pub use assignment::{assign_role_to_user, grant_role_best_effort};
pub use engine::{RoleGrant, ScopedGrant, has_permission, require_permission};
