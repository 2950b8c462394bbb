//! Persistence layer for the gatekeeper.
//!
//! The gatekeeper reads principal profiles, organizations and the RBAC tables, and the role
//! assignment service inserts role assignments. Everything else about the schema belongs to
//! the surrounding application.
//!
//! ```text
//! ┌──────────────────────┐
//! │ gate / authz / api   │
//! └──────────┬───────────┘
//!            │  Arc<dyn AccessStore>
//!            ↓
//! ┌──────────────────────┐
//! │ store (pg | memory)  │  (db::store)
//! └──────────┬───────────┘
//!            ↓
//! ┌──────────────────────┐
//! │ models               │  (db::models - table rows)
//! └──────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`store`]: the [`store::AccessStore`] trait and its PostgreSQL / in-memory implementations
//! - [`models`]: row structures matching table schemas
//! - [`errors`]: store error types

pub mod errors;
pub mod models;
pub mod store;

/// Get the gatekeeper database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}
