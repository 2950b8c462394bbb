use crate::db::errors::DbError;
use crate::types::{ProjectId, RoleScope};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Hostname matched neither configured tenant while running in production
    #[error("Unknown tenant host {host:?}")]
    UnknownTenant { host: Option<String> },

    /// Authentication required but not provided
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Principal lacks the permission for the operation
    #[error("Insufficient permissions to {action}")]
    InsufficientPermissions { action: String, scope: Option<ProjectId> },

    /// No role with this (name, scope) key exists
    #[error("Role {name} ({scope}) not found")]
    RoleNotFound { name: String, scope: RoleScope },

    /// Scope id does not fit the role's scope
    #[error("Invalid scope: {message}")]
    InvalidScope { message: String },

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Store operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::UnknownTenant { .. } => StatusCode::FORBIDDEN,
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::InsufficientPermissions { .. } => StatusCode::FORBIDDEN,
            Error::RoleNotFound { .. } => StatusCode::NOT_FOUND,
            Error::InvalidScope { .. } | Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            // Tenant errors say nothing about which surfaces exist.
            Error::UnknownTenant { .. } => "Forbidden".to_string(),
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::InsufficientPermissions { action, .. } => format!("Insufficient permissions to {action}"),
            Error::RoleNotFound { name, scope } => format!("Role {name} ({scope}) not found"),
            Error::InvalidScope { message } => format!("Invalid scope: {message}"),
            Error::BadRequest { message } => message.clone(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { .. } => "Resource already exists".to_string(),
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::UnknownTenant { .. } => {
                tracing::warn!("Tenant violation: {}", self);
            }
            Error::Unauthenticated { .. } | Error::InsufficientPermissions { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::RoleNotFound { .. } | Error::InvalidScope { .. } | Error::BadRequest { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        (status, self.user_message()).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_errors_are_forbidden_and_opaque() {
        let err = Error::UnknownTenant {
            host: Some("evil.example.net".to_string()),
        };
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert!(!err.user_message().contains("evil"));
    }

    #[test]
    fn test_role_not_found_status() {
        let err = Error::RoleNotFound {
            name: "NoSuchRole".to_string(),
            scope: RoleScope::Project,
        };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.user_message(), "Role NoSuchRole (project) not found");
    }

    #[test]
    fn test_database_errors_hide_details() {
        let err = Error::Database(DbError::Other(anyhow::anyhow!("connection refused to 10.0.0.5")));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.user_message(), "Database error occurred");
    }
}
