//! Service Layer Error Types
//!
//! This module defines error types for service-layer operations, providing
//! detailed error handling for business logic failures.

use crate::db::DatabaseError;
use crate::models::ValidationError;
use thiserror::Error;

/// Coarse classification used by callers (e.g. HTTP status mapping)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    Conflict,
    Internal,
}

/// Service operation errors
///
/// Provides high-level error types for all service operations,
/// with detailed context and proper error chaining.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Position not found by ID
    #[error("Position not found: {id}")]
    PositionNotFound { id: String },

    /// Parent supplied on create does not exist
    #[error("Parent position does not exist: {parent_id}")]
    ParentNotFound { parent_id: String },

    /// Parent supplied on update does not exist
    #[error("Parent not found: {parent_id}")]
    InvalidParent { parent_id: String },

    /// Re-parent would create a cycle
    #[error("Circular reference detected: {context}")]
    CircularReference { context: String },

    /// Input failed field validation
    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    #[error("User not found: {id}")]
    UserNotFound { id: String },

    #[error("Photo not found: {id}")]
    PhotoNotFound { id: i64 },

    /// Unique email/phone/photo violated
    #[error("A user with this {field} already exists")]
    DuplicateUser { field: String },

    /// Unexpected failure; details are logged, not returned to clients
    #[error("Internal error: {context}")]
    Internal { context: String },

    /// Query execution error
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database operation failed
    #[error("Database operation failed: {0}")]
    DatabaseError(#[from] DatabaseError),
}

impl ServiceError {
    pub fn position_not_found(id: impl Into<String>) -> Self {
        Self::PositionNotFound { id: id.into() }
    }

    pub fn parent_not_found(parent_id: impl Into<String>) -> Self {
        Self::ParentNotFound {
            parent_id: parent_id.into(),
        }
    }

    pub fn invalid_parent(parent_id: impl Into<String>) -> Self {
        Self::InvalidParent {
            parent_id: parent_id.into(),
        }
    }

    pub fn circular_reference(context: impl Into<String>) -> Self {
        Self::CircularReference {
            context: context.into(),
        }
    }

    pub fn user_not_found(id: impl Into<String>) -> Self {
        Self::UserNotFound { id: id.into() }
    }

    pub fn photo_not_found(id: i64) -> Self {
        Self::PhotoNotFound { id }
    }

    pub fn duplicate_user(field: impl Into<String>) -> Self {
        Self::DuplicateUser {
            field: field.into(),
        }
    }

    pub fn internal(context: impl Into<String>) -> Self {
        Self::Internal {
            context: context.into(),
        }
    }

    /// Create a query failed error from a store failure
    ///
    /// Uses the alternate formatter so the whole `anyhow` context chain is kept.
    pub fn query_failed(err: &anyhow::Error) -> Self {
        Self::QueryFailed(format!("{:#}", err))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PositionNotFound { .. }
            | Self::ParentNotFound { .. }
            | Self::UserNotFound { .. }
            | Self::PhotoNotFound { .. } => ErrorKind::NotFound,
            Self::InvalidParent { .. }
            | Self::CircularReference { .. }
            | Self::ValidationFailed(_) => ErrorKind::InvalidInput,
            Self::DuplicateUser { .. } => ErrorKind::Conflict,
            Self::Internal { .. } | Self::QueryFailed(_) | Self::DatabaseError(_) => {
                ErrorKind::Internal
            }
        }
    }
}

/// Convert a store failure into a service error, logging it first
///
/// Unique violations become `DuplicateUser`; everything else is `QueryFailed`.
pub(crate) fn store_error(err: anyhow::Error) -> ServiceError {
    if let Some(DatabaseError::UniqueViolation { column, .. }) = err.downcast_ref::<DatabaseError>()
    {
        let field = match column.as_str() {
            "photo_id" => "photo",
            other => other,
        };
        tracing::warn!("Rejected write: duplicate {}", field);
        return ServiceError::duplicate_user(field);
    }

    tracing::error!("Store operation failed: {:#}", err);
    ServiceError::query_failed(&err)
}
