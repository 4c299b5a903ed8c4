/// Business operations over a [`WorkStore`](crate::store::WorkStore).
///
/// - [`projects::ProjectService`]: project lifecycle, membership, ownership, activity
/// - [`tasks::TaskService`]: task CRUD and assignment inside a project's permission boundary
/// - [`session::SessionService`]: registration, login and token refresh
///
/// Every service holds an `Arc<dyn WorkStore>` and returns [`ServiceError`].
/// Nothing here retries: a store failure surfaces immediately as `Internal`.

use thiserror::Error;
use validator::ValidationErrors;

use crate::auth::authorization::AuthzError;
use crate::auth::jwt::JwtError;
use crate::auth::password::PasswordError;
use crate::models::membership::InvalidRole;
use crate::store::StoreError;

pub mod projects;
pub mod session;
pub mod tasks;

/// Errors returned by every service operation
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Entity absent
    #[error("{0} not found")]
    NotFound(String),

    /// Bad credentials or invalid/expired token
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but the role is insufficient
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Malformed input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Role string outside the closed enumeration
    #[error("invalid role: {0}")]
    InvalidRole(String),

    /// Ownership transfer target is not a project member
    #[error("new owner must be a member of the project")]
    InvalidOwner,

    /// Uniqueness violation, e.g. a duplicate email or membership
    #[error("conflict: {0}")]
    Conflict(String),

    /// Store or crypto failure; details are for logs only
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience alias for service results
pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ServiceError::NotFound(what),
            StoreError::Conflict(what) => ServiceError::Conflict(what),
            StoreError::Backend(msg) => ServiceError::Internal(msg),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotMember(_) | AuthzError::InsufficientRole { .. } => {
                ServiceError::Forbidden("insufficient permission".to_string())
            }
            AuthzError::Store(e) => ServiceError::Internal(e.to_string()),
        }
    }
}

impl From<InvalidRole> for ServiceError {
    fn from(err: InvalidRole) -> Self {
        ServiceError::InvalidRole(err.0)
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<JwtError> for ServiceError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ServiceError::Internal(msg),
            JwtError::Expired => ServiceError::Unauthorized("token expired".to_string()),
            JwtError::ValidationError(_) => ServiceError::Unauthorized("invalid token".to_string()),
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .iter()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "is invalid".to_string());
                format!("{field}: {message}")
            })
            .collect();
        fields.sort();
        ServiceError::InvalidInput(fields.join("; "))
    }
}
