/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login and token refresh
/// - `projects`: Project lifecycle, membership and activity
/// - `tasks`: Task CRUD and assignment

pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;

use crate::error::{ApiError, ApiResult};
use uuid::Uuid;

/// Parses a path segment as a UUID
///
/// Path ids are taken as strings so a malformed id becomes a JSON 400
/// rather than the extractor's plain-text rejection.
pub(crate) fn parse_id(raw: &str, name: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("invalid {name}: {raw}")))
}
