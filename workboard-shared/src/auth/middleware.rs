/// Request authentication context for Axum
///
/// The API's authentication layer validates the `Authorization: Bearer`
/// header with [`extract_bearer`] and the session service, then inserts an
/// [`AuthContext`] into the request extensions. Handlers read it with
/// `Extension<AuthContext>`.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use workboard_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("User: {}", auth.user_id)
/// }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated caller of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID, from the access token's `sub` claim
    pub user_id: Uuid,
}

impl AuthContext {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// Error type for the authentication layer
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    InvalidFormat(String),

    /// Token rejected by validation
    InvalidToken(String),
}

/// Pulls the token out of an `Authorization: Bearer <token>` header
///
/// # Errors
///
/// `MissingCredentials` if the header is absent or not valid UTF-8,
/// `InvalidFormat` if it is not a non-empty Bearer credential.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    if token.is_empty() {
        return Err(AuthError::InvalidFormat("Empty Bearer token".to_string()));
    }

    Ok(token)
}
