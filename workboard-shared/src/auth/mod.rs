/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and length checks
/// - [`jwt`]: HS256 access/refresh token issuance and validation
/// - [`middleware`]: request `AuthContext` and Bearer header parsing
/// - [`authorization`]: project role checks against the store

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
