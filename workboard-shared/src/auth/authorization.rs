/// Project-scoped authorization checks
///
/// A caller's permission on a project is derived solely from their
/// membership row on that project:
///
/// | Role   | view | modify | transfer ownership |
/// |--------|------|--------|--------------------|
/// | admin  | yes  | yes    | yes                |
/// | editor | yes  | yes    | no                 |
/// | viewer | yes  | no     | no                 |
/// | none   | creator only | no | no              |
///
/// The boolean checks treat "no membership" as "no permission". They only
/// fail when the store itself fails, and that failure is never turned into
/// a denial.
///
/// # Example
///
/// ```no_run
/// use workboard_shared::auth::authorization::{require_admin, require_modify};
/// use workboard_shared::store::WorkStore;
/// use uuid::Uuid;
///
/// async fn check(store: &dyn WorkStore, user_id: Uuid, project_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
///     // Editors and admins
///     require_modify(store, user_id, project_id).await?;
///
///     // Admins only
///     require_admin(store, user_id, project_id).await?;
///     Ok(())
/// }
/// ```

use uuid::Uuid;

use crate::models::membership::ProjectRole;
use crate::store::{StoreError, WorkStore};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// User holds no membership on the project
    #[error("Not a member of project {0}")]
    NotMember(Uuid),

    /// User's role is too weak for the operation
    #[error("Insufficient permissions: requires {required:?}, has {actual:?}")]
    InsufficientRole {
        required: ProjectRole,
        actual: ProjectRole,
    },

    /// Membership lookup failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Gets the user's role on a project, None if they are not a member
///
/// # Errors
///
/// Returns `AuthzError::Store` if the lookup fails
pub async fn role_of(
    store: &dyn WorkStore,
    user_id: Uuid,
    project_id: Uuid,
) -> Result<Option<ProjectRole>, AuthzError> {
    let membership = store.find_membership(project_id, user_id).await?;
    Ok(membership.map(|m| m.role))
}

/// True iff the user is an admin or editor of the project
///
/// Returns `Ok(false)` for viewers and for non-members.
pub async fn can_modify(
    store: &dyn WorkStore,
    user_id: Uuid,
    project_id: Uuid,
) -> Result<bool, AuthzError> {
    Ok(role_of(store, user_id, project_id)
        .await?
        .is_some_and(|role| role.can_modify()))
}

/// True iff the user is an admin of the project
pub async fn is_admin(
    store: &dyn WorkStore,
    user_id: Uuid,
    project_id: Uuid,
) -> Result<bool, AuthzError> {
    Ok(role_of(store, user_id, project_id)
        .await?
        .is_some_and(|role| role.is_admin()))
}

/// True iff the user created the project or holds any role on it
///
/// `creator_id` is passed in because callers have already loaded the project.
pub async fn can_view(
    store: &dyn WorkStore,
    user_id: Uuid,
    project_id: Uuid,
    creator_id: Uuid,
) -> Result<bool, AuthzError> {
    if user_id == creator_id {
        return Ok(true);
    }
    Ok(role_of(store, user_id, project_id).await?.is_some())
}

async fn require_role(
    store: &dyn WorkStore,
    user_id: Uuid,
    project_id: Uuid,
    required: ProjectRole,
) -> Result<ProjectRole, AuthzError> {
    let actual = role_of(store, user_id, project_id)
        .await?
        .ok_or(AuthzError::NotMember(project_id))?;

    if !actual.has_permission(&required) {
        return Err(AuthzError::InsufficientRole { required, actual });
    }

    Ok(actual)
}

/// Requires admin or editor
///
/// # Errors
///
/// `NotMember` or `InsufficientRole` when denied, `Store` if the lookup fails
pub async fn require_modify(
    store: &dyn WorkStore,
    user_id: Uuid,
    project_id: Uuid,
) -> Result<ProjectRole, AuthzError> {
    require_role(store, user_id, project_id, ProjectRole::Editor).await
}

/// Requires admin
pub async fn require_admin(
    store: &dyn WorkStore,
    user_id: Uuid,
    project_id: Uuid,
) -> Result<ProjectRole, AuthzError> {
    require_role(store, user_id, project_id, ProjectRole::Admin).await
}

/// Requires the creator or any membership
pub async fn require_view(
    store: &dyn WorkStore,
    user_id: Uuid,
    project_id: Uuid,
    creator_id: Uuid,
) -> Result<(), AuthzError> {
    if can_view(store, user_id, project_id, creator_id).await? {
        Ok(())
    } else {
        Err(AuthzError::NotMember(project_id))
    }
}
