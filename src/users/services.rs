use tracing::info;
use uuid::Uuid;

use crate::{
    auth::{
        extractors::AuthUser,
        guard::{require_admin, require_self},
        password::hash_password_blocking,
        validation::{
            is_valid_email, is_valid_mobile, is_valid_password, is_valid_username,
            SignupRejection,
        },
    },
    error::AppError,
    users::{
        dto::UpdateUserRequest,
        repo::UserStore,
        repo_types::{User, UserChanges},
    },
};

/// Apply a self-service profile update.
///
/// The ownership check runs before the payload is looked at.
pub async fn update_user(
    users: &dyn UserStore,
    caller: &AuthUser,
    id: Uuid,
    req: UpdateUserRequest,
) -> Result<User, AppError> {
    require_self(caller, id)?;

    let mut changes = UserChanges {
        username: req.username,
        first_name: req.first_name,
        last_name: req.last_name,
        email: req.email,
        mobile: req.mobile,
        password_hash: None,
        profile_picture: req.profile_picture,
    };
    check_changes(&changes, req.password.as_deref())?;

    if let Some(password) = req.password {
        changes.password_hash = Some(hash_password_blocking(password).await?);
    }
    if changes.is_empty() {
        return users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found!".into()));
    }

    let user = users.update(id, changes).await?;
    info!(user_id = %user.id, "user updated");
    Ok(user)
}

fn check_changes(changes: &UserChanges, password: Option<&str>) -> Result<(), AppError> {
    let blank = |v: &Option<String>| v.as_deref().is_some_and(|s| s.trim().is_empty());
    if blank(&changes.first_name) || blank(&changes.last_name) || blank(&changes.profile_picture) {
        return Err(AppError::Validation("Fields cannot be empty".into()));
    }
    if changes.username.as_deref().is_some_and(|u| !is_valid_username(u)) {
        return Err(SignupRejection::InvalidUsernameLength.into());
    }
    if changes.email.as_deref().is_some_and(|e| !is_valid_email(e)) {
        return Err(SignupRejection::InvalidEmail.into());
    }
    if changes.mobile.as_deref().is_some_and(|m| !is_valid_mobile(m)) {
        return Err(SignupRejection::InvalidMobile.into());
    }
    if password.is_some_and(|p| !is_valid_password(p)) {
        return Err(SignupRejection::InvalidPassword.into());
    }
    Ok(())
}

/// Remove any account. Admins only.
pub async fn delete_user(users: &dyn UserStore, caller: &AuthUser, id: Uuid) -> Result<(), AppError> {
    require_admin(caller)?;
    users.delete(id).await?;
    info!(user_id = %id, admin_id = %caller.id, "user deleted");
    Ok(())
}
