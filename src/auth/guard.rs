use uuid::Uuid;

use crate::{auth::extractors::AuthUser, error::AppError};

pub const NOT_OWNER: &str = "You can update only your Account";
pub const NOT_ADMIN: &str = "You are not allowed to delete this user";

/// The caller may only act on their own account.
pub fn require_self(caller: &AuthUser, target: Uuid) -> Result<(), AppError> {
    if caller.id != target {
        return Err(AppError::Unauthorized(NOT_OWNER.into()));
    }
    Ok(())
}

pub fn require_admin(caller: &AuthUser) -> Result<(), AppError> {
    if !caller.is_admin {
        return Err(AppError::Forbidden(NOT_ADMIN.into()));
    }
    Ok(())
}
