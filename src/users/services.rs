use tracing::{info, warn};
use uuid::Uuid;

use super::directory::{is_valid_email, normalize_email, UserChanges, UserDirectory};
use super::dto::UpdateProfileRequest;
use super::repo_types::User;
use crate::error::AppError;

pub const PROFILE_UPDATED: &str = "Profile updated successfully";

pub async fn get_profile(users: &UserDirectory, user_id: Uuid) -> Result<User, AppError> {
    users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Only supplied fields change. A password change needs the current one.
pub async fn update_profile(
    users: &UserDirectory,
    user_id: Uuid,
    req: UpdateProfileRequest,
) -> Result<User, AppError> {
    let user = get_profile(users, user_id).await?;
    let mut changes = UserChanges::default();

    if let Some(name) = req.name {
        if name.trim().is_empty() {
            return Err(AppError::validation("Name must be a non-empty string"));
        }
        changes.name = Some(name);
    }

    if let Some(email) = req.email {
        let email = normalize_email(&email);
        if !is_valid_email(&email) {
            return Err(AppError::validation("Invalid email format"));
        }
        changes.email = Some(email);
    }

    if req.current_password.is_some() || req.new_password.is_some() {
        let (Some(current), Some(new)) = (
            req.current_password.filter(|p| !p.is_empty()),
            req.new_password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AppError::validation("Both current and new passwords are required"));
        };
        if !users.compare_password(&user, &current) {
            warn!(user_id = %user.id, "profile update with wrong current password");
            return Err(AppError::validation("Current password is incorrect"));
        }
        changes.password = Some(new);
    }

    let saved = users.save(user.id, changes).await?;
    info!(user_id = %saved.id, "profile updated");
    Ok(saved)
}
