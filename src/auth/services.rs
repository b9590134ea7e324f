use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::delivery::ResetTokenDelivery;
use super::dto::{AuthResponse, ForgotPasswordResponse, MessageResponse};
use super::jwt::JwtKeys;
use crate::error::AppError;
use crate::users::directory::{NewUser, UserChanges, UserDirectory};
use crate::users::repo_types::PublicUser;

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If a user with this email exists, they will receive a password reset link.";
pub const PASSWORD_RESET_MESSAGE: &str = "Password has been reset successfully";

/// Login, registration and password flows.
#[derive(Clone)]
pub struct Authenticator {
    users: UserDirectory,
    keys: JwtKeys,
    delivery: Arc<dyn ResetTokenDelivery>,
}

impl Authenticator {
    pub fn new(users: UserDirectory, keys: JwtKeys, delivery: Arc<dyn ResetTokenDelivery>) -> Self {
        Self {
            users,
            keys,
            delivery,
        }
    }

    pub async fn register(&self, new: NewUser) -> Result<AuthResponse, AppError> {
        let user = self.users.create(new).await?;
        let token = self.keys.sign_session(user.id)?;
        info!(user_id = %user.id, "user registered");
        Ok(AuthResponse {
            token,
            user: PublicUser::from(&user),
        })
    }

    /// Unknown email and wrong password are the same error, at the same cost.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            self.users.compare_password_absent(password);
            warn!("login unknown email");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        };

        if !self.users.compare_password(&user, password) {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }

        let token = self.keys.sign_session(user.id)?;
        info!(user_id = %user.id, "user logged in");
        Ok(AuthResponse {
            token,
            user: PublicUser::from(&user),
        })
    }

    /// Same message whether or not the account exists.
    pub async fn forgot_password(&self, email: &str) -> Result<ForgotPasswordResponse, AppError> {
        let reset_token = match self.users.find_by_email(email).await? {
            Some(user) => {
                let token = self.keys.sign_reset(user.id)?;
                self.delivery.deliver(&user, token).await?
            }
            None => None,
        };
        Ok(ForgotPasswordResponse {
            message: FORGOT_PASSWORD_MESSAGE.into(),
            reset_token,
        })
    }

    /// `user_id` comes from a verified token, never from the body.
    pub async fn reset_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<MessageResponse, AppError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

        if !self.users.compare_password(&user, current_password) {
            warn!(user_id = %user.id, "reset with wrong current password");
            return Err(AppError::Unauthorized("Current password is incorrect".into()));
        }

        self.users
            .save(
                user.id,
                UserChanges {
                    password: Some(new_password.to_string()),
                    ..Default::default()
                },
            )
            .await?;
        info!(user_id = %user.id, "password reset");
        Ok(MessageResponse {
            message: PASSWORD_RESET_MESSAGE.into(),
        })
    }
}
