use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::users::directory::{is_valid_email, normalize_email, NewUser};
use crate::users::repo_types::PublicUser;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(self) -> Result<NewUser, AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("Name must be a non-empty string"));
        }
        let email = normalize_email(&self.email);
        if !is_valid_email(&email) {
            return Err(AppError::validation("Invalid email format"));
        }
        if self.password.is_empty() {
            return Err(AppError::validation("Password is required"));
        }
        Ok(NewUser {
            name: self.name,
            email,
            password: self.password,
        })
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

impl ResetPasswordRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.current_password.is_empty() || self.new_password.is_empty() {
            return Err(AppError::validation("Both current and new passwords are required"));
        }
        Ok(())
    }
}

/// Response returned after login or register.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_validation() {
        let ok = RegisterRequest {
            name: "Ann".into(),
            email: " Ann@Example.com".into(),
            password: "pw".into(),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.email, "ann@example.com");

        let blank_name = RegisterRequest {
            name: "  ".into(),
            email: "ann@example.com".into(),
            password: "pw".into(),
        };
        assert!(matches!(blank_name.validate(), Err(AppError::Validation(_))));

        let bad_email = RegisterRequest {
            name: "Ann".into(),
            email: "ann-at-example".into(),
            password: "pw".into(),
        };
        assert!(matches!(bad_email.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn reset_token_is_omitted_when_absent() {
        let json = serde_json::to_value(ForgotPasswordResponse {
            message: "m".into(),
            reset_token: None,
        })
        .unwrap();
        assert!(json.get("resetToken").is_none());

        let json = serde_json::to_value(ForgotPasswordResponse {
            message: "m".into(),
            reset_token: Some("t".into()),
        })
        .unwrap();
        assert_eq!(json["resetToken"], "t");
    }

    #[test]
    fn reset_request_uses_camel_case() {
        let req: ResetPasswordRequest =
            serde_json::from_str(r#"{"currentPassword":"a","newPassword":"b"}"#).unwrap();
        assert_eq!(req.current_password, "a");
        assert!(req.validate().is_ok());
    }
}
