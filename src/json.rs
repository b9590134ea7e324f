use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json` whose rejection is a 400 `AppError` instead of the default
/// 415/422 plain-text responses.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
