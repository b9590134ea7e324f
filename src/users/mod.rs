use crate::state::AppState;
use axum::Router;

pub mod directory;
mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
mod services;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::profile_routes())
}
