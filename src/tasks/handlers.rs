use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::dto::{CreateTaskRequest, DeleteTaskResponse, UpdateTaskRequest};
use super::repo_types::Task;
use super::services::{self, parse_task_id};
use crate::{auth::extractors::AuthUser, error::AppError, json::AppJson, state::AppState};

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/:id", get(get_task).put(update_task).delete(delete_task))
}

#[instrument(skip(state))]
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Task>>, AppError> {
    let tasks = services::list_tasks(state.tasks.as_ref(), user_id).await?;
    Ok(Json(tasks))
}

#[instrument(skip(state))]
pub async fn get_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Task>, AppError> {
    let id = parse_task_id(&id)?;
    let task = services::get_task(state.tasks.as_ref(), id, user_id).await?;
    Ok(Json(task))
}

#[instrument(skip(state, payload))]
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<CreateTaskRequest>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<Task>), AppError> {
    let task = services::create_task(state.tasks.as_ref(), user_id, payload).await?;
    let location = format!("/tasks/{}", task.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(task)))
}

#[instrument(skip(state, payload))]
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateTaskRequest>,
) -> Result<Json<Task>, AppError> {
    let id = parse_task_id(&id)?;
    let task = services::update_task(state.tasks.as_ref(), id, user_id, payload).await?;
    Ok(Json(task))
}

#[instrument(skip(state))]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteTaskResponse>, AppError> {
    let id = parse_task_id(&id)?;
    services::delete_task(state.tasks.as_ref(), id, user_id).await?;
    Ok(Json(DeleteTaskResponse {
        message: "Task deleted successfully".into(),
    }))
}
