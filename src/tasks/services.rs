use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    PrimitiveDateTime,
};
use tracing::{debug, info};
use uuid::Uuid;

use super::dto::{CreateTaskRequest, UpdateTaskRequest};
use super::repo::TaskStore;
use super::repo_types::{NewTask, Task, TaskPatch, TaskStatus};
use crate::error::AppError;

pub const TASK_NOT_FOUND: &str = "Task not found";
pub const INVALID_TASK_ID: &str = "Invalid task ID";

pub fn parse_task_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::validation(INVALID_TASK_ID))
}

/// RFC 3339 date-time, an offset-less date-time taken as UTC, or a bare
/// `YYYY-MM-DD` taken as midnight UTC.
pub fn parse_due_date(raw: &str) -> Result<OffsetDateTime, AppError> {
    let raw = raw.trim();
    if let Ok(dt) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(dt);
    }
    let local = format_description!(
        "[year]-[month]-[day]T[hour]:[minute][optional [:[second][optional [.[subsecond]]]]]"
    );
    if let Ok(dt) = PrimitiveDateTime::parse(raw, local) {
        return Ok(dt.assume_utc());
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map(|d| d.midnight().assume_utc())
        .map_err(|_| AppError::validation("Invalid date format"))
}

fn non_empty(field: &str, value: String) -> Result<String, AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must be a non-empty string")));
    }
    Ok(value)
}

impl CreateTaskRequest {
    pub fn validate(self) -> Result<NewTask, AppError> {
        let (Some(title), Some(description), Some(due_date)) = (
            self.title.filter(|s| !s.trim().is_empty()),
            self.description.filter(|s| !s.trim().is_empty()),
            self.due_date.filter(|s| !s.trim().is_empty()),
        ) else {
            return Err(AppError::validation("Missing required fields"));
        };
        Ok(NewTask {
            title,
            description,
            due_date: parse_due_date(&due_date)?,
        })
    }
}

impl UpdateTaskRequest {
    /// `completed` wins when both are given; otherwise whichever is present
    /// decides the other.
    pub fn validate(self) -> Result<TaskPatch, AppError> {
        let (completed, status) = match (self.completed, self.status) {
            (Some(c), _) => (Some(c), Some(TaskStatus::from_completed(c))),
            (None, Some(s)) => (Some(s == TaskStatus::Completed), Some(s)),
            (None, None) => (None, None),
        };
        Ok(TaskPatch {
            title: self.title.map(|t| non_empty("Title", t)).transpose()?,
            description: self
                .description
                .map(|d| non_empty("Description", d))
                .transpose()?,
            due_date: self.due_date.as_deref().map(parse_due_date).transpose()?,
            completed,
            status,
        })
    }
}

pub async fn list_tasks(store: &dyn TaskStore, owner: Uuid) -> Result<Vec<Task>, AppError> {
    let tasks = store.list_by_owner(owner).await?;
    debug!(user_id = %owner, count = tasks.len(), "tasks listed");
    Ok(tasks)
}

pub async fn get_task(store: &dyn TaskStore, id: Uuid, owner: Uuid) -> Result<Task, AppError> {
    store
        .find_owned(id, owner)
        .await?
        .ok_or_else(|| AppError::NotFound(TASK_NOT_FOUND.into()))
}

/// Validation happens before anything is written.
pub async fn create_task(
    store: &dyn TaskStore,
    owner: Uuid,
    req: CreateTaskRequest,
) -> Result<Task, AppError> {
    let new = req.validate()?;
    let task = store.insert(owner, new).await?;
    info!(user_id = %owner, task_id = %task.id, "task created");
    Ok(task)
}

pub async fn update_task(
    store: &dyn TaskStore,
    id: Uuid,
    owner: Uuid,
    req: UpdateTaskRequest,
) -> Result<Task, AppError> {
    let patch = req.validate()?;
    let task = store
        .update_owned(id, owner, patch)
        .await?
        .ok_or_else(|| AppError::NotFound(TASK_NOT_FOUND.into()))?;
    info!(user_id = %owner, task_id = %task.id, "task updated");
    Ok(task)
}

pub async fn delete_task(store: &dyn TaskStore, id: Uuid, owner: Uuid) -> Result<(), AppError> {
    store
        .delete_owned(id, owner)
        .await?
        .ok_or_else(|| AppError::NotFound(TASK_NOT_FOUND.into()))?;
    info!(user_id = %owner, task_id = %id, "task deleted");
    Ok(())
}
