use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo_types::{NewTask, Task, TaskPatch, TaskRow, TaskStatus};

/// Task persistence. Every call is scoped by owner; a task owned by someone
/// else behaves exactly like a missing one.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Most recent first.
    async fn list_by_owner(&self, owner: Uuid) -> anyhow::Result<Vec<Task>>;
    async fn find_owned(&self, id: Uuid, owner: Uuid) -> anyhow::Result<Option<Task>>;
    async fn insert(&self, owner: Uuid, new: NewTask) -> anyhow::Result<Task>;
    /// Single conditional update on `(id, owner)`.
    async fn update_owned(&self, id: Uuid, owner: Uuid, patch: TaskPatch)
        -> anyhow::Result<Option<Task>>;
    /// Single conditional delete on `(id, owner)`.
    async fn delete_owned(&self, id: Uuid, owner: Uuid) -> anyhow::Result<Option<Task>>;
}

#[derive(Clone)]
pub struct PgTaskStore {
    db: PgPool,
}

impl PgTaskStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn into_task(row: TaskRow) -> anyhow::Result<Task> {
    Task::try_from(row)
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn list_by_owner(&self, owner: Uuid) -> anyhow::Result<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, user_id, title, description, due_date, completed, status,
                   created_at, updated_at
            FROM tasks
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.db)
        .await
        .context("list tasks by owner")?;
        rows.into_iter().map(into_task).collect()
    }

    async fn find_owned(&self, id: Uuid, owner: Uuid) -> anyhow::Result<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, user_id, title, description, due_date, completed, status,
                   created_at, updated_at
            FROM tasks
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.db)
        .await
        .context("find owned task")?;
        row.map(into_task).transpose()
    }

    async fn insert(&self, owner: Uuid, new: NewTask) -> anyhow::Result<Task> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            INSERT INTO tasks (id, user_id, title, description, due_date, completed, status)
            VALUES ($1, $2, $3, $4, $5, FALSE, 'pending')
            RETURNING id, user_id, title, description, due_date, completed, status,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.due_date)
        .fetch_one(&self.db)
        .await
        .context("insert task")?;
        into_task(row)
    }

    async fn update_owned(
        &self,
        id: Uuid,
        owner: Uuid,
        patch: TaskPatch,
    ) -> anyhow::Result<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            UPDATE tasks
               SET title       = COALESCE($3, title),
                   description = COALESCE($4, description),
                   due_date    = COALESCE($5, due_date),
                   completed   = COALESCE($6, completed),
                   status      = COALESCE($7, status),
                   updated_at  = now()
             WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, description, due_date, completed, status,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.due_date)
        .bind(patch.completed)
        .bind(patch.status.map(|s| s.as_str()))
        .fetch_optional(&self.db)
        .await
        .context("update owned task")?;
        row.map(into_task).transpose()
    }

    async fn delete_owned(&self, id: Uuid, owner: Uuid) -> anyhow::Result<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            DELETE FROM tasks
             WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, description, due_date, completed, status,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.db)
        .await
        .context("delete owned task")?;
        row.map(into_task).transpose()
    }
}

/// Process-local store for development and tests. Kept in insertion order.
#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<Vec<Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn list_by_owner(&self, owner: Uuid) -> anyhow::Result<Vec<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().rev().filter(|t| t.user_id == owner).cloned().collect())
    }

    async fn find_owned(&self, id: Uuid, owner: Uuid) -> anyhow::Result<Option<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks
            .iter()
            .find(|t| t.id == id && t.user_id == owner)
            .cloned())
    }

    async fn insert(&self, owner: Uuid, new: NewTask) -> anyhow::Result<Task> {
        let now = OffsetDateTime::now_utc();
        let task = Task {
            id: Uuid::new_v4(),
            user_id: owner,
            title: new.title,
            description: new.description,
            due_date: new.due_date,
            completed: false,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.tasks.write().await.push(task.clone());
        Ok(task)
    }

    async fn update_owned(
        &self,
        id: Uuid,
        owner: Uuid,
        patch: TaskPatch,
    ) -> anyhow::Result<Option<Task>> {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.iter_mut().find(|t| t.id == id && t.user_id == owner) else {
            return Ok(None);
        };
        task.apply(patch);
        Ok(Some(task.clone()))
    }

    async fn delete_owned(&self, id: Uuid, owner: Uuid) -> anyhow::Result<Option<Task>> {
        let mut tasks = self.tasks.write().await;
        let Some(pos) = tasks.iter().position(|t| t.id == id && t.user_id == owner) else {
            return Ok(None);
        };
        Ok(Some(tasks.remove(pos)))
    }
}
