//! Task records.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::database::Result;

/// Task as saved on database.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persist a task with `title` and return the stored record.
    async fn create(&self, title: &str) -> Result<Task>;
}

#[derive(Clone)]
pub struct PgTaskStore {
    pool: Pool<Postgres>,
}

impl PgTaskStore {
    /// Create a new [`PgTaskStore`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn create(&self, title: &str) -> Result<Task> {
        let task = sqlx::query_as::<_, Task>(
            r#"INSERT INTO tasks (title) VALUES ($1) RETURNING id, title"#,
        )
        .bind(title)
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }
}
