//! Task creation.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::database::bounded;
use crate::error::Result;
use crate::router::Valid;
use crate::task::Task;

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Body {
    #[validate(length(min = 1, message = "Title is required"))]
    title: String,
}

/// Handler to create a task from the caller-supplied title.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<Task>)> {
    let task = bounded(state.config.store.timeout(), state.tasks.create(&body.title))
        .await?;

    tracing::debug!(task_id = %task.id, "task created");

    Ok((StatusCode::CREATED, Json(task)))
}
