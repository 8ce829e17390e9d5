use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};

use crate::error::{ApiError, ErrorBody};
use crate::middleware::auth::AuthUser;
use crate::models::task::{ReorderRequest, Task, TaskPayload};
use crate::models::user::MessageResponse;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/reorder", post(reorder_tasks))
        .route("/{id}", put(update_task).delete(delete_task))
        .route("/{id}/complete", patch(toggle_complete))
}

/// Shared create/update validation. Title and due date are the only fields
/// without a default; an empty title counts as missing.
fn validate_payload(payload: &TaskPayload) -> Result<(String, DateTime<Utc>), ApiError> {
    match (&payload.title, payload.due_date) {
        (Some(title), Some(due_date)) if !title.is_empty() => Ok((title.clone(), due_date)),
        _ => Err(ApiError::Validation(
            "Title and due date are required".to_string(),
        )),
    }
}

#[utoipa::path(
    get,
    path = "/api/tasks",
    responses(
        (status = 200, description = "All tasks owned by the current user, newest first", body = Vec<Task>),
        (status = 401, description = "Not authenticated", body = ErrorBody),
    ),
    security(("session_cookie" = [])),
    tag = "Tasks"
)]
pub(crate) async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = sqlx::query_as::<_, Task>(
        "SELECT id, user_id, title, description, due_date, priority, status, recurring, created_at
         FROM tasks WHERE user_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(tasks))
}

#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = TaskPayload,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Missing title or due date", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
    ),
    security(("session_cookie" = [])),
    tag = "Tasks"
)]
pub(crate) async fn create_task(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<TaskPayload>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let (title, due_date) = validate_payload(&req)?;

    // Status is left to its schema default (Pending).
    let task = sqlx::query_as::<_, Task>(
        "INSERT INTO tasks (user_id, title, description, due_date, priority, recurring, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)
         RETURNING id, user_id, title, description, due_date, priority, status, recurring, created_at",
    )
    .bind(user.id)
    .bind(&title)
    .bind(req.description.unwrap_or_default())
    .bind(due_date)
    .bind(req.priority.unwrap_or_default())
    .bind(req.recurring.unwrap_or(false))
    .bind(Utc::now())
    .fetch_one(&state.db)
    .await?;

    tracing::debug!(user_id = user.id, task_id = task.id, "task created");

    Ok((StatusCode::CREATED, Json(task)))
}

#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    params(("id" = i64, Path, description = "Task id")),
    request_body = TaskPayload,
    responses(
        (status = 200, description = "Updated task", body = Task),
        (status = 400, description = "Missing title or due date", body = ErrorBody),
        (status = 404, description = "Task absent or owned by another user", body = ErrorBody),
    ),
    security(("session_cookie" = [])),
    tag = "Tasks"
)]
pub(crate) async fn update_task(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<TaskPayload>,
) -> Result<Json<Task>, ApiError> {
    let (title, due_date) = validate_payload(&req)?;

    // Single owner-scoped statement; status is deliberately untouched so an
    // edit never flips completion.
    let task = sqlx::query_as::<_, Task>(
        "UPDATE tasks SET title = ?, description = ?, due_date = ?, priority = ?, recurring = ?
         WHERE id = ? AND user_id = ?
         RETURNING id, user_id, title, description, due_date, priority, status, recurring, created_at",
    )
    .bind(&title)
    .bind(req.description.unwrap_or_default())
    .bind(due_date)
    .bind(req.priority.unwrap_or_default())
    .bind(req.recurring.unwrap_or(false))
    .bind(id)
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

#[utoipa::path(
    patch,
    path = "/api/tasks/{id}/complete",
    params(("id" = i64, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task with status flipped", body = Task),
        (status = 404, description = "Task absent or owned by another user", body = ErrorBody),
    ),
    security(("session_cookie" = [])),
    tag = "Tasks"
)]
pub(crate) async fn toggle_complete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Task>, ApiError> {
    // Atomic flip; applying it twice restores the original status.
    let task = sqlx::query_as::<_, Task>(
        "UPDATE tasks
         SET status = CASE status WHEN 'Pending' THEN 'Completed' ELSE 'Pending' END
         WHERE id = ? AND user_id = ?
         RETURNING id, user_id, title, description, due_date, priority, status, recurring, created_at",
    )
    .bind(id)
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    params(("id" = i64, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task deleted", body = MessageResponse),
        (status = 404, description = "Task absent or owned by another user", body = ErrorBody),
    ),
    security(("session_cookie" = [])),
    tag = "Tasks"
)]
pub(crate) async fn delete_task(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok(Json(MessageResponse {
        message: "Task deleted successfully".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/tasks/reorder",
    request_body = ReorderRequest,
    responses(
        (status = 200, description = "Acknowledged; ordering is not persisted", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = ErrorBody),
    ),
    security(("session_cookie" = [])),
    tag = "Tasks"
)]
pub(crate) async fn reorder_tasks(
    AuthUser(user): AuthUser,
    Json(req): Json<ReorderRequest>,
) -> Json<MessageResponse> {
    tracing::debug!(
        user_id = user.id,
        task_id = req.task_id,
        new_position = req.new_position,
        "reorder requested, ordering is not persisted"
    );
    Json(MessageResponse {
        message: "Task reordering not implemented yet".to_string(),
    })
}
