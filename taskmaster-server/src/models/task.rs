use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Stored as TEXT using the variant names.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub recurring: bool,
    pub created_at: DateTime<Utc>,
}

/// Body shared by create and update; both default description to empty,
/// priority to Low and recurring to false. `title` and `due_date` are
/// validated by hand so a missing field yields the documented 400.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TaskPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
    pub recurring: Option<bool>,
}

/// Reorder intent from the dashboard's drag-and-drop. Accepted but never
/// persisted; the fields are optional because nothing reads them beyond a
/// debug log.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub task_id: Option<i64>,
    pub new_position: Option<i64>,
}
