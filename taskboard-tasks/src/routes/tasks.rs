/// Task endpoints (bearer token required on every route)
///
/// # Endpoints
///
/// - `POST /api/tasks` - Create a task
/// - `GET /api/tasks` - List with optional `status`, `priority`,
///   `assignee_id`, `created_by` filters
/// - `GET /api/tasks/my` - Tasks assigned to the caller
/// - `GET /api/tasks/stats?scope=mine|all` - Per-status counts
/// - `GET /api/tasks/user/:userId` - Tasks assigned to an existing identity
/// - `GET /api/tasks/:id` - One task with its assignee resolved
/// - `PUT /api/tasks/:id` - Partial update
/// - `DELETE /api/tasks/:id` - Delete
///
/// Any authenticated caller may update or delete any task.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use taskboard_shared::auth::middleware::AuthContext;
use taskboard_shared::http::error::{parse_id, ApiError, ApiResult, ValidJson};
use taskboard_shared::models::task::{Task, TaskFilter, TaskPatch, TaskPriority, TaskStats, TaskStatus};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    service::{NewTask, TaskDetail},
};

const TASK_NOT_FOUND: &str = "Task not found";

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
}

impl From<CreateTaskRequest> for NewTask {
    fn from(req: CreateTaskRequest) -> Self {
        NewTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            assignee_id: req.assignee_id,
            due_date: req.due_date,
        }
    }
}

/// List filters as they arrive in the query string
///
/// Kept as raw strings so that `?status=` means "no filter" rather than a
/// parse failure.
#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee_id: Option<String>,
    pub created_by: Option<String>,
}

impl ListTasksQuery {
    /// Converts to a typed filter; empty values are absent filters
    pub fn into_filter(self) -> ApiResult<TaskFilter> {
        Ok(TaskFilter {
            status: parse_filter("status", self.status)?,
            priority: parse_filter("priority", self.priority)?,
            assignee_id: parse_filter("assignee_id", self.assignee_id)?,
            created_by: parse_filter("created_by", self.created_by)?,
        })
    }
}

fn parse_filter<T>(field: &str, raw: Option<String>) -> ApiResult<Option<T>>
where
    T: FromStr,
{
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ApiError::invalid_field(field, format!("Invalid {} filter: {}", field, value))),
    }
}

/// Stats scope
#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    /// `mine` (default) or `all`
    pub scope: Option<String>,
}

/// Create/update response
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    pub message: String,
    pub task: Task,
}

/// Acknowledgement body
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Create a task
///
/// ```text
/// POST /api/tasks
/// { "title": "A", "assignee_id": "uuid", "priority": "high", "due_date": "2026-12-31" }
/// ```
///
/// # Errors
///
/// - `400 validation_error`: Missing or blank title
/// - `400 invalid_assignee`: Assignee does not exist or could not be checked
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidJson(req): ValidJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let task = state
        .tasks
        .create(auth.user_id, &auth.token, req.into())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TaskResponse {
            message: "Task created successfully".to_string(),
            task,
        }),
    ))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let filter = query.into_filter()?;
    Ok(Json(state.tasks.list(&filter).await?))
}

pub async fn my_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(state.tasks.assigned_to_caller(auth.user_id).await?))
}

/// `scope=mine` counts tasks the caller is assigned to or created;
/// `scope=all` counts everything.
pub async fn task_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<TaskStats>> {
    let subject = match query.scope.as_deref().map(str::trim) {
        None | Some("") | Some("mine") => Some(auth.user_id),
        Some("all") => None,
        Some(other) => {
            return Err(ApiError::invalid_field(
                "scope",
                format!("Invalid scope: {} (expected mine or all)", other),
            ))
        }
    };

    Ok(Json(state.tasks.stats(subject).await?))
}

/// # Errors
///
/// - `404 not_found`: The identity does not exist or could not be checked
pub async fn user_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<Task>>> {
    let user_id = parse_id(&user_id, "User not found")?;
    Ok(Json(
        state.tasks.assigned_to_user(user_id, &auth.token).await?,
    ))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskDetail>> {
    let id = parse_id(&id, TASK_NOT_FOUND)?;
    Ok(Json(state.tasks.get(id, &auth.token).await?))
}

/// Partial update
///
/// Absent fields are left alone; `null` clears `description`,
/// `assignee_id` and `due_date`.
///
/// # Errors
///
/// - `400 validation_error`: Blank title
/// - `400 invalid_assignee`: Newly set assignee does not exist
/// - `404 not_found`: No such task
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    ValidJson(patch): ValidJson<TaskPatch>,
) -> ApiResult<Json<TaskResponse>> {
    let id = parse_id(&id, TASK_NOT_FOUND)?;
    let task = state.tasks.update(id, &auth.token, patch).await?;

    Ok(Json(TaskResponse {
        message: "Task updated successfully".to_string(),
        task,
    }))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&id, TASK_NOT_FOUND)?;
    state.tasks.delete(id).await?;

    Ok(Json(MessageResponse {
        message: "Task deleted successfully".to_string(),
    }))
}
