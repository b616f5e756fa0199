/// Task model and database operations
///
/// Tasks are owned by the task service. `assignee_id` and `created_by` are
/// weak references into the identity service's store: plain UUID columns
/// with no foreign key. The assignee is confirmed to exist when it is
/// written; after that the reference may dangle (the identity can be
/// deleted at any time) and readers must tolerate it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE IF NOT EXISTS tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status VARCHAR(16) NOT NULL DEFAULT 'todo',
///     priority VARCHAR(16) NOT NULL DEFAULT 'medium',
///     assignee_id UUID,
///     created_by UUID NOT NULL,
///     due_date DATE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::task::{Task, CreateTask, TaskFilter, TaskStatus};
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// Task::initialize(&pool).await?;
///
/// let task = Task::create(&pool, CreateTask::new("Write docs", Uuid::new_v4())).await?;
/// assert_eq!(task.status, TaskStatus::Todo);
///
/// let todo = Task::list(&pool, &TaskFilter {
///     status: Some(TaskStatus::Todo),
///     ..Default::default()
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::ParseEnumError;

const TASKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    title VARCHAR(255) NOT NULL,
    description TEXT,
    status VARCHAR(16) NOT NULL DEFAULT 'todo'
        CHECK (status IN ('todo', 'in_progress', 'review', 'done')),
    priority VARCHAR(16) NOT NULL DEFAULT 'medium'
        CHECK (priority IN ('low', 'medium', 'high', 'urgent')),
    assignee_id UUID,
    created_by UUID NOT NULL,
    due_date DATE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const TASK_COLUMNS: &str = "id, title, description, status, priority, assignee_id, created_by, \
                            due_date, created_at, updated_at";

/// Workflow status
///
/// Any status may move to any other; `Done` is not terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    Done,
}

impl TaskStatus {
    /// Converts status to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "review" => Ok(TaskStatus::Review),
            "done" => Ok(TaskStatus::Done),
            other => Err(ParseEnumError::new("status", other)),
        }
    }
}

impl TryFrom<String> for TaskStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    /// Converts priority to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            "urgent" => Ok(TaskPriority::Urgent),
            other => Err(ParseEnumError::new("priority", other)),
        }
    }
}

impl TryFrom<String> for TaskPriority {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Task model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Title (never empty)
    pub title: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// Workflow status
    #[sqlx(try_from = "String")]
    pub status: TaskStatus,

    /// Priority
    #[sqlx(try_from = "String")]
    pub priority: TaskPriority,

    /// Weak reference to the assigned identity
    pub assignee_id: Option<Uuid>,

    /// Weak reference to the identity that created the task
    pub created_by: Uuid,

    /// Optional due date
    pub due_date: Option<NaiveDate>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assignee_id: Option<Uuid>,
    pub created_by: Uuid,
    pub due_date: Option<NaiveDate>,
}

impl CreateTask {
    /// A task with only a title and creator; everything else defaulted
    pub fn new(title: impl Into<String>, created_by: Uuid) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            assignee_id: None,
            created_by,
            due_date: None,
        }
    }
}

/// Change to a single nullable field in a partial update
///
/// Deserializes from JSON as: field absent -> `Unchanged` (via
/// `#[serde(default)]`), `null` -> `Clear`, any value -> `Set`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    /// Keep the stored value
    Unchanged,

    /// Set the field to null
    Clear,

    /// Replace the stored value
    Set(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Unchanged
    }
}

impl<T> Patch<T> {
    /// Resolves the patch against the current value
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Patch::Unchanged => current,
            Patch::Clear => None,
            Patch::Set(value) => Some(value),
        }
    }

    /// The value being set, if any
    pub fn as_set(&self) -> Option<&T> {
        match self {
            Patch::Set(value) => Some(value),
            _ => None,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Patch::Set(value),
            None => Patch::Clear,
        })
    }
}

/// Partial update of a task
///
/// Non-nullable fields use `Option` (absent or null keeps the stored value);
/// nullable fields use [`Patch`] so that "clear" and "leave alone" differ.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
#[serde(default)]
pub struct TaskPatch {
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<String>,
    pub description: Patch<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Patch<Uuid>,
    pub due_date: Patch<NaiveDate>,
}

impl Task {
    /// Merges a patch into this task in place
    ///
    /// Does not validate; callers check the title and the assignee first.
    pub fn apply(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        self.description = patch.description.apply(self.description.take());
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        self.assignee_id = patch.assignee_id.apply(self.assignee_id);
        self.due_date = patch.due_date.apply(self.due_date);
    }
}

/// Equality filters for listing tasks, combined with AND
///
/// A `None` field places no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
}

impl TaskFilter {
    /// Filter selecting tasks assigned to one identity
    pub fn assigned_to(user_id: Uuid) -> Self {
        Self {
            assignee_id: Some(user_id),
            ..Default::default()
        }
    }

    /// Whether a task passes every present predicate
    pub fn matches(&self, task: &Task) -> bool {
        self.status.map_or(true, |s| task.status == s)
            && self.priority.map_or(true, |p| task.priority == p)
            && self.assignee_id.map_or(true, |a| task.assignee_id == Some(a))
            && self.created_by.map_or(true, |c| task.created_by == c)
    }
}

/// Per-status task counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskStats {
    pub total: i64,
    pub todo: i64,
    pub in_progress: i64,
    pub review: i64,
    pub done: i64,
}

impl TaskStats {
    /// Counts the given tasks, each exactly once
    pub fn tally<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        tasks.into_iter().fold(TaskStats::default(), |mut stats, task| {
            stats.total += 1;
            match task.status {
                TaskStatus::Todo => stats.todo += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Review => stats.review += 1,
                TaskStatus::Done => stats.done += 1,
            }
            stats
        })
    }

    /// Whether a task counts toward a subject's stats (assignee OR creator)
    pub fn involves(task: &Task, subject: Uuid) -> bool {
        task.assignee_id == Some(subject) || task.created_by == subject
    }
}

impl Task {
    /// Creates the `tasks` table if it does not exist
    pub async fn initialize(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::query(TASKS_TABLE).execute(pool).await?;
        tracing::info!("Tasks table ready");
        Ok(())
    }

    /// Inserts a new task
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO tasks (title, description, status, priority, assignee_id, created_by, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(data.title)
            .bind(data.description)
            .bind(data.status.as_str())
            .bind(data.priority.as_str())
            .bind(data.assignee_id)
            .bind(data.created_by)
            .bind(data.due_date)
            .fetch_one(pool)
            .await
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists tasks matching a filter, newest first
    pub async fn list(pool: &PgPool, filter: &TaskFilter) -> Result<Vec<Self>, sqlx::Error> {
        // Build dynamic WHERE clause based on which filters are present
        let mut query = format!("SELECT {} FROM tasks WHERE TRUE", TASK_COLUMNS);
        let mut bind_count = 0;

        if filter.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND status = ${}", bind_count));
        }
        if filter.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND priority = ${}", bind_count));
        }
        if filter.assignee_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND assignee_id = ${}", bind_count));
        }
        if filter.created_by.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND created_by = ${}", bind_count));
        }

        // id breaks timestamp ties, as in the in-memory store
        query.push_str(" ORDER BY created_at DESC, id DESC");

        let mut q = sqlx::query_as::<_, Task>(&query);

        if let Some(status) = filter.status {
            q = q.bind(status.as_str());
        }
        if let Some(priority) = filter.priority {
            q = q.bind(priority.as_str());
        }
        if let Some(assignee_id) = filter.assignee_id {
            q = q.bind(assignee_id);
        }
        if let Some(created_by) = filter.created_by {
            q = q.bind(created_by);
        }

        q.fetch_all(pool).await
    }

    /// Writes every mutable field of `task`
    ///
    /// Last writer wins. Returns `None` if the row no longer exists.
    pub async fn save(pool: &PgPool, task: &Task) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE tasks
            SET title = $2,
                description = $3,
                status = $4,
                priority = $5,
                assignee_id = $6,
                due_date = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(task.id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.status.as_str())
            .bind(task.priority.as_str())
            .bind(task.assignee_id)
            .bind(task.due_date)
            .fetch_optional(pool)
            .await
    }

    /// Deletes a task, returning true if a row was removed
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts tasks per status
    ///
    /// With a subject, only tasks the subject is assigned to or created are
    /// counted. A row matching both predicates is still a single row.
    pub async fn stats(pool: &PgPool, subject: Option<Uuid>) -> Result<TaskStats, sqlx::Error> {
        sqlx::query_as::<_, TaskStats>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'todo') AS todo,
                   COUNT(*) FILTER (WHERE status = 'in_progress') AS in_progress,
                   COUNT(*) FILTER (WHERE status = 'review') AS review,
                   COUNT(*) FILTER (WHERE status = 'done') AS done
            FROM tasks
            WHERE $1::uuid IS NULL OR assignee_id = $1 OR created_by = $1
            "#,
        )
        .bind(subject)
        .fetch_one(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_task(created_by: Uuid) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            title: "Write docs".to_string(),
            description: Some("All of them".to_string()),
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            assignee_id: Some(Uuid::new_v4()),
            created_by,
            due_date: NaiveDate::from_ymd_opt(2026, 12, 31),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_enum_text_forms() {
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!("review".parse::<TaskStatus>().unwrap(), TaskStatus::Review);
        assert_eq!("in_progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("urgent".parse::<TaskPriority>().unwrap(), TaskPriority::Urgent);

        let err = "blocked".parse::<TaskStatus>().unwrap_err();
        assert_eq!(err.kind, "status");
        assert_eq!(err.value, "blocked");

        assert_eq!(
            serde_json::to_value(TaskStatus::InProgress).unwrap(),
            json!("in_progress")
        );
    }

    #[test]
    fn test_defaults() {
        let data = CreateTask::new("A", Uuid::new_v4());
        assert_eq!(data.status, TaskStatus::Todo);
        assert_eq!(data.priority, TaskPriority::Medium);
        assert!(data.assignee_id.is_none());
    }

    #[test]
    fn test_patch_deserialization_distinguishes_absent_and_null() {
        let patch: TaskPatch = serde_json::from_value(json!({
            "status": "done",
            "description": null
        }))
        .unwrap();

        assert_eq!(patch.status, Some(TaskStatus::Done));
        assert_eq!(patch.description, Patch::Clear);
        assert_eq!(patch.assignee_id, Patch::Unchanged);
        assert_eq!(patch.due_date, Patch::Unchanged);
        assert!(patch.title.is_none());

        let assignee = Uuid::new_v4();
        let patch: TaskPatch = serde_json::from_value(json!({
            "assignee_id": assignee,
            "due_date": "2027-01-15"
        }))
        .unwrap();
        assert_eq!(patch.assignee_id, Patch::Set(assignee));
        assert_eq!(
            patch.due_date,
            Patch::Set(NaiveDate::from_ymd_opt(2027, 1, 15).unwrap())
        );
    }

    #[test]
    fn test_apply_patch() {
        let mut task = sample_task(Uuid::new_v4());
        let original = task.clone();

        task.apply(TaskPatch {
            status: Some(TaskStatus::Done),
            description: Patch::Clear,
            ..Default::default()
        });

        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.description, None);
        assert_eq!(task.title, original.title);
        assert_eq!(task.assignee_id, original.assignee_id);
        assert_eq!(task.due_date, original.due_date);

        // Done is not terminal
        task.apply(TaskPatch {
            status: Some(TaskStatus::Todo),
            assignee_id: Patch::Clear,
            ..Default::default()
        });
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.assignee_id, None);
    }

    #[test]
    fn test_filter_matches() {
        let creator = Uuid::new_v4();
        let task = sample_task(creator);

        assert!(TaskFilter::default().matches(&task));
        assert!(TaskFilter {
            status: Some(TaskStatus::Todo),
            created_by: Some(creator),
            ..Default::default()
        }
        .matches(&task));
        assert!(!TaskFilter {
            status: Some(TaskStatus::Todo),
            priority: Some(TaskPriority::High),
            ..Default::default()
        }
        .matches(&task));
        assert!(!TaskFilter::assigned_to(creator).matches(&task));
    }

    #[test]
    fn test_stats_tally_counts_each_task_once() {
        let me = Uuid::new_v4();
        let mut both = sample_task(me);
        both.assignee_id = Some(me);
        let mut created = sample_task(me);
        created.status = TaskStatus::Done;
        let mut unrelated = sample_task(Uuid::new_v4());
        unrelated.status = TaskStatus::Review;

        let tasks = [both, created, unrelated];
        let mine = TaskStats::tally(tasks.iter().filter(|t| TaskStats::involves(t, me)));

        assert_eq!(
            mine,
            TaskStats {
                total: 2,
                todo: 1,
                in_progress: 0,
                review: 0,
                done: 1
            }
        );
        assert_eq!(TaskStats::tally(tasks.iter()).total, 3);
    }
}
