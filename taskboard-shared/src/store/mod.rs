/// Store abstractions
///
/// Each service talks to its store through a trait object so that request
/// handling does not depend on Postgres directly:
///
/// - [`UserStore`]: identity records, owned by the identity service
/// - [`TaskStore`]: task records, owned by the task service
///
/// # Implementations
///
/// - [`postgres`]: `PgUserStore` / `PgTaskStore`, thin wrappers over the
///   model functions in [`crate::models`]
/// - [`memory`]: `MemoryUserStore` / `MemoryTaskStore`, process-local maps
///   with the same observable behavior (unique emails, newest-first
///   ordering, single-row last-writer-wins updates)
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use taskboard_shared::store::{memory::MemoryTaskStore, TaskStore};
/// use taskboard_shared::models::task::{CreateTask, TaskFilter};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), taskboard_shared::store::StoreError> {
/// let store: Arc<dyn TaskStore> = Arc::new(MemoryTaskStore::new());
/// store.insert(CreateTask::new("A", Uuid::new_v4())).await?;
/// assert_eq!(store.list(&TaskFilter::default()).await?.len(), 1);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    task::{CreateTask, Task, TaskFilter, TaskStats},
    user::{CreateUser, UpdateUser, User},
};

pub mod memory;
pub mod postgres;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::UniqueViolation(
                    db_err
                        .constraint()
                        .unwrap_or("unknown constraint")
                        .to_string(),
                )
            }
            other => StoreError::Database(other),
        }
    }
}

/// Persistence for identity records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new identity; `UniqueViolation` if the email is taken
    async fn insert(&self, data: CreateUser) -> Result<User, StoreError>;

    /// Finds an identity by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Finds an identity by exact (case-sensitive) email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Every identity, oldest first
    async fn list(&self) -> Result<Vec<User>, StoreError>;

    /// Applies a profile update; `None` if the identity does not exist
    async fn update(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>, StoreError>;

    /// Deletes an identity; false if it did not exist
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Connectivity check used by the health endpoint
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Persistence for task records
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Inserts a new task
    async fn insert(&self, data: CreateTask) -> Result<Task, StoreError>;

    /// Finds a task by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, StoreError>;

    /// Tasks matching every present filter, newest first
    async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, StoreError>;

    /// Overwrites the mutable fields of an existing task
    ///
    /// Returns `None` if the task was deleted in the meantime.
    async fn save(&self, task: &Task) -> Result<Option<Task>, StoreError>;

    /// Deletes a task; false if it did not exist
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Per-status counts, restricted to tasks involving `subject` if given
    async fn stats(&self, subject: Option<Uuid>) -> Result<TaskStats, StoreError>;

    /// Connectivity check used by the health endpoint
    async fn ping(&self) -> Result<(), StoreError>;
}
