/// Task operations
///
/// [`TaskService`] composes the [`TaskStore`] with an [`IdentityDirectory`].
/// Authentication already happened in the middleware; operations that
/// consult the directory take the caller's bearer token so the lookup runs
/// with the caller's authority.
///
/// # Assignee checks
///
/// An assignee is confirmed to exist when it is written, never afterwards:
///
/// - create: checked when `assignee_id` is present
/// - update: checked only when the patch sets an assignee different from
///   the stored one; clearing it or re-sending the same id is not checked
///
/// "Not found" and "identity service unreachable" are both reported as
/// [`TaskError::InvalidAssignee`]. The check and the write are separate
/// steps; an identity deleted in between leaves a dangling reference.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use taskboard_shared::http::error::ApiError;
use taskboard_shared::models::task::{
    CreateTask, Task, TaskFilter, TaskPatch, TaskPriority, TaskStats, TaskStatus,
};
use taskboard_shared::models::user::PublicUser;
use taskboard_shared::store::{StoreError, TaskStore};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::directory::IdentityDirectory;

/// Error type for task operations
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// Title missing or blank
    #[error("Title is required")]
    MissingTitle,

    /// Assignee could not be confirmed to exist
    #[error("Assignee not found")]
    InvalidAssignee(Uuid),

    /// No task with the requested ID
    #[error("Task not found")]
    NotFound,

    /// The identity a per-user view was requested for could not be confirmed
    #[error("User not found")]
    UserNotFound(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::MissingTitle => ApiError::invalid_field("title", err.to_string()),
            TaskError::InvalidAssignee(_) => ApiError::InvalidAssignee(err.to_string()),
            TaskError::NotFound | TaskError::UserNotFound(_) => ApiError::NotFound(err.to_string()),
            TaskError::Store(e) => e.into(),
        }
    }
}

/// Input for [`TaskService::create`]; the creator comes from the token
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
}

/// A task with its assignee resolved for display
///
/// `assignee` is null when the task is unassigned, the reference dangles,
/// or the identity service could not be reached.
#[derive(Debug, Clone, Serialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub assignee: Option<PublicUser>,
}

/// Task service
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
    directory: Arc<dyn IdentityDirectory>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>, directory: Arc<dyn IdentityDirectory>) -> Self {
        Self { store, directory }
    }

    /// Store connectivity, for the health endpoint
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }

    /// Resolves an identity, folding every failure into `None`
    async fn resolve(&self, id: Uuid, bearer: &str) -> Option<PublicUser> {
        match self.directory.lookup(id, bearer).await {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                debug!(user_id = %id, "Identity does not exist");
                None
            }
            Err(e) => {
                warn!(user_id = %id, error = %e, "Identity lookup failed");
                None
            }
        }
    }

    async fn confirm_assignee(&self, id: Uuid, bearer: &str) -> Result<(), TaskError> {
        match self.resolve(id, bearer).await {
            Some(_) => Ok(()),
            None => Err(TaskError::InvalidAssignee(id)),
        }
    }

    /// Creates a task owned by `created_by`
    ///
    /// # Errors
    ///
    /// - `MissingTitle` when the title is absent or blank
    /// - `InvalidAssignee` when the assignee cannot be confirmed
    pub async fn create(
        &self,
        created_by: Uuid,
        bearer: &str,
        input: NewTask,
    ) -> Result<Task, TaskError> {
        let title = input
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(TaskError::MissingTitle)?
            .to_string();

        if let Some(assignee_id) = input.assignee_id {
            self.confirm_assignee(assignee_id, bearer).await?;
        }

        let task = self
            .store
            .insert(CreateTask {
                title,
                description: input.description,
                status: input.status.unwrap_or_default(),
                priority: input.priority.unwrap_or_default(),
                assignee_id: input.assignee_id,
                created_by,
                due_date: input.due_date,
            })
            .await?;

        info!(task_id = %task.id, created_by = %created_by, "Created task");
        Ok(task)
    }

    /// One task, with its assignee looked up for display
    pub async fn get(&self, id: Uuid, bearer: &str) -> Result<TaskDetail, TaskError> {
        let task = self.store.find_by_id(id).await?.ok_or(TaskError::NotFound)?;

        let assignee = match task.assignee_id {
            Some(assignee_id) => self.resolve(assignee_id, bearer).await,
            None => None,
        };

        Ok(TaskDetail { task, assignee })
    }

    /// Tasks matching every present filter, newest first
    pub async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, TaskError> {
        Ok(self.store.list(filter).await?)
    }

    /// Tasks assigned to the caller
    pub async fn assigned_to_caller(&self, caller: Uuid) -> Result<Vec<Task>, TaskError> {
        self.list(&TaskFilter::assigned_to(caller)).await
    }

    /// Tasks assigned to another identity, which must exist
    pub async fn assigned_to_user(&self, user_id: Uuid, bearer: &str) -> Result<Vec<Task>, TaskError> {
        if self.resolve(user_id, bearer).await.is_none() {
            return Err(TaskError::UserNotFound(user_id));
        }
        self.list(&TaskFilter::assigned_to(user_id)).await
    }

    /// Applies a partial update
    ///
    /// # Errors
    ///
    /// - `NotFound` when the task does not exist (or vanished before the write)
    /// - `MissingTitle` when the patch sets a blank title
    /// - `InvalidAssignee` when a newly set assignee cannot be confirmed
    pub async fn update(&self, id: Uuid, bearer: &str, mut patch: TaskPatch) -> Result<Task, TaskError> {
        let mut task = self.store.find_by_id(id).await?.ok_or(TaskError::NotFound)?;

        if let Some(title) = patch.title.take() {
            let title = title.trim();
            if title.is_empty() {
                return Err(TaskError::MissingTitle);
            }
            patch.title = Some(title.to_string());
        }

        if let Some(&assignee_id) = patch.assignee_id.as_set() {
            if task.assignee_id != Some(assignee_id) {
                self.confirm_assignee(assignee_id, bearer).await?;
            }
        }

        task.apply(patch);
        let task = self.store.save(&task).await?.ok_or(TaskError::NotFound)?;

        info!(task_id = %task.id, status = %task.status, "Updated task");
        Ok(task)
    }

    /// Deletes a task; no ownership check
    pub async fn delete(&self, id: Uuid) -> Result<(), TaskError> {
        if !self.store.delete(id).await? {
            return Err(TaskError::NotFound);
        }

        info!(task_id = %id, "Deleted task");
        Ok(())
    }

    /// Per-status counts; with a subject, tasks it is assigned to or created
    pub async fn stats(&self, subject: Option<Uuid>) -> Result<TaskStats, TaskError> {
        Ok(self.store.stats(subject).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::StaticDirectory;
    use chrono::Utc;
    use taskboard_shared::models::task::Patch;
    use taskboard_shared::models::user::Role;
    use taskboard_shared::store::memory::MemoryTaskStore;

    struct Fixture {
        service: TaskService,
        directory: Arc<StaticDirectory>,
        alice: Uuid,
    }

    fn fixture() -> Fixture {
        let directory = Arc::new(StaticDirectory::new());
        let alice = Uuid::new_v4();
        let now = Utc::now();
        directory.insert(PublicUser {
            id: alice,
            name: "Alice".to_string(),
            email: "alice@x.com".to_string(),
            role: Role::Member,
            created_at: now,
            updated_at: now,
        });

        Fixture {
            service: TaskService::new(Arc::new(MemoryTaskStore::new()), directory.clone()),
            directory,
            alice,
        }
    }

    fn titled(title: &str) -> NewTask {
        NewTask {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_defaults_and_assignee() {
        let f = fixture();

        let task = f
            .service
            .create(
                f.alice,
                "t",
                NewTask {
                    assignee_id: Some(f.alice),
                    ..titled("  A  ")
                },
            )
            .await
            .unwrap();

        assert_eq!(task.title, "A");
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.assignee_id, Some(f.alice));
        assert_eq!(task.created_by, f.alice);
        assert_eq!(f.directory.lookups(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_title_without_lookup() {
        let f = fixture();

        for title in [None, Some(""), Some("   ")] {
            let err = f
                .service
                .create(
                    f.alice,
                    "t",
                    NewTask {
                        title: title.map(str::to_string),
                        assignee_id: Some(f.alice),
                        ..Default::default()
                    },
                )
                .await
                .unwrap_err();
            assert!(matches!(err, TaskError::MissingTitle));
        }
        assert_eq!(f.directory.lookups(), 0);
    }

    #[tokio::test]
    async fn test_create_invalid_assignee() {
        let f = fixture();
        let ghost = Uuid::new_v4();

        let err = f
            .service
            .create(
                f.alice,
                "t",
                NewTask {
                    assignee_id: Some(ghost),
                    ..titled("A")
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::InvalidAssignee(id) if id == ghost));

        // Unreachable directory is indistinguishable from a missing identity
        f.directory.set_unreachable(true);
        let err = f
            .service
            .create(
                f.alice,
                "t",
                NewTask {
                    assignee_id: Some(f.alice),
                    ..titled("A")
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::InvalidAssignee(_)));

        assert!(f.service.list(&TaskFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_status_only_skips_lookup() {
        let f = fixture();
        let task = f
            .service
            .create(
                f.alice,
                "t",
                NewTask {
                    assignee_id: Some(f.alice),
                    ..titled("A")
                },
            )
            .await
            .unwrap();
        let before = f.directory.lookups();

        let updated = f
            .service
            .update(
                task.id,
                "t",
                TaskPatch {
                    status: Some(TaskStatus::Done),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, TaskStatus::Done);

        // Same assignee again, then clearing it: neither is checked
        f.service
            .update(
                task.id,
                "t",
                TaskPatch {
                    assignee_id: Patch::Set(f.alice),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let cleared = f
            .service
            .update(
                task.id,
                "t",
                TaskPatch {
                    assignee_id: Patch::Clear,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.assignee_id, None);
        assert_eq!(f.directory.lookups(), before);
    }

    #[tokio::test]
    async fn test_update_new_assignee_is_checked() {
        let f = fixture();
        let task = f.service.create(f.alice, "t", titled("A")).await.unwrap();

        let err = f
            .service
            .update(
                task.id,
                "t",
                TaskPatch {
                    assignee_id: Patch::Set(Uuid::new_v4()),
                    status: Some(TaskStatus::Review),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::InvalidAssignee(_)));

        // Rejected patch leaves the task untouched
        let stored = f.service.get(task.id, "t").await.unwrap().task;
        assert_eq!(stored.status, TaskStatus::Todo);
        assert_eq!(f.directory.lookups(), 1);
    }

    #[tokio::test]
    async fn test_update_blank_title_and_missing_task() {
        let f = fixture();
        let task = f.service.create(f.alice, "t", titled("A")).await.unwrap();

        let err = f
            .service
            .update(
                task.id,
                "t",
                TaskPatch {
                    title: Some(" ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::MissingTitle));

        let err = f
            .service
            .update(Uuid::new_v4(), "t", TaskPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::NotFound));
    }

    #[tokio::test]
    async fn test_get_tolerates_dangling_assignee() {
        let f = fixture();
        let task = f
            .service
            .create(
                f.alice,
                "t",
                NewTask {
                    assignee_id: Some(f.alice),
                    ..titled("A")
                },
            )
            .await
            .unwrap();

        let detail = f.service.get(task.id, "t").await.unwrap();
        assert_eq!(detail.assignee.map(|a| a.name), Some("Alice".to_string()));

        f.directory.remove(f.alice);
        let detail = f.service.get(task.id, "t").await.unwrap();
        assert!(detail.assignee.is_none());
        assert_eq!(detail.task.assignee_id, Some(f.alice));
    }

    #[tokio::test]
    async fn test_assigned_to_user_requires_existing_identity() {
        let f = fixture();
        f.service
            .create(
                f.alice,
                "t",
                NewTask {
                    assignee_id: Some(f.alice),
                    ..titled("A")
                },
            )
            .await
            .unwrap();

        assert_eq!(f.service.assigned_to_user(f.alice, "t").await.unwrap().len(), 1);
        assert!(matches!(
            f.service.assigned_to_user(Uuid::new_v4(), "t").await,
            Err(TaskError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let f = fixture();
        let task = f.service.create(f.alice, "t", titled("A")).await.unwrap();

        f.service.delete(task.id).await.unwrap();
        assert!(matches!(f.service.delete(task.id).await, Err(TaskError::NotFound)));
        assert!(matches!(
            f.service.delete(Uuid::new_v4()).await,
            Err(TaskError::NotFound)
        ));
    }

    #[test]
    fn test_error_mapping() {
        use axum::http::StatusCode;

        let api = ApiError::from(TaskError::InvalidAssignee(Uuid::new_v4()));
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
        assert_eq!(api.code(), "invalid_assignee");

        let api = ApiError::from(TaskError::MissingTitle);
        assert_eq!(api.code(), "validation_error");

        let api = ApiError::from(TaskError::UserNotFound(Uuid::new_v4()));
        assert_eq!(api.status(), StatusCode::NOT_FOUND);
    }
}
