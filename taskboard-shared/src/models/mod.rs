/// Database models for Taskboard
///
/// # Models
///
/// - `user`: Identity records owned by the identity service
/// - `task`: Task records owned by the task service
///
/// The two tables never live in the same database. A task's `assignee_id`
/// and `created_by` are plain UUID columns without a foreign key; existence
/// is checked over HTTP at write time only.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::user::{User, CreateUser, Role};
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// User::initialize(&pool).await?;
///
/// let user = User::create(&pool, CreateUser {
///     name: "Alice".to_string(),
///     email: "alice@x.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: Role::Member,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod task;
pub mod user;

/// Error for text values that name no variant of a model enum
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} value: {value:?}")]
pub struct ParseEnumError {
    /// Which enum was being parsed ("status", "priority", "role")
    pub kind: &'static str,

    /// The rejected text
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}
