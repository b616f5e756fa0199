/// Identity operations
///
/// [`IdentityService`] composes the [`UserStore`] with password hashing and
/// the token issuer. Handlers stay thin: they validate the request shape and
/// translate [`IdentityError`] into HTTP responses.
///
/// # Credentials
///
/// Passwords are hashed with Argon2id before they reach the store. Neither
/// the plaintext nor the hash is ever logged or returned; callers only see
/// [`PublicUser`](taskboard_shared::models::user::PublicUser) projections.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use taskboard_shared::auth::jwt::{SigningKey, TokenKeys};
/// use taskboard_shared::store::memory::MemoryUserStore;
/// use taskboard_users::service::{IdentityService, Registration};
///
/// # async fn example() -> Result<(), taskboard_users::service::IdentityError> {
/// let keys = Arc::new(TokenKeys::new(SigningKey::new("v1", "a-shared-secret-of-at-least-32-bytes")));
/// let identities = IdentityService::new(Arc::new(MemoryUserStore::new()), keys);
///
/// let (user, _token) = identities
///     .register(Registration::new("Alice", "alice@x.com", "pw123"))
///     .await?;
/// let (same, _token) = identities.authenticate("alice@x.com", "pw123").await?;
/// assert_eq!(user.id, same.id);
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use taskboard_shared::auth::{
    jwt::{JwtError, TokenKeys},
    password::{hash_password, verify_dummy, verify_password, PasswordError},
};
use taskboard_shared::http::error::ApiError;
use taskboard_shared::models::user::{CreateUser, Role, UpdateUser, User};
use taskboard_shared::store::{StoreError, UserStore};
use tracing::{info, warn};
use uuid::Uuid;

/// Error type for identity operations
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// Email already held by another identity
    #[error("Email already registered")]
    DuplicateEmail,

    /// Unknown email or wrong password; the two are not distinguished
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No identity with the requested ID
    #[error("User not found")]
    NotFound,

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] JwtError),
}

impl From<StoreError> for IdentityError {
    fn from(err: StoreError) -> Self {
        match err {
            // Only the email column is unique besides the primary key
            StoreError::UniqueViolation(_) => IdentityError::DuplicateEmail,
            other => IdentityError::Store(other),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::DuplicateEmail => ApiError::Conflict(err.to_string()),
            IdentityError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            IdentityError::NotFound => ApiError::NotFound(err.to_string()),
            IdentityError::Store(e) => e.into(),
            IdentityError::Password(e) => e.into(),
            IdentityError::Token(e) => e.into(),
        }
    }
}

/// Input for [`IdentityService::register`]
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

impl Registration {
    /// A member registration
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            role: None,
        }
    }
}

/// Identity service: register, authenticate, lookup and profile management
#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn UserStore>,
    keys: Arc<TokenKeys>,
}

impl IdentityService {
    pub fn new(store: Arc<dyn UserStore>, keys: Arc<TokenKeys>) -> Self {
        Self { store, keys }
    }

    /// Store connectivity, for the health endpoint
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }

    /// Creates an identity and issues its first token
    ///
    /// # Errors
    ///
    /// `DuplicateEmail` if the email is present, including when a concurrent
    /// registration wins the race and the store's unique constraint fires.
    pub async fn register(&self, input: Registration) -> Result<(User, String), IdentityError> {
        if self.store.find_by_email(&input.email).await?.is_some() {
            return Err(IdentityError::DuplicateEmail);
        }

        let password_hash = hash_password(&input.password)?;

        let user = self
            .store
            .insert(CreateUser {
                name: input.name,
                email: input.email,
                password_hash,
                role: input.role.unwrap_or_default(),
            })
            .await?;

        let token = self.keys.issue(user.id, &user.email, user.role)?;

        info!(user_id = %user.id, role = %user.role, "Registered identity");
        Ok((user, token))
    }

    /// Verifies credentials and issues a token
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` for an unknown email and for a wrong password.
    /// The unknown-email path still runs one Argon2 verification so both
    /// failures take comparable time.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(User, String), IdentityError> {
        let Some(user) = self.store.find_by_email(email).await? else {
            verify_dummy(password);
            warn!("Login failed");
            return Err(IdentityError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "Login failed");
            return Err(IdentityError::InvalidCredentials);
        }

        let token = self.keys.issue(user.id, &user.email, user.role)?;

        info!(user_id = %user.id, "Login successful");
        Ok((user, token))
    }

    /// Finds one identity by ID
    pub async fn lookup(&self, id: Uuid) -> Result<User, IdentityError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(IdentityError::NotFound)
    }

    /// The identity behind a verified token
    ///
    /// `NotFound` when the identity was deleted after the token was issued.
    pub async fn current(&self, subject: Uuid) -> Result<User, IdentityError> {
        self.lookup(subject).await
    }

    /// Every identity, oldest first
    pub async fn list(&self) -> Result<Vec<User>, IdentityError> {
        Ok(self.store.list().await?)
    }

    /// Applies a profile update; absent fields keep their values
    pub async fn update(&self, id: Uuid, update: UpdateUser) -> Result<User, IdentityError> {
        if let Some(email) = &update.email {
            if let Some(holder) = self.store.find_by_email(email).await? {
                if holder.id != id {
                    return Err(IdentityError::DuplicateEmail);
                }
            }
        }

        let user = self
            .store
            .update(id, update)
            .await?
            .ok_or(IdentityError::NotFound)?;

        info!(user_id = %user.id, "Updated identity");
        Ok(user)
    }

    /// Deletes an identity
    ///
    /// Tasks that reference it are not touched and keep a dangling reference.
    pub async fn delete(&self, id: Uuid) -> Result<(), IdentityError> {
        if !self.store.delete(id).await? {
            return Err(IdentityError::NotFound);
        }

        info!(user_id = %id, "Deleted identity");
        Ok(())
    }
}
