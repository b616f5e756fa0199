/// Identity lookups against the identity service
///
/// The task store cannot check that a referenced identity exists: identities
/// live in another service's database. Before a task is allowed to reference
/// one, the task service asks the identity service over HTTP, forwarding the
/// caller's own bearer token:
///
/// ```text
/// GET {USER_SERVICE_URL}/api/users/:id
/// Authorization: Bearer <caller's token>
/// ```
///
/// [`IdentityDirectory::lookup`] distinguishes "does not exist" (`Ok(None)`)
/// from "could not ask" (`Err`). The task service collapses both into the
/// same rejection; keeping them apart here is only for logging.
///
/// # Implementations
///
/// - [`HttpIdentityDirectory`]: `reqwest` client with a request timeout
/// - [`StaticDirectory`]: in-process map with a lookup counter, for tests
///   and for running the task service without an identity service

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use taskboard_shared::models::user::PublicUser;
use uuid::Uuid;

/// Reasons a lookup produced no answer
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// Connection failure or timeout
    #[error("Identity service unreachable: {0}")]
    Unreachable(String),

    /// Any non-success status other than 404
    #[error("Identity service answered HTTP {0}")]
    Status(u16),

    /// 2xx with a body that is not an identity
    #[error("Identity service returned an invalid body: {0}")]
    InvalidResponse(String),

    /// Client could not be constructed
    #[error("Identity client setup failed: {0}")]
    Client(String),
}

/// Source of truth for "does this identity exist"
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Looks up an identity on behalf of the caller holding `bearer`
    ///
    /// `Ok(None)` when the identity service says it does not exist.
    async fn lookup(&self, id: Uuid, bearer: &str) -> Result<Option<PublicUser>, DirectoryError>;
}

/// Directory backed by the identity service's HTTP API
#[derive(Debug, Clone)]
pub struct HttpIdentityDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityDirectory {
    /// Creates a directory for `base_url` (e.g. `http://localhost:3001`)
    ///
    /// `timeout` bounds each lookup end to end; a hung identity service
    /// stalls a task write for at most this long.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DirectoryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DirectoryError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn user_url(&self, id: Uuid) -> String {
        format!("{}/api/users/{}", self.base_url, id)
    }
}

#[async_trait]
impl IdentityDirectory for HttpIdentityDirectory {
    async fn lookup(&self, id: Uuid, bearer: &str) -> Result<Option<PublicUser>, DirectoryError> {
        let response = self
            .client
            .get(self.user_url(id))
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| DirectoryError::Unreachable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => response
                .json::<PublicUser>()
                .await
                .map(Some)
                .map_err(|e| DirectoryError::InvalidResponse(e.to_string())),
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(DirectoryError::Status(status.as_u16())),
        }
    }
}

/// In-process directory
///
/// Counts every lookup so tests can assert when the task service did or did
/// not consult the directory.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    identities: RwLock<HashMap<Uuid, PublicUser>>,
    unreachable: AtomicBool,
    lookups: AtomicUsize,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an identity
    pub fn insert(&self, user: PublicUser) {
        if let Ok(mut identities) = self.identities.write() {
            identities.insert(user.id, user);
        }
    }

    /// Removes an identity, leaving any task references dangling
    pub fn remove(&self, id: Uuid) {
        if let Ok(mut identities) = self.identities.write() {
            identities.remove(&id);
        }
    }

    /// Makes every subsequent lookup fail as if the service were down
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Number of lookups performed so far
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityDirectory for StaticDirectory {
    async fn lookup(&self, id: Uuid, _bearer: &str) -> Result<Option<PublicUser>, DirectoryError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        if self.unreachable.load(Ordering::SeqCst) {
            return Err(DirectoryError::Unreachable("connection refused".to_string()));
        }

        self.identities
            .read()
            .map(|identities| identities.get(&id).cloned())
            .map_err(|_| DirectoryError::Unreachable("directory lock poisoned".to_string()))
    }
}
