/// Bearer token authentication for Axum
///
/// Both services protect their route groups with [`jwt_auth`], installed via
/// `axum::middleware::from_fn_with_state` with the service's [`TokenKeys`].
/// The middleware verifies the token locally and inserts an [`AuthContext`]
/// into the request extensions.
///
/// # Request Extensions
///
/// After successful authentication handlers can take
/// `Extension<AuthContext>`. The context keeps the raw token so the task
/// service can forward it on cross-service lookups.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use axum::{middleware, routing::get, Extension, Router};
/// use taskboard_shared::auth::jwt::{SigningKey, TokenKeys};
/// use taskboard_shared::auth::middleware::{jwt_auth, AuthContext};
///
/// async fn whoami(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}!", auth.email)
/// }
///
/// let keys = Arc::new(TokenKeys::new(SigningKey::new("v1", "a-shared-secret-of-at-least-32-bytes")));
/// let app: Router = Router::new()
///     .route("/me", get(whoami))
///     .layer(middleware::from_fn_with_state(keys, jwt_auth));
/// ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use super::jwt::{TokenKeys, VerificationError};
use crate::http::error::ApiError;
use crate::models::user::Role;

/// Authentication context added to request extensions
///
/// Deliberately not `Serialize`: it carries the caller's bearer token.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Authenticated identity ID (token subject)
    pub user_id: Uuid,

    /// Email at the time the token was issued
    pub email: String,

    /// Role at the time the token was issued
    pub role: Role,

    /// The verified bearer token, forwarded on cross-service calls
    pub token: String,
}

/// Reasons a request fails authentication
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header
    #[error("Access token required")]
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    #[error("Authorization header must use the Bearer scheme")]
    InvalidFormat,

    /// Token failed verification
    #[error("Invalid or expired token")]
    InvalidToken(#[from] VerificationError),
}

/// Extracts and verifies the bearer token from request headers
pub fn authenticate(headers: &HeaderMap, keys: &TokenKeys) -> Result<AuthContext, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidFormat)?;

    let identity = keys.verify(token)?;

    Ok(AuthContext {
        user_id: identity.id,
        email: identity.email,
        role: identity.role,
        token: token.to_string(),
    })
}

/// JWT authentication middleware
///
/// # Errors
///
/// Responds 401 Unauthorized if the header is missing, is not a Bearer
/// credential, or the token fails verification (bad signature, unknown key
/// id, expired, malformed).
pub async fn jwt_auth(
    State(keys): State<Arc<TokenKeys>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate(req.headers(), &keys).map_err(|e| {
        tracing::debug!(error = %e, path = %req.uri().path(), "Rejected request authentication");
        ApiError::from(e)
    })?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
