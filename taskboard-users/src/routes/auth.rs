/// Registration and login endpoints
///
/// # Endpoints
///
/// - `POST /api/users/register` - Create an identity and receive a token
/// - `POST /api/users/login` - Exchange credentials for a token

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use taskboard_shared::http::error::{ApiError, ApiResult, ValidJson};
use taskboard_shared::models::user::{PublicUser, Role};
use validator::Validate;

use crate::{app::AppState, service::Registration};

/// Register request
///
/// Missing fields deserialize as empty strings so that they fail validation
/// with a field-level message instead of a parse error.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Name is required (at most 100 characters)"))]
    pub name: String,

    /// Email address
    #[serde(default)]
    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,

    /// Password
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    /// Role (default: member)
    pub role: Option<Role>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Body of both register and login responses
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: PublicUser,
    pub token: String,
}

/// Register a new identity
///
/// ```text
/// POST /api/users/register
/// { "name": "Alice", "email": "alice@x.com", "password": "pw123" }
/// ```
///
/// # Errors
///
/// - `400 validation_error`: Missing name/password, malformed email
/// - `400 conflict`: Email already registered
pub async fn register(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::invalid_field("name", "Name is required"));
    }

    let (user, token) = state
        .identities
        .register(Registration {
            name: name.to_string(),
            email: req.email,
            password: req.password,
            role: req.role,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            user: user.into(),
            token,
        }),
    ))
}

/// Log in with email and password
///
/// # Errors
///
/// - `400 validation_error`: Missing email or password
/// - `401 unauthorized`: Unknown email or wrong password (same message)
pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let (user, token) = state
        .identities
        .authenticate(&req.email, &req.password)
        .await?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        user: user.into(),
        token,
    }))
}
