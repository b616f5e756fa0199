/// Identity lookup and profile endpoints (bearer token required)
///
/// # Endpoints
///
/// - `GET /api/users/me` - The caller's identity
/// - `GET /api/users` - Every identity, oldest first
/// - `GET /api/users/:id` - One identity (used by the task service)
/// - `PUT /api/users/:id` - Update name, email or role
/// - `DELETE /api/users/:id` - Delete an identity
///
/// Any authenticated caller may update or delete any identity.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskboard_shared::auth::middleware::AuthContext;
use taskboard_shared::http::error::{parse_id, ApiError, ApiResult, ValidJson};
use taskboard_shared::models::user::{PublicUser, Role, UpdateUser};
use validator::Validate;

use crate::app::AppState;

const USER_NOT_FOUND: &str = "User not found";

/// Profile update request; absent fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: Option<String>,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: Option<String>,

    pub role: Option<Role>,
}

/// Profile update response
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateUserResponse {
    pub message: String,
    pub user: PublicUser,
}

/// Acknowledgement body
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn current_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<PublicUser>> {
    let user = state.identities.current(auth.user_id).await?;
    Ok(Json(user.into()))
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<PublicUser>>> {
    let users = state.identities.list().await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PublicUser>> {
    let id = parse_id(&id, USER_NOT_FOUND)?;
    let user = state.identities.lookup(id).await?;
    Ok(Json(user.into()))
}

/// # Errors
///
/// - `400 validation_error`: Empty name, malformed email, nothing to update
/// - `400 conflict`: Email held by another identity
/// - `404 not_found`: No such identity
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<UpdateUserRequest>,
) -> ApiResult<Json<UpdateUserResponse>> {
    let id = parse_id(&id, USER_NOT_FOUND)?;

    let update = UpdateUser {
        name: req.name.map(|n| n.trim().to_string()),
        email: req.email,
        role: req.role,
    };
    if update.is_empty() {
        return Err(ApiError::BadRequest(
            "At least one of name, email or role is required".to_string(),
        ));
    }
    if update.name.as_deref() == Some("") {
        return Err(ApiError::invalid_field("name", "Name must not be blank"));
    }

    tracing::debug!(target_id = %id, caller = %auth.user_id, "Updating identity");
    let user = state.identities.update(id, update).await?;

    Ok(Json(UpdateUserResponse {
        message: "User updated successfully".to_string(),
        user: user.into(),
    }))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&id, USER_NOT_FOUND)?;

    tracing::debug!(target_id = %id, caller = %auth.user_id, "Deleting identity");
    state.identities.delete(id).await?;

    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}
