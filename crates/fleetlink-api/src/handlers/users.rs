//! User account handlers.
//!
//! Login and password flows are out of scope; these endpoints maintain
//! the records machine ownership and per-user counts hang off.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::json;

use fleetlink_core::model::User;

use super::ServerState;
use crate::models::{ErrorResponse, HandlerResult, ok};

/// List all users.
///
/// GET /api/users
pub async fn list_users_handler(
    State(state): State<ServerState>,
) -> HandlerResult<Vec<User>> {
    let users = state.users.list()?;
    Ok(Json(users))
}

/// New user payload.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
}

/// Create a user.
///
/// POST /api/users
pub async fn create_user_handler(
    State(state): State<ServerState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ErrorResponse> {
    if req.username.is_empty() {
        return Err(ErrorResponse::bad_request("username is required"));
    }

    let user = User::new(req.name, req.username, req.email);
    state.users.save(&user)?;

    tracing::info!(user_id = %user.id, "user added");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User added successfully",
            "user": user,
        })),
    ))
}

/// Delete a user.
///
/// DELETE /api/users/:id
pub async fn delete_user_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> HandlerResult<serde_json::Value> {
    state.users.delete(&id)?;
    ok(json!({ "message": "User deleted successfully" }))
}
