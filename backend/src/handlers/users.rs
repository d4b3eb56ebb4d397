//! User control handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use shared::models::{User, UserActivity};
use shared::types::PaginatedResponse;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::audit::ActivityFilter;
use crate::services::user::CreateUserInput;
use crate::services::{AuditLog, UserService};
use crate::AppState;

/// Create a user who will set a password on first login
pub async fn create_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateUserInput>,
) -> AppResult<(StatusCode, Json<User>)> {
    let service = UserService::new(state.db);
    let user = service.create_user(&current_user.0, input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// The authenticated caller
pub async fn me(current_user: CurrentUser) -> Json<User> {
    Json(current_user.0)
}

/// All non-superuser accounts
pub async fn list_users(State(state): State<AppState>, _current_user: CurrentUser) -> AppResult<Json<Vec<User>>> {
    let service = UserService::new(state.db);
    let users = service.list_users().await?;
    Ok(Json(users))
}

/// Paginated audit trail
pub async fn list_activity_log(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<ActivityFilter>,
) -> AppResult<Json<PaginatedResponse<UserActivity>>> {
    let audit = AuditLog::new(state.db);
    let entries = audit.list(&filter).await?;
    Ok(Json(entries))
}
