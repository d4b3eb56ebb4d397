//! HTTP handlers for inventory groups

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use shared::models::InventoryGroup;
use shared::types::PaginatedResponse;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::group::{CreateGroupInput, GroupFilter, GroupListing};
use crate::services::GroupService;
use crate::AppState;

pub async fn create_group(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateGroupInput>,
) -> AppResult<(StatusCode, Json<InventoryGroup>)> {
    let service = GroupService::new(state.db);
    let group = service.create_group(&current_user.0, input).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn list_groups(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<GroupFilter>,
) -> AppResult<Json<PaginatedResponse<GroupListing>>> {
    let service = GroupService::new(state.db);
    let groups = service.list_groups(&filter).await?;
    Ok(Json(groups))
}
