//! HTTP handlers for shops

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use shared::models::Shop;
use shared::types::PaginatedResponse;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::shop::{CreateShopInput, ShopFilter, ShopListing};
use crate::services::ShopService;
use crate::AppState;

pub async fn create_shop(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateShopInput>,
) -> AppResult<(StatusCode, Json<Shop>)> {
    let service = ShopService::new(state.db);
    let shop = service.create_shop(&current_user.0, input).await?;
    Ok((StatusCode::CREATED, Json(shop)))
}

pub async fn list_shops(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<ShopFilter>,
) -> AppResult<Json<PaginatedResponse<ShopListing>>> {
    let service = ShopService::new(state.db);
    let shops = service.list_shops(&filter).await?;
    Ok(Json(shops))
}
