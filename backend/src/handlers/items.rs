//! HTTP handlers for inventory items and CSV upload

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    Json,
};
use shared::models::InventoryItem;
use shared::types::PaginatedResponse;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::csv_import::ImportSummary;
use crate::services::item::{CreateItemInput, ItemFilter, ItemListing};
use crate::services::{CsvImportService, ItemService};
use crate::AppState;

/// Multipart field carrying the CSV file
const UPLOAD_FIELD: &str = "data";

pub async fn create_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateItemInput>,
) -> AppResult<(StatusCode, Json<InventoryItem>)> {
    let service = ItemService::new(state.db);
    let item = service.create_item(&current_user.0, input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn list_items(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<ItemFilter>,
) -> AppResult<Json<PaginatedResponse<ItemListing>>> {
    let service = ItemService::new(state.db);
    let items = service.list_items(&filter).await?;
    Ok(Json(items))
}

/// Create items in bulk from the `data` field of a multipart upload
pub async fn upload_items_csv(
    State(state): State<AppState>,
    current_user: CurrentUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<ImportSummary>)> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::MalformedCsv(e.to_string()))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::MalformedCsv(e.to_string()))?;
            upload = Some(bytes);
            break;
        }
    }

    let bytes = upload.ok_or_else(|| AppError::MalformedCsv("missing 'data' file field".to_string()))?;

    let service = CsvImportService::new(state.db);
    let summary = service.import(&current_user.0, &bytes).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}
