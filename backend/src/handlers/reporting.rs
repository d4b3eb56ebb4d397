//! HTTP handlers for reporting endpoints

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use shared::models::{InventorySummaryCounts, PurchaseSummary};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::reporting::ReportFilter;
use crate::services::ReportingService;
use crate::AppState;

#[derive(Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>, // "json" or "csv"
}

/// Get dashboard summary counts
pub async fn get_summary(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<InventorySummaryCounts>> {
    let service = ReportingService::new(state.db);
    let summary = service.get_summary().await?;
    Ok(Json(summary))
}

/// Get top selling items
pub async fn get_top_selling(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<ReportFilter>,
    Query(export): Query<ExportQuery>,
) -> AppResult<Response> {
    let service = ReportingService::new(state.db);
    let data = service.get_top_sellers(filter.range()?).await?;
    respond(&data, export.format.as_deref(), "top_selling.csv")
}

/// Get sales totals per shop
pub async fn get_sales_by_shop(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<ReportFilter>,
    Query(export): Query<ExportQuery>,
) -> AppResult<Response> {
    let service = ReportingService::new(state.db);
    let data = service.get_sales_by_shop(filter.range()?, filter.monthly).await?;
    respond(&data, export.format.as_deref(), "sales_by_shop.csv")
}

/// Get purchase totals
pub async fn get_purchase_summary(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<ReportFilter>,
) -> AppResult<Json<PurchaseSummary>> {
    let service = ReportingService::new(state.db);
    let summary = service.get_purchase_summary(filter.range()?).await?;
    Ok(Json(summary))
}

fn respond<T: Serialize>(data: &[T], format: Option<&str>, filename: &str) -> AppResult<Response> {
    if format == Some("csv") {
        let csv = ReportingService::export_to_csv(data)?;
        let disposition = format!("attachment; filename=\"{}\"", filename);
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            csv,
        )
            .into_response())
    } else {
        Ok(Json(data).into_response())
    }
}
