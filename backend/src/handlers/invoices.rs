//! HTTP handlers for the sales ledger

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use shared::types::PaginatedResponse;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::invoice::{CreateInvoiceInput, InvoiceDetail, InvoiceFilter, InvoiceListing};
use crate::services::InvoiceService;
use crate::AppState;

/// Record a sale
pub async fn create_invoice(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateInvoiceInput>,
) -> AppResult<(StatusCode, Json<InvoiceDetail>)> {
    let service = InvoiceService::new(state.db);
    let invoice = service.record_invoice(&current_user.0, input).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

pub async fn list_invoices(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<InvoiceFilter>,
) -> AppResult<Json<PaginatedResponse<InvoiceListing>>> {
    let service = InvoiceService::new(state.db);
    let invoices = service.list_invoices(&filter).await?;
    Ok(Json(invoices))
}
