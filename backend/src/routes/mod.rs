//! Route definitions for the SARA inventory API

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        .nest("/user", user_routes(state.clone()))
        .nest("/app", app_routes(state))
}

/// User control routes; login and first-password setup are public
fn user_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/create-user", post(handlers::create_user))
        .route("/me", get(handlers::me))
        .route("/users", get(handlers::list_users))
        .route("/activity-log", get(handlers::list_activity_log))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/login", post(handlers::login))
        .route("/password-update", post(handlers::update_password))
        .merge(protected)
}

/// Catalog, sales and reporting routes (protected)
fn app_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/group", get(handlers::list_groups).post(handlers::create_group))
        .route("/inventory", get(handlers::list_items).post(handlers::create_item))
        .route("/inventory-csv", post(handlers::upload_items_csv))
        .route("/shop", get(handlers::list_shops).post(handlers::create_shop))
        .route("/invoice", get(handlers::list_invoices).post(handlers::create_invoice))
        .route("/summary", get(handlers::get_summary))
        .route("/top-selling", get(handlers::get_top_selling))
        .route("/sales-by-shop", get(handlers::get_sales_by_shop))
        .route("/purchase-summary", get(handlers::get_purchase_summary))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
