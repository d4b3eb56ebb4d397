//! Authentication handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::AppResult;
use crate::services::auth::{LoginInput, LoginOutcome, UpdatePasswordInput};
use crate::services::AuthService;
use crate::AppState;

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: String,
}

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginInput>,
) -> AppResult<Json<LoginOutcome>> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let outcome = auth_service.login(body).await?;
    Ok(Json(outcome))
}

/// First-login password setup handler
pub async fn update_password(
    State(state): State<AppState>,
    Json(body): Json<UpdatePasswordInput>,
) -> AppResult<Json<MessageResponse>> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    auth_service.update_password(body).await?;
    Ok(Json(MessageResponse {
        success: "Password updated".to_string(),
    }))
}
