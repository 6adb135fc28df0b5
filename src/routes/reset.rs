use axum::{Json, Router, extract::State, routing::post};

use crate::{
    error::AppResult,
    middleware::auth::AuthUser,
    response::{Ack, ApiResponse},
    services::reset_service::{ResetScope, reset},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reset_data", post(reset_data))
        .route("/reset_all", post(reset_all))
        .route("/reset_super", post(reset_super))
}

#[utoipa::path(
    post,
    path = "/api/reset_data",
    responses((status = 200, description = "Orders, menu and signage cleared", body = ApiResponse<Ack>)),
    tag = "Reset"
)]
pub async fn reset_data(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Ack>>> {
    Ok(Json(reset(&state, &user, ResetScope::Data).await?))
}

#[utoipa::path(
    post,
    path = "/api/reset_all",
    responses((status = 200, description = "Data and every other account cleared", body = ApiResponse<Ack>)),
    tag = "Reset"
)]
pub async fn reset_all(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Ack>>> {
    Ok(Json(reset(&state, &user, ResetScope::AllButCaller).await?))
}

#[utoipa::path(
    post,
    path = "/api/reset_super",
    responses((status = 200, description = "Data and all accounts cleared", body = ApiResponse<Ack>)),
    tag = "Reset"
)]
pub async fn reset_super(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Ack>>> {
    Ok(Json(reset(&state, &user, ResetScope::Everything).await?))
}
