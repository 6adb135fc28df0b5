use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde_json::{Map, Value};

use crate::{
    domain::permissions::RolePermissions,
    error::AppResult,
    middleware::auth::AuthUser,
    response::{Ack, ApiResponse},
    services::settings_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/get_permissions", get(get_permissions))
        .route("/update_permissions", post(update_permissions))
        .route("/get_store_settings", get(get_store_settings))
        .route("/update_store_settings", post(update_store_settings))
}

#[utoipa::path(
    get,
    path = "/api/get_permissions",
    responses(
        (status = 200, description = "Role to page access table", body = ApiResponse<RolePermissions>)
    ),
    tag = "Settings"
)]
pub async fn get_permissions(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<RolePermissions>>> {
    Ok(Json(settings_service::get_permissions(&state, &user).await?))
}

#[utoipa::path(
    post,
    path = "/api/update_permissions",
    request_body = RolePermissions,
    responses(
        (status = 200, description = "Table replaced", body = ApiResponse<Ack>)
    ),
    tag = "Settings"
)]
pub async fn update_permissions(
    State(state): State<AppState>,
    user: AuthUser,
    Json(permissions): Json<RolePermissions>,
) -> AppResult<Json<ApiResponse<Ack>>> {
    Ok(Json(
        settings_service::update_permissions(&state, &user, permissions).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/get_store_settings",
    responses(
        (status = 200, description = "Store settings object")
    ),
    tag = "Settings"
)]
pub async fn get_store_settings(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Map<String, Value>>>> {
    Ok(Json(settings_service::get_store_settings(&state, &user).await?))
}

#[utoipa::path(
    post,
    path = "/api/update_store_settings",
    responses(
        (status = 200, description = "Merged store settings")
    ),
    tag = "Settings"
)]
pub async fn update_store_settings(
    State(state): State<AppState>,
    user: AuthUser,
    Json(patch): Json<Value>,
) -> AppResult<Json<ApiResponse<Map<String, Value>>>> {
    Ok(Json(
        settings_service::update_store_settings(&state, &user, patch).await?,
    ))
}
