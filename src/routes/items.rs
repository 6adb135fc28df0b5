use axum::{
    Json, Router,
    extract::{Multipart, State},
    response::Response,
    routing::{get, post},
};

use crate::{
    dto::items::{ImportSummary, ItemList, UpdateItemRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::MenuItem,
    response::ApiResponse,
    routes::upload::{csv_attachment, read_csv_field},
    services::menu_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/get_items", get(get_items))
        .route("/update_item", post(update_item))
        .route("/upload_csv", post(upload_csv))
        .route("/download_template_csv", get(download_template_csv))
}

#[utoipa::path(
    get,
    path = "/api/get_items",
    responses(
        (status = 200, description = "All menu items", body = ApiResponse<ItemList>),
        (status = 403, description = "Admin only")
    ),
    tag = "Admin"
)]
pub async fn get_items(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ItemList>>> {
    Ok(Json(menu_service::list_items(&state, &user).await?))
}

#[utoipa::path(
    post,
    path = "/api/update_item",
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Item updated", body = ApiResponse<MenuItem>),
        (status = 400, description = "Unknown field or invalid value"),
        (status = 404, description = "Item not found")
    ),
    tag = "Admin"
)]
pub async fn update_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateItemRequest>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    Ok(Json(menu_service::update_item(&state, &user, payload).await?))
}

#[utoipa::path(
    post,
    path = "/api/upload_csv",
    request_body(content_type = "multipart/form-data", description = "Menu CSV in the `csv-file` field"),
    responses(
        (status = 200, description = "Menu replaced", body = ApiResponse<ImportSummary>),
        (status = 400, description = "Invalid file or rows")
    ),
    tag = "Admin"
)]
pub async fn upload_csv(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<ImportSummary>>> {
    let bytes = read_csv_field(multipart).await?;
    Ok(Json(menu_service::upload_csv(&state, &user, &bytes).await?))
}

#[utoipa::path(
    get,
    path = "/api/download_template_csv",
    responses(
        (status = 200, description = "Menu CSV header row", body = String, content_type = "text/csv")
    ),
    tag = "Admin"
)]
pub async fn download_template_csv(user: AuthUser) -> AppResult<Response> {
    let body = menu_service::template_download(&user)?;
    Ok(csv_attachment("menu_template.csv", body))
}
