use axum::{
    Json, Router,
    extract::{Multipart, State},
    response::Response,
    routing::{get, post},
};

use crate::{
    dto::{
        items::ImportSummary,
        signage::{SignageFeed, SignageList, UpdateSignageRequest},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::SignageItem,
    response::ApiResponse,
    routes::upload::{csv_attachment, read_csv_field},
    services::signage_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/get_signage_items", get(get_signage_items))
        .route("/get_signage_list", get(get_signage_list))
        .route("/update_signage_item", post(update_signage_item))
        .route("/upload_signage_csv", post(upload_signage_csv))
        .route(
            "/download_signage_template_csv",
            get(download_signage_template_csv),
        )
}

#[utoipa::path(
    get,
    path = "/api/get_signage_items",
    responses(
        (status = 200, description = "Slides in play order with fade settings", body = ApiResponse<SignageFeed>)
    ),
    tag = "Signage"
)]
pub async fn get_signage_items(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<SignageFeed>>> {
    Ok(Json(signage_service::signage_feed(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/get_signage_list",
    responses(
        (status = 200, description = "Slides for the admin grid", body = ApiResponse<SignageList>)
    ),
    tag = "Signage"
)]
pub async fn get_signage_list(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<SignageList>>> {
    Ok(Json(signage_service::signage_list(&state, &user).await?))
}

#[utoipa::path(
    post,
    path = "/api/update_signage_item",
    request_body = UpdateSignageRequest,
    responses(
        (status = 200, description = "Slide updated", body = ApiResponse<SignageItem>),
        (status = 400, description = "Unknown field or invalid value"),
        (status = 404, description = "Slide not found")
    ),
    tag = "Signage"
)]
pub async fn update_signage_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateSignageRequest>,
) -> AppResult<Json<ApiResponse<SignageItem>>> {
    Ok(Json(
        signage_service::update_signage_item(&state, &user, payload).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/upload_signage_csv",
    request_body(content_type = "multipart/form-data", description = "Signage CSV in the `csv-file` field"),
    responses(
        (status = 200, description = "Playlist replaced", body = ApiResponse<ImportSummary>),
        (status = 400, description = "Invalid file or rows")
    ),
    tag = "Signage"
)]
pub async fn upload_signage_csv(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<ImportSummary>>> {
    let bytes = read_csv_field(multipart).await?;
    Ok(Json(
        signage_service::upload_signage_csv(&state, &user, &bytes).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/download_signage_template_csv",
    responses(
        (status = 200, description = "Signage CSV header row", body = String, content_type = "text/csv")
    ),
    tag = "Signage"
)]
pub async fn download_signage_template_csv(user: AuthUser) -> AppResult<Response> {
    let body = signage_service::template_download(&user)?;
    Ok(csv_attachment("signage_template.csv", body))
}
