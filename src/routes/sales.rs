use axum::{Json, Router, extract::State, response::Response, routing::get};

use crate::{
    domain::sales::SalesReport,
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::upload::csv_attachment,
    services::sales_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/get_sales_data", get(get_sales_data))
        .route("/download_sales_csv", get(download_sales_csv))
}

#[utoipa::path(
    get,
    path = "/api/get_sales_data",
    responses(
        (status = 200, description = "Revenue, order count and rankings", body = ApiResponse<SalesReport>)
    ),
    tag = "Admin"
)]
pub async fn get_sales_data(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<SalesReport>>> {
    Ok(Json(sales_service::get_sales_data(&state, &user).await?))
}

#[utoipa::path(
    get,
    path = "/api/download_sales_csv",
    responses(
        (status = 200, description = "One row per ordered line", body = String, content_type = "text/csv")
    ),
    tag = "Admin"
)]
pub async fn download_sales_csv(State(state): State<AppState>, user: AuthUser) -> AppResult<Response> {
    let body = sales_service::download_sales_csv(&state, &user).await?;
    Ok(csv_attachment("sales.csv", body))
}
