use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde_json::{Map, Value};

use crate::{
    domain::cart::CartLine,
    dto::{items::MenuPage, orders::CreateOrderResponse},
    error::AppResult,
    response::{ApiResponse, Meta},
    services::{menu_service, order_service, settings_service},
    state::AppState,
};

/// Public endpoints used by the customer pages.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/menu", get(menu))
        .route("/store_info", get(store_info))
}

/// `POST /order` lives outside `/api`, where the cart page posts it.
pub fn checkout_router() -> Router<AppState> {
    Router::new().route("/order", post(create_order))
}

#[utoipa::path(
    get,
    path = "/api/menu",
    responses(
        (status = 200, description = "Menu items and categories", body = ApiResponse<MenuPage>)
    ),
    tag = "Menu"
)]
pub async fn menu(State(state): State<AppState>) -> AppResult<Json<ApiResponse<MenuPage>>> {
    Ok(Json(menu_service::menu_page(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/store_info",
    responses(
        (status = 200, description = "Store settings shown on every page")
    ),
    tag = "Menu"
)]
pub async fn store_info(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Map<String, Value>>>> {
    let settings = settings_service::load_store_settings(&state).await?;
    Ok(Json(ApiResponse::success(
        "Store info",
        settings,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    post,
    path = "/order",
    request_body = Vec<CartLine>,
    responses(
        (status = 201, description = "Order created", body = ApiResponse<CreateOrderResponse>),
        (status = 400, description = "Empty cart, unknown or sold-out item, invalid set selection")
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(lines): Json<Vec<CartLine>>,
) -> AppResult<(StatusCode, Json<ApiResponse<CreateOrderResponse>>)> {
    let resp = order_service::create_order(&state, lines).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
