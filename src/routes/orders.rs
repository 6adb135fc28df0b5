use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    domain::status::parse_status_list,
    dto::orders::{
        AdvanceByTicketRequest, OrderDetail, OrderFeedQuery, OrderList, TicketQuery,
        UpdateOrderStatusRequest, UpdatePaymentStatusRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Order,
    response::ApiResponse,
    routes::live,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/live", get(live::order_feed))
        .route("/orders/advance_by_ticket", post(advance_by_ticket))
        .route("/orders/{id}", get(get_order))
        .route("/get_order_by_ticket", get(get_order_by_ticket))
        .route("/update_order_status", post(update_order_status))
        .route("/update_payment_status", post(update_payment_status))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("status" = String, Query, description = "Comma separated statuses, e.g. 調理中,提供可能")
    ),
    responses(
        (status = 200, description = "Orders in the given statuses, oldest first", body = ApiResponse<OrderList>)
    ),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderFeedQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let statuses = parse_status_list(&query.status)?;
    Ok(Json(order_service::list_orders(&state, &user, statuses).await?))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order for the completion page", body = ApiResponse<OrderDetail>),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    Ok(Json(order_service::get_order(&state, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/get_order_by_ticket",
    params(
        ("ticket" = String, Query, description = "Ticket number, leading zeros optional")
    ),
    responses(
        (status = 200, description = "Most recent order with this ticket", body = ApiResponse<OrderDetail>),
        (status = 400, description = "Ticket number missing or malformed"),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn get_order_by_ticket(
    State(state): State<AppState>,
    Query(query): Query<TicketQuery>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    Ok(Json(
        order_service::get_order_by_ticket(&state, query.ticket).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/update_order_status",
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order moved one step forward", body = ApiResponse<Order>),
        (status = 400, description = "Transition not allowed or order unpaid"),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    Ok(Json(
        order_service::update_order_status(&state, &user, payload).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/orders/advance_by_ticket",
    request_body = AdvanceByTicketRequest,
    responses(
        (status = 200, description = "Order advanced", body = ApiResponse<Order>),
        (status = 404, description = "No order with this ticket in the expected status"),
    ),
    tag = "Orders"
)]
pub async fn advance_by_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AdvanceByTicketRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    Ok(Json(
        order_service::advance_by_ticket(&state, &user, payload).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/update_payment_status",
    request_body = UpdatePaymentStatusRequest,
    responses(
        (status = 200, description = "Order marked paid", body = ApiResponse<Order>),
        (status = 400, description = "Order already paid"),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn update_payment_status(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdatePaymentStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    Ok(Json(
        order_service::update_payment_status(&state, &user, payload).await?,
    ))
}
