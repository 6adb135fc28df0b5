use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{domain::status::OrderStatus, models::Order};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub success: bool,
    pub ticket_number: String,
    pub order_id: Uuid,
    pub total_price: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusRequest {
    pub doc_id: Uuid,
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentStatusRequest {
    pub doc_id: Uuid,
}

/// Keypad input on the kitchen and display monitors.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdvanceByTicketRequest {
    pub ticket: String,
    /// Status the ticket is expected to be in; defaults to `調理中`.
    pub from: Option<OrderStatus>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TicketQuery {
    pub ticket: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderFeedQuery {
    /// Comma separated statuses, e.g. `調理中,提供可能`.
    #[serde(alias = "statuses")]
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct LiveFeedQuery {
    pub token: String,
    #[serde(alias = "status")]
    pub statuses: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

/// Order as shown on the completion page and the cashier lookup.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    pub doc_id: Uuid,
    pub order: Order,
    /// Creation time in Japan Standard Time, `YYYY-MM-DD HH:MM:SS`.
    pub formatted_time: String,
}
