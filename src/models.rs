use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    cart::CartLine,
    permissions::Role,
    status::{OrderStatus, PaymentStatus},
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub category: String,
    pub description: String,
    pub image_url: String,
    pub allergens: Vec<String>,
    pub is_sold_out: bool,
    pub is_set: bool,
    pub set_count: Option<i32>,
    pub set_items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub ticket_number: String,
    pub items: Vec<CartLine>,
    pub total_price: i64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignageItem {
    pub id: Uuid,
    pub url: String,
    pub duration: i32,
    pub order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignageSettings {
    /// Cross-fade length in seconds.
    pub fade_duration: f64,
}

impl Default for SignageSettings {
    fn default() -> Self {
        Self { fade_duration: 1.5 }
    }
}

/// A staff account as listed to superadmins; the password hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}
