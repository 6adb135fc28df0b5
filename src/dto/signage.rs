use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{SignageItem, SignageSettings};

#[derive(Debug, Serialize, ToSchema)]
pub struct SignageFeed {
    pub items: Vec<SignageItem>,
    pub settings: SignageSettings,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignageList {
    pub items: Vec<SignageItem>,
}

/// Single-cell edit from the signage grid.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSignageRequest {
    pub id: Uuid,
    pub field: String,
    #[schema(value_type = Object)]
    pub value: Value,
}
