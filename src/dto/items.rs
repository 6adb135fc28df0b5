use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::models::MenuItem;

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuPage {
    pub items: Vec<MenuItem>,
    /// Distinct categories, sorted.
    pub categories: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemList {
    pub items: Vec<MenuItem>,
}

/// Single-cell edit from the menu grid.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateItemRequest {
    pub id: String,
    pub field: String,
    #[schema(value_type = Object)]
    pub value: Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImportSummary {
    pub imported: usize,
}
