//! Pure order-taking rules, independent of storage and HTTP.

pub mod cart;
pub mod csv_import;
pub mod item_field;
pub mod permissions;
pub mod sales;
pub mod status;
pub mod ticket;

/// Category assigned to items that were uploaded without one.
pub const UNCATEGORIZED: &str = "未分類";
