use std::collections::HashMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    domain::{UNCATEGORIZED, cart::CartLine},
    error::AppError,
};

/// One ordered line flattened for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesRow {
    pub name: String,
    pub quantity: i64,
    pub subtotal: i64,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SalesEntry {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SalesReport {
    pub total_revenue: i64,
    pub total_orders: i64,
    /// Item name to units sold, best seller first.
    pub sales_by_item: Vec<SalesEntry>,
    /// Category to revenue, largest first.
    pub sales_by_category: Vec<SalesEntry>,
}

/// Minimal view of an order needed for the dashboard.
pub struct OrderSales<'a> {
    pub total_price: i64,
    pub lines: &'a [CartLine],
}

/// Flattens order lines, resolving each line's category through the current
/// menu by item name.
pub fn sales_rows(orders: &[OrderSales<'_>], category_by_name: &HashMap<String, String>) -> Vec<SalesRow> {
    orders
        .iter()
        .flat_map(|order| order.lines.iter())
        .map(|line| SalesRow {
            name: line.name.clone(),
            quantity: i64::from(line.quantity),
            subtotal: line.subtotal(),
            category: category_by_name
                .get(&line.name)
                .cloned()
                .unwrap_or_else(|| UNCATEGORIZED.to_string()),
        })
        .collect()
}

pub fn build_report(orders: &[OrderSales<'_>], rows: &[SalesRow]) -> SalesReport {
    let total_revenue = orders.iter().map(|o| o.total_price).sum();
    let total_orders = orders.len() as i64;

    let mut by_item: HashMap<&str, i64> = HashMap::new();
    let mut by_category: HashMap<&str, i64> = HashMap::new();
    for row in rows {
        *by_item.entry(&row.name).or_default() += row.quantity;
        *by_category.entry(&row.category).or_default() += row.subtotal;
    }

    SalesReport {
        total_revenue,
        total_orders,
        sales_by_item: ranked(by_item),
        sales_by_category: ranked(by_category),
    }
}

fn ranked(totals: HashMap<&str, i64>) -> Vec<SalesEntry> {
    let mut entries: Vec<SalesEntry> = totals
        .into_iter()
        .map(|(name, value)| SalesEntry {
            name: name.to_string(),
            value,
        })
        .collect();
    entries.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    entries
}

/// Renders rows as an Excel-friendly CSV (UTF-8 with BOM).
pub fn render_sales_csv(rows: &[SalesRow]) -> Result<Vec<u8>, AppError> {
    let mut buf = "\u{feff}".as_bytes().to_vec();
    {
        let mut writer = csv::Writer::from_writer(&mut buf);
        writer.write_record(["name", "quantity", "subtotal", "category"])?;
        for row in rows {
            let quantity = row.quantity.to_string();
            let subtotal = row.subtotal.to_string();
            writer.write_record([
                row.name.as_str(),
                quantity.as_str(),
                subtotal.as_str(),
                row.category.as_str(),
            ])?;
        }
        writer
            .flush()
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    }
    Ok(buf)
}
