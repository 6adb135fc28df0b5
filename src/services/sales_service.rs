use std::collections::HashMap;

use sea_orm::{EntityTrait, QueryOrder};

use crate::{
    domain::sales::{OrderSales, SalesReport, SalesRow, build_report, render_sales_csv, sales_rows},
    entity::{
        menu_items::Entity as MenuItems,
        orders::{Column as OrderCol, Entity as Orders},
    },
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    models::Order,
    response::{ApiResponse, Meta},
    services::order_service::order_from_entity,
    state::AppState,
};

fn order_views(orders: &[Order]) -> Vec<OrderSales<'_>> {
    orders
        .iter()
        .map(|o| OrderSales {
            total_price: o.total_price,
            lines: &o.items,
        })
        .collect()
}

async fn collect(state: &AppState) -> AppResult<(Vec<Order>, Vec<SalesRow>)> {
    let orders = Orders::find()
        .order_by_asc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    let category_by_name: HashMap<String, String> = MenuItems::find()
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|item| (item.name, item.category))
        .collect();

    let rows = sales_rows(&order_views(&orders), &category_by_name);
    Ok((orders, rows))
}

pub async fn get_sales_data(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<SalesReport>> {
    ensure_admin(user)?;
    let (orders, rows) = collect(state).await?;
    let report = build_report(&order_views(&orders), &rows);
    tracing::debug!(orders = report.total_orders, revenue = report.total_revenue, "sales report built");
    Ok(ApiResponse::success("Sales", report, Some(Meta::empty())))
}

/// One CSV row per ordered line.
pub async fn download_sales_csv(state: &AppState, user: &AuthUser) -> AppResult<Vec<u8>> {
    ensure_admin(user)?;
    let (_, rows) = collect(state).await?;
    render_sales_csv(&rows)
}
