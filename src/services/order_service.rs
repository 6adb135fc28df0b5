use std::collections::{HashMap, HashSet};

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::LockType,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::{
        cart::{Cart, CartLine, validate_set_selection},
        permissions::Page,
        status::{OrderStatus, PaymentStatus, Transition},
        ticket::{normalize_ticket, pick_ticket},
    },
    dto::orders::{
        AdvanceByTicketRequest, CreateOrderResponse, OrderDetail, OrderList,
        UpdateOrderStatusRequest, UpdatePaymentStatusRequest,
    },
    entity::{
        menu_items::{Column as ItemCol, Entity as MenuItems, Model as MenuItemModel},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
    },
    error::{AppError, AppResult},
    live::OrderEvent,
    middleware::auth::{AuthUser, ensure_page},
    models::Order,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Receipts and monitors show times in Japan Standard Time.
const JST_OFFSET_SECS: i32 = 9 * 3600;

/// Creates an order from a client cart. Lines are repriced from the menu and
/// the new ticket is pushed to the kitchen feed.
pub async fn create_order(
    state: &AppState,
    lines: Vec<CartLine>,
) -> AppResult<ApiResponse<CreateOrderResponse>> {
    if lines.is_empty() {
        return Err(AppError::bad_request("Cart is empty"));
    }

    let ids: Vec<String> = lines.iter().map(|l| l.id.clone()).collect();
    let menu: HashMap<String, MenuItemModel> = MenuItems::find()
        .filter(ItemCol::Id.is_in(ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|item| (item.id.clone(), item))
        .collect();

    let cart = price_cart(lines, &menu)?;
    let total_price = cart.total_price();

    let txn = state.orm.begin().await?;

    let active_tickets: HashSet<String> = Orders::find()
        .select_only()
        .column(OrderCol::TicketNumber)
        .filter(OrderCol::Status.ne(OrderStatus::Done.as_str()))
        .into_tuple::<String>()
        .all(&txn)
        .await?
        .into_iter()
        .collect();
    let (ticket_number, unique) = {
        let mut rng = rand::thread_rng();
        pick_ticket(&mut rng, |t| active_tickets.contains(t))
    };
    if !unique {
        tracing::warn!(ticket = %ticket_number, active = active_tickets.len(), "ticket number reused while still active");
    }

    let items = serde_json::to_value(cart.lines()).map_err(|e| AppError::Internal(e.into()))?;
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        ticket_number: Set(ticket_number),
        items: Set(items),
        total_price: Set(total_price),
        status: Set(OrderStatus::Cooking.as_str().to_string()),
        payment_status: Set(PaymentStatus::Unpaid.as_str().to_string()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    let order = order_from_entity(order)?;
    tracing::info!(ticket = %order.ticket_number, order_id = %order.id, total = order.total_price, "order created");
    state.live.publish(OrderEvent::Created(Box::new(order.clone())));

    audit::record(
        &state.pool,
        None,
        "order_create",
        "orders",
        serde_json::json!({ "order_id": order.id, "ticket": order.ticket_number, "total": order.total_price }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order created",
        CreateOrderResponse {
            success: true,
            ticket_number: order.ticket_number,
            order_id: order.id,
            total_price: order.total_price,
        },
        Some(Meta::empty()),
    ))
}

/// Validates submitted lines against the menu and folds them into a cart
/// with menu prices and names.
pub fn price_cart(lines: Vec<CartLine>, menu: &HashMap<String, MenuItemModel>) -> AppResult<Cart> {
    let mut cart = Cart::new();
    for line in lines {
        let item = menu
            .get(&line.id)
            .ok_or_else(|| AppError::bad_request(format!("Unknown item: {}", line.id)))?;
        if item.is_sold_out {
            return Err(AppError::bad_request(format!("{} is sold out", item.name)));
        }

        let selected_items = if item.is_set {
            let options: Vec<String> = serde_json::from_value(item.set_items.clone()).unwrap_or_default();
            validate_set_selection(
                &item.name,
                item.set_count.unwrap_or(0),
                &options,
                &line.selected_items,
            )?;
            line.selected_items
        } else {
            if line.is_set || !line.selected_items.is_empty() {
                return Err(AppError::bad_request(format!(
                    "{} is not a set product",
                    item.name
                )));
            }
            Vec::new()
        };

        let image_url = if item.image_url.is_empty() {
            None
        } else {
            Some(item.image_url.clone())
        };

        cart.add(CartLine {
            id: item.id.clone(),
            name: item.name.clone(),
            price: item.price,
            quantity: line.quantity,
            image_url,
            is_set: item.is_set,
            selected_items,
        })?;
    }
    Ok(cart)
}

/// Orders in any of `statuses`, oldest first: what a monitor column shows.
pub async fn snapshot<C: ConnectionTrait>(conn: &C, statuses: &[OrderStatus]) -> AppResult<Vec<Order>> {
    let labels: Vec<&str> = statuses.iter().map(OrderStatus::as_str).collect();
    Orders::find()
        .filter(OrderCol::Status.is_in(labels))
        .order_by_asc(OrderCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect()
}

/// Monitors that are allowed to watch each status.
pub fn feed_pages(status: OrderStatus) -> &'static [Page] {
    match status {
        OrderStatus::Cooking => &[Page::Kitchen, Page::Display],
        OrderStatus::Ready => &[Page::Display, Page::Cashier],
        OrderStatus::Done => &[Page::Admin],
    }
}

pub async fn ensure_feed_access(
    state: &AppState,
    user: &AuthUser,
    statuses: &[OrderStatus],
) -> AppResult<()> {
    for status in statuses {
        ensure_page(state, user, feed_pages(*status)).await?;
    }
    Ok(())
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    statuses: Vec<OrderStatus>,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_feed_access(state, user, &statuses).await?;
    let items = snapshot(&state.orm, &statuses).await?;
    let total = items.len();
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items },
        Some(Meta::all(total)),
    ))
}

pub async fn get_order(state: &AppState, id: Uuid) -> AppResult<ApiResponse<OrderDetail>> {
    let order = Orders::find_by_id(id).one(&state.orm).await?;
    let order = match order {
        Some(o) => order_from_entity(o)?,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success(
        "Order",
        order_detail(order),
        Some(Meta::empty()),
    ))
}

pub async fn get_order_by_ticket(
    state: &AppState,
    ticket: Option<String>,
) -> AppResult<ApiResponse<OrderDetail>> {
    let ticket = ticket
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::bad_request("Ticket number is required"))?;
    let ticket = normalize_ticket(ticket)
        .ok_or_else(|| AppError::bad_request(format!("Invalid ticket number: {ticket}")))?;

    let order = find_latest_by_ticket(&state.orm, &ticket, None).await?;
    let order = match order {
        Some(o) => order_from_entity(o)?,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success(
        "Order",
        order_detail(order),
        Some(Meta::empty()),
    ))
}

async fn find_latest_by_ticket<C: ConnectionTrait>(
    conn: &C,
    ticket: &str,
    status: Option<OrderStatus>,
) -> AppResult<Option<OrderModel>> {
    let mut condition = Condition::all().add(OrderCol::TicketNumber.eq(ticket));
    if let Some(status) = status {
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }
    Ok(Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::CreatedAt)
        .one(conn)
        .await?)
}

/// Which screen may move an order into `target`.
pub fn transition_pages(target: OrderStatus) -> &'static [Page] {
    match target {
        OrderStatus::Cooking => &[Page::Admin],
        OrderStatus::Ready => &[Page::Kitchen],
        OrderStatus::Done => &[Page::Display, Page::Cashier],
    }
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_page(state, user, transition_pages(payload.status)).await?;
    let order = apply_status(state, user, payload.doc_id, payload.status).await?;
    Ok(ApiResponse::success(
        "Order updated",
        order,
        Some(Meta::empty()),
    ))
}

/// Keypad shortcut: advances the ticket currently in `from` (default `調理中`).
pub async fn advance_by_ticket(
    state: &AppState,
    user: &AuthUser,
    payload: AdvanceByTicketRequest,
) -> AppResult<ApiResponse<Order>> {
    let from = payload.from.unwrap_or(OrderStatus::Cooking);
    let target = from
        .next()
        .ok_or_else(|| AppError::bad_request(format!("Orders in {from} cannot advance")))?;
    ensure_page(state, user, transition_pages(target)).await?;

    let ticket = normalize_ticket(&payload.ticket)
        .ok_or_else(|| AppError::bad_request(format!("Invalid ticket number: {}", payload.ticket)))?;
    let order = find_latest_by_ticket(&state.orm, &ticket, Some(from)).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let order = apply_status(state, user, order.id, target).await?;
    Ok(ApiResponse::success(
        "Order updated",
        order,
        Some(Meta::empty()),
    ))
}

async fn apply_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    target: OrderStatus,
) -> AppResult<Order> {
    let txn = state.orm.begin().await?;
    let existing = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let current: OrderStatus = existing.status.parse()?;
    let payment: PaymentStatus = existing.payment_status.parse()?;
    let transition = current.transition_to(target, payment)?;

    let model = match transition {
        Transition::Unchanged => {
            txn.commit().await?;
            tracing::debug!(order_id = %id, status = %current, "status unchanged");
            return order_from_entity(existing);
        }
        Transition::Advance(next) => {
            let mut active: OrderActive = existing.into();
            active.status = Set(next.as_str().to_string());
            active.updated_at = Set(Utc::now().into());
            active.update(&txn).await?
        }
    };
    txn.commit().await?;

    let order = order_from_entity(model)?;
    tracing::info!(ticket = %order.ticket_number, order_id = %order.id, from = %current, to = %order.status, "order status changed");
    state.live.publish(OrderEvent::Updated {
        order: Box::new(order.clone()),
        previous: current,
    });

    audit::record(
        &state.pool,
        Some(&user.username),
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "from": current, "to": order.status }),
    )
    .await;

    Ok(order)
}

pub async fn update_payment_status(
    state: &AppState,
    user: &AuthUser,
    payload: UpdatePaymentStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_page(state, user, &[Page::Cashier]).await?;

    let txn = state.orm.begin().await?;
    let existing = Orders::find_by_id(payload.doc_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let payment: PaymentStatus = existing.payment_status.parse()?;
    if payment == PaymentStatus::Paid {
        return Err(AppError::bad_request("Order already paid"));
    }
    let status: OrderStatus = existing.status.parse()?;

    let mut active: OrderActive = existing.into();
    active.payment_status = Set(PaymentStatus::Paid.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let model = active.update(&txn).await?;
    txn.commit().await?;

    let order = order_from_entity(model)?;
    tracing::info!(ticket = %order.ticket_number, order_id = %order.id, "order paid");
    state.live.publish(OrderEvent::Updated {
        order: Box::new(order.clone()),
        previous: status,
    });

    audit::record(
        &state.pool,
        Some(&user.username),
        "order_paid",
        "orders",
        serde_json::json!({ "order_id": order.id, "total": order.total_price }),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment recorded",
        order,
        Some(Meta::empty()),
    ))
}

pub fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    let items: Vec<CartLine> = serde_json::from_value(model.items)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("order {} has malformed items: {e}", model.id)))?;
    Ok(Order {
        id: model.id,
        ticket_number: model.ticket_number,
        items,
        total_price: model.total_price,
        status: model.status.parse()?,
        payment_status: model.payment_status.parse()?,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub fn format_jst(at: DateTime<Utc>) -> String {
    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";
    match FixedOffset::east_opt(JST_OFFSET_SECS) {
        Some(jst) => at.with_timezone(&jst).format(FORMAT).to_string(),
        None => at.format(FORMAT).to_string(),
    }
}

fn order_detail(order: Order) -> OrderDetail {
    OrderDetail {
        doc_id: order.id,
        formatted_time: format_jst(order.created_at),
        order,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn menu_item(id: &str, price: i64) -> MenuItemModel {
        MenuItemModel {
            id: id.into(),
            name: format!("商品{id}"),
            price,
            category: "フード".into(),
            description: String::new(),
            image_url: String::new(),
            allergens: json!([]),
            is_sold_out: false,
            is_set: false,
            set_count: None,
            set_items: json!([]),
            created_at: Utc::now().into(),
        }
    }

    fn menu(items: Vec<MenuItemModel>) -> HashMap<String, MenuItemModel> {
        items.into_iter().map(|i| (i.id.clone(), i)).collect()
    }

    fn submitted(id: &str, price: i64, quantity: i32) -> CartLine {
        CartLine {
            id: id.into(),
            name: "client name".into(),
            price,
            quantity,
            image_url: None,
            is_set: false,
            selected_items: Vec::new(),
        }
    }

    #[test]
    fn prices_come_from_the_menu() {
        let menu = menu(vec![menu_item("A01", 400), menu_item("B01", 150)]);
        let cart = price_cart(
            vec![submitted("A01", 1, 2), submitted("B01", 1, 1), submitted("A01", 1, 1)],
            &menu,
        )
        .unwrap();
        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.lines()[0].name, "商品A01");
        assert_eq!(cart.lines()[0].quantity, 3);
        assert_eq!(cart.total_price(), 1350);
    }

    #[test]
    fn unknown_and_sold_out_items_are_rejected() {
        let mut sold_out = menu_item("C01", 300);
        sold_out.is_sold_out = true;
        let menu = menu(vec![sold_out]);
        assert!(price_cart(vec![submitted("Z99", 100, 1)], &menu).is_err());
        assert!(price_cart(vec![submitted("C01", 300, 1)], &menu).is_err());
    }

    #[test]
    fn set_lines_are_validated() {
        let mut set = menu_item("S1", 700);
        set.is_set = true;
        set.set_count = Some(2);
        set.set_items = json!(["から揚げ", "ポテト", "たこ焼き"]);
        let menu = menu(vec![set, menu_item("A01", 400)]);

        let mut line = submitted("S1", 700, 1);
        line.is_set = true;
        line.selected_items = vec!["から揚げ".into(), "ポテト".into()];
        let cart = price_cart(vec![line.clone()], &menu).unwrap();
        assert!(cart.lines()[0].is_set);

        line.selected_items.pop();
        assert!(price_cart(vec![line], &menu).is_err());

        let mut fake = submitted("A01", 400, 1);
        fake.selected_items = vec!["ポテト".into()];
        assert!(price_cart(vec![fake], &menu).is_err());
    }

    #[test]
    fn feed_and_transition_pages() {
        assert!(feed_pages(OrderStatus::Cooking).contains(&Page::Kitchen));
        assert!(feed_pages(OrderStatus::Ready).contains(&Page::Cashier));
        assert_eq!(transition_pages(OrderStatus::Ready), &[Page::Kitchen]);
        assert!(transition_pages(OrderStatus::Done).contains(&Page::Display));
    }

    #[test]
    fn jst_formatting() {
        let at = Utc.with_ymd_and_hms(2025, 9, 20, 23, 30, 5).unwrap();
        assert_eq!(format_jst(at), "2025-09-21 08:30:05");
    }

    #[test]
    fn entity_conversion_parses_labels() {
        let model = OrderModel {
            id: Uuid::new_v4(),
            ticket_number: "0420".into(),
            items: json!([{"id": "A01", "name": "焼きそば", "price": 400, "quantity": 2}]),
            total_price: 800,
            status: "提供可能".into(),
            payment_status: "会計済".into(),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        };
        let order = order_from_entity(model).unwrap();
        assert_eq!(order.status, OrderStatus::Ready);
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.items[0].subtotal(), 800);
    }
}
