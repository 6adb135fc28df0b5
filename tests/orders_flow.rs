use std::sync::{Arc, LazyLock};

use festival_orders_api::{
    db::{create_pool, run_migrations},
    domain::{
        cart::CartLine,
        csv_import::parse_menu_csv,
        permissions::Role,
        status::{OrderStatus, PaymentStatus},
    },
    dto::{
        items::UpdateItemRequest,
        orders::{
            AdvanceByTicketRequest, LiveFeedQuery, UpdateOrderStatusRequest,
            UpdatePaymentStatusRequest,
        },
        signage::UpdateSignageRequest,
        users::{AddUserRequest, DeleteUserRequest},
    },
    error::AppError,
    live::{LiveOrderHub, OrderEvent},
    middleware::auth::AuthUser,
    routes::live::authorize_feed,
    services::{
        auth_service, menu_service, menu_service::upsert_records, order_service, reset_service,
        sales_service, signage_service, user_service,
    },
    state::{AppState, JwtSettings},
};
use sea_orm::{ConnectionTrait, SqlxPostgresConnector, Statement};
use serde_json::json;

// tests share one database, so they take turns
static DB_LOCK: LazyLock<tokio::sync::Mutex<()>> = LazyLock::new(|| tokio::sync::Mutex::new(()));

const MENU_CSV: &str = "ItemID,Name,Price,Category,ImageURL,Description,Status,Allergens,SetCount,SetItems\n\
F01,焼きそば,400,フード,,,販売中,小麦/大豆,,\n\
D01,ラムネ,¥150,ドリンク,,,販売中,,,\n\
X01,かき氷,250,デザート,,,売り切れ,,,\n\
S01,よくばりセット,800,セット,,,販売中,,2,焼きそば/ラムネ/かき氷\n";

// checkout -> kitchen marks ready -> cashier takes payment -> hand-over, then sales.
#[tokio::test]
async fn checkout_ready_pay_done_and_sales_flow() -> anyhow::Result<()> {
    let _db = DB_LOCK.lock().await;
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let kitchen = staff("kitchen01", Role::Admin);
    let cashier = staff("cashier01", Role::Staff);
    let mut feed = state.live.subscribe();

    let created = order_service::create_order(
        &state,
        vec![line("F01", 2, &[]), line("D01", 1, &[]), line("F01", 1, &[])],
    )
    .await?
    .data
    .expect("created");
    assert!(created.success);
    assert_eq!(created.ticket_number.len(), 4);
    // 3 x 400 + 150, client prices ignored
    assert_eq!(created.total_price, 1350);
    assert!(matches!(feed.recv().await?, OrderEvent::Created(_)));

    let cooking = order_service::snapshot(&state.orm, &[OrderStatus::Cooking]).await?;
    assert_eq!(cooking.len(), 1);
    assert_eq!(cooking[0].items.len(), 2);

    let by_ticket = order_service::get_order_by_ticket(&state, Some(created.ticket_number.clone()))
        .await?
        .data
        .expect("order");
    assert_eq!(by_ticket.doc_id, created.order_id);

    // staff may not open the kitchen screen by default
    let denied = order_service::update_order_status(
        &state,
        &cashier,
        UpdateOrderStatusRequest {
            doc_id: created.order_id,
            status: OrderStatus::Ready,
        },
    )
    .await;
    assert!(matches!(denied, Err(AppError::Forbidden)));

    let ready = order_service::advance_by_ticket(
        &state,
        &kitchen,
        AdvanceByTicketRequest {
            ticket: created.ticket_number.clone(),
            from: None,
        },
    )
    .await?
    .data
    .expect("ready");
    assert_eq!(ready.status, OrderStatus::Ready);

    // duplicate tap is a no-op
    let again = order_service::update_order_status(
        &state,
        &kitchen,
        UpdateOrderStatusRequest {
            doc_id: created.order_id,
            status: OrderStatus::Ready,
        },
    )
    .await?
    .data
    .expect("unchanged");
    assert_eq!(again.status, OrderStatus::Ready);

    let unpaid = order_service::update_order_status(
        &state,
        &cashier,
        UpdateOrderStatusRequest {
            doc_id: created.order_id,
            status: OrderStatus::Done,
        },
    )
    .await;
    assert!(matches!(unpaid, Err(AppError::BadRequest(_))));

    let paid = order_service::update_payment_status(
        &state,
        &cashier,
        UpdatePaymentStatusRequest {
            doc_id: created.order_id,
        },
    )
    .await?
    .data
    .expect("paid");
    assert_eq!(paid.payment_status, PaymentStatus::Paid);

    let twice = order_service::update_payment_status(
        &state,
        &cashier,
        UpdatePaymentStatusRequest {
            doc_id: created.order_id,
        },
    )
    .await;
    assert!(matches!(twice, Err(AppError::BadRequest(_))));

    let done = order_service::update_order_status(
        &state,
        &cashier,
        UpdateOrderStatusRequest {
            doc_id: created.order_id,
            status: OrderStatus::Done,
        },
    )
    .await?
    .data
    .expect("done");
    assert_eq!(done.status, OrderStatus::Done);

    let report = sales_service::get_sales_data(&state, &kitchen)
        .await?
        .data
        .expect("report");
    assert_eq!(report.total_orders, 1);
    assert_eq!(report.total_revenue, 1350);
    assert_eq!(report.sales_by_item[0].name, "焼きそば");
    assert_eq!(report.sales_by_item[0].value, 3);
    assert_eq!(report.sales_by_category[0].name, "フード");
    assert_eq!(report.sales_by_category[0].value, 1200);

    let csv = sales_service::download_sales_csv(&state, &kitchen).await?;
    let text = String::from_utf8(csv)?;
    assert!(text.starts_with("\u{feff}name,quantity,subtotal,category"));
    assert!(text.contains("ラムネ,1,150,ドリンク"));

    Ok(())
}

#[tokio::test]
async fn checkout_rejects_bad_carts() -> anyhow::Result<()> {
    let _db = DB_LOCK.lock().await;
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let empty = order_service::create_order(&state, Vec::new()).await;
    assert!(matches!(empty, Err(AppError::BadRequest(_))));

    let sold_out = order_service::create_order(&state, vec![line("X01", 1, &[])]).await;
    assert!(matches!(sold_out, Err(AppError::BadRequest(_))));

    let short_set = order_service::create_order(&state, vec![line("S01", 1, &["焼きそば"])]).await;
    assert!(matches!(short_set, Err(AppError::BadRequest(_))));

    let set = order_service::create_order(&state, vec![line("S01", 1, &["焼きそば", "ラムネ"])])
        .await?
        .data
        .expect("set order");
    assert_eq!(set.total_price, 800);

    Ok(())
}

#[tokio::test]
async fn users_and_reset() -> anyhow::Result<()> {
    let _db = DB_LOCK.lock().await;
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let root = staff("root", Role::Superadmin);
    let admin = staff("manager", Role::Admin);

    let missing = user_service::add_user(
        &state,
        &root,
        AddUserRequest {
            username: Some("clerk".into()),
            password: None,
            role: Some("staff".into()),
        },
    )
    .await;
    assert!(matches!(missing, Err(AppError::BadRequest(_))));

    let forbidden = user_service::get_users(&state, &admin).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    for name in ["root", "clerk"] {
        user_service::add_user(
            &state,
            &root,
            AddUserRequest {
                username: Some(name.into()),
                password: Some("password".into()),
                role: Some(if name == "root" { "superadmin" } else { "staff" }.into()),
            },
        )
        .await?;
    }
    let duplicate = user_service::add_user(
        &state,
        &root,
        AddUserRequest {
            username: Some("clerk".into()),
            password: Some("password".into()),
            role: Some("staff".into()),
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::BadRequest(_))));

    let self_delete = user_service::delete_user(
        &state,
        &root,
        DeleteUserRequest {
            username: Some("root".into()),
        },
    )
    .await;
    assert!(matches!(self_delete, Err(AppError::BadRequest(_))));

    order_service::create_order(&state, vec![line("D01", 1, &[])]).await?;
    reset_service::reset(&state, &root, reset_service::ResetScope::AllButCaller).await?;

    let users = user_service::get_users(&state, &root).await?.data.expect("users");
    assert_eq!(users.items.len(), 1);
    assert_eq!(users.items[0].username, "root");
    let orders = order_service::snapshot(&state.orm, &[OrderStatus::Cooking]).await?;
    assert!(orders.is_empty());

    Ok(())
}

#[tokio::test]
async fn menu_upload_keeps_old_menu_on_bad_file() -> anyhow::Result<()> {
    let _db = DB_LOCK.lock().await;
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = staff("manager", Role::Admin);

    let bad = "ItemID,Name,Price,Category,Status\n\
N01,たこ焼き,500,フード,販売中\n\
N02,フランク,5000000000000000000,フード,販売中\n";
    let rejected = menu_service::upload_csv(&state, &admin, bad.as_bytes()).await;
    assert!(matches!(rejected, Err(AppError::BadRequest(_))));

    let items = menu_service::list_items(&state, &admin).await?.data.expect("items");
    assert_eq!(items.items.len(), 4);
    assert!(items.items.iter().all(|i| i.id != "N01"));

    let good = "ItemID,Name,Price,Category,Status\nN01,たこ焼き,500,フード,販売中\n";
    let summary = menu_service::upload_csv(&state, &admin, good.as_bytes())
        .await?
        .data
        .expect("summary");
    assert_eq!(summary.imported, 1);
    let items = menu_service::list_items(&state, &admin).await?.data.expect("items");
    assert_eq!(items.items.len(), 1);
    assert_eq!(items.items[0].price, 500);

    Ok(())
}

#[tokio::test]
async fn is_set_needs_a_set_count() -> anyhow::Result<()> {
    let _db = DB_LOCK.lock().await;
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = staff("manager", Role::Admin);

    let plain = menu_service::update_item(
        &state,
        &admin,
        UpdateItemRequest {
            id: "F01".into(),
            field: "isSet".into(),
            value: json!(true),
        },
    )
    .await;
    assert!(matches!(plain, Err(AppError::BadRequest(_))));

    let set = menu_service::update_item(
        &state,
        &admin,
        UpdateItemRequest {
            id: "S01".into(),
            field: "isSet".into(),
            value: json!(true),
        },
    )
    .await?
    .data
    .expect("set");
    assert!(set.is_set);
    assert_eq!(set.set_count, Some(2));

    // F01 is still orderable as a plain item
    let order = order_service::create_order(&state, vec![line("F01", 1, &[])])
        .await?
        .data
        .expect("order");
    assert_eq!(order.total_price, 400);

    Ok(())
}

#[tokio::test]
async fn signage_replace_edit_and_play_order() -> anyhow::Result<()> {
    let _db = DB_LOCK.lock().await;
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = staff("manager", Role::Admin);
    let clerk = staff("clerk", Role::Staff);

    let csv = "url,duration,order\n\
https://example.com/a.png,10,2\n\
https://example.com/b.png,5,1\n\
https://example.com/c.png,8,3\n";
    let denied = signage_service::upload_signage_csv(&state, &clerk, csv.as_bytes()).await;
    assert!(matches!(denied, Err(AppError::Forbidden)));
    signage_service::upload_signage_csv(&state, &admin, csv.as_bytes()).await?;

    let feed = signage_service::signage_feed(&state).await?.data.expect("feed");
    let urls: Vec<&str> = feed.items.iter().map(|i| i.url.as_str()).collect();
    assert_eq!(
        urls,
        ["https://example.com/b.png", "https://example.com/a.png", "https://example.com/c.png"]
    );

    let last = feed.items[2].id;
    let edited = signage_service::update_signage_item(
        &state,
        &admin,
        UpdateSignageRequest {
            id: last,
            field: "order".into(),
            value: json!(0),
        },
    )
    .await?
    .data
    .expect("edited");
    assert_eq!(edited.order, 0);
    let bad_duration = signage_service::update_signage_item(
        &state,
        &admin,
        UpdateSignageRequest {
            id: last,
            field: "duration".into(),
            value: json!(0),
        },
    )
    .await;
    assert!(matches!(bad_duration, Err(AppError::BadRequest(_))));

    let feed = signage_service::signage_feed(&state).await?.data.expect("feed");
    assert_eq!(feed.items[0].url, "https://example.com/c.png");

    // a broken file leaves the playlist alone
    let broken = "url,duration,order\nhttps://example.com/d.png,0,1\n";
    assert!(signage_service::upload_signage_csv(&state, &admin, broken.as_bytes()).await.is_err());

    let replacement = "url,duration,order\nhttps://example.com/d.png,4,1\n";
    signage_service::upload_signage_csv(&state, &admin, replacement.as_bytes()).await?;
    let list = signage_service::signage_list(&state, &admin).await?.data.expect("list");
    assert_eq!(list.items.len(), 1);
    assert_eq!(list.items[0].duration, 4);

    Ok(())
}

#[tokio::test]
async fn tokens_follow_the_stored_account() -> anyhow::Result<()> {
    let _db = DB_LOCK.lock().await;
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let root = staff("root", Role::Superadmin);
    user_service::add_user(
        &state,
        &root,
        AddUserRequest {
            username: Some("clerk".into()),
            password: Some("password".into()),
            role: Some("staff".into()),
        },
    )
    .await?;

    // token claims admin, the account is staff
    let token = auth_service::issue_token(&state.jwt, "clerk", Role::Admin)?;
    let user = auth_service::authenticate(&state, &token).await?;
    assert_eq!(user.role, Role::Staff);

    let feed = |statuses: &str| LiveFeedQuery {
        token: format!("Bearer {token}"),
        statuses: statuses.into(),
    };
    let (_, statuses) = authorize_feed(&state, &feed("提供可能")).await?;
    assert_eq!(statuses, [OrderStatus::Ready]);
    let forbidden = authorize_feed(&state, &feed("完了")).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    user_service::delete_user(
        &state,
        &root,
        DeleteUserRequest {
            username: Some("clerk".into()),
        },
    )
    .await?;
    let gone = auth_service::authenticate(&state, &token).await;
    assert!(matches!(gone, Err(AppError::Unauthorized(_))));
    let gone_feed = authorize_feed(&state, &feed("提供可能")).await;
    assert!(matches!(gone_feed, Err(AppError::Unauthorized(_))));

    Ok(())
}

fn staff(username: &str, role: Role) -> AuthUser {
    AuthUser {
        username: username.into(),
        role,
    }
}

fn line(id: &str, quantity: i32, selected: &[&str]) -> CartLine {
    CartLine {
        id: id.into(),
        name: String::new(),
        price: 1,
        quantity,
        image_url: None,
        is_set: !selected.is_empty(),
        selected_items: selected.iter().map(|s| s.to_string()).collect(),
    }
}

/// Fresh schema with the sample menu, or `None` when no database is configured.
async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url).await?;
    let orm = SqlxPostgresConnector::from_sqlx_postgres_pool(pool.clone());
    run_migrations(&orm).await?;

    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE orders, menu_items, signage_items, settings, audit_logs, users",
    ))
    .await?;

    let records = parse_menu_csv(MENU_CSV.as_bytes())?;
    upsert_records(&orm, &records).await?;

    Ok(Some(AppState {
        pool,
        orm,
        live: LiveOrderHub::new(),
        jwt: JwtSettings {
            secret: Arc::from("test-secret"),
            ttl_hours: 1,
        },
    }))
}
