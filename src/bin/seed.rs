//! Creates the first superadmin and a small sample menu.
//!
//! `SEED_SUPERADMIN_USER` / `SEED_SUPERADMIN_PASSWORD` override the defaults.

use festival_orders_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    services::auth_service::hash_password,
};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;
    let pool = create_pool(&config.database_url).await?;

    let username = std::env::var("SEED_SUPERADMIN_USER").unwrap_or_else(|_| "superadmin".to_string());
    let password =
        std::env::var("SEED_SUPERADMIN_PASSWORD").unwrap_or_else(|_| "superadmin123".to_string());
    ensure_user(&pool, &username, &password, "superadmin").await?;
    seed_menu(&pool).await?;

    println!("Seed completed. Log in as {username}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<()> {
    let password_hash = hash_password(password)?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO users (username, password_hash, role)
        VALUES ($1, $2, $3)
        ON CONFLICT (username) DO NOTHING
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .bind(role)
    .execute(pool)
    .await?
    .rows_affected();

    if inserted == 0 {
        println!("User {username} already exists, left untouched");
    } else {
        println!("Created user {username} (role={role})");
    }
    Ok(())
}

async fn seed_menu(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let items = vec![
        ("F01", "焼きそば", 400, "フード", json!(["小麦", "大豆"]), None, json!([])),
        ("F02", "たこ焼き", 350, "フード", json!(["小麦", "卵"]), None, json!([])),
        ("F03", "フライドポテト", 300, "フード", json!([]), None, json!([])),
        ("D01", "ラムネ", 150, "ドリンク", json!([]), None, json!([])),
        (
            "S01",
            "よくばりセット",
            800,
            "セット",
            json!([]),
            Some(2),
            json!(["焼きそば", "たこ焼き", "フライドポテト"]),
        ),
    ];

    for (id, name, price, category, allergens, set_count, set_items) in items {
        sqlx::query(
            r#"
            INSERT INTO menu_items (id, name, price, category, allergens, is_set, set_count, set_items)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(price as i64)
        .bind(category)
        .bind(allergens)
        .bind(set_count.is_some())
        .bind(set_count)
        .bind(set_items)
        .execute(pool)
        .await?;
    }

    println!("Seeded menu");
    Ok(())
}
