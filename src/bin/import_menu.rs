//! `import_menu <file.csv>`: upserts menu rows by `ItemID` without touching
//! items that are not in the file.

use anyhow::Context;
use festival_orders_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    domain::csv_import::parse_menu_csv,
    services::menu_service::upsert_records,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,festival_orders_api=debug".into()),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .context("usage: import_menu <file.csv>")?;
    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("cannot read {path}"))?;
    let records = parse_menu_csv(&bytes)?;

    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let imported = upsert_records(&orm, &records).await?;
    for record in &records {
        println!("{} {} ¥{}", record.id, record.name, record.price);
    }
    println!("Imported {imported} items from {path}");
    Ok(())
}
