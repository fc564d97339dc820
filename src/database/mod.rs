use anyhow::Result;
use sqlx::{PgPool, postgres::PgPoolOptions};

pub mod models;
pub mod repositories;
pub mod store;
pub mod transaction;
pub mod utils;

pub async fn init_database(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    log::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    log::info!("Migrations completed successfully");

    Ok(pool)
}
