use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Historical data is read-only here; a small pool covers concurrent forecasts.
const MAX_CONNECTIONS: u32 = 5;

/// Creates the pool backing the historical data source and checks the
/// `employment_data` table is reachable.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM employment_data")
        .fetch_one(&pool)
        .await
        .context("employment_data table is not readable")?;

    info!("PostgreSQL pool established ({rows} employment_data rows)");
    Ok(pool)
}
