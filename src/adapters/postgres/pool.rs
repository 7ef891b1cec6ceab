//! Connection pool setup.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;

/// Opens a pool sized and timed from `config`, running the bundled
/// migrations first when `run_migrations` is set.
///
/// # Errors
///
/// Returns the sqlx error if the database is unreachable or a migration fails.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(Some(config.idle_timeout()))
        .max_lifetime(Some(config.max_lifetime()))
        .connect(&config.url)
        .await?;

    if config.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    tracing::debug!(
        url = %config.redacted_url(),
        max_connections = config.max_connections,
        "Database pool ready"
    );
    Ok(pool)
}
