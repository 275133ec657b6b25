use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::future::Future;
use std::time::Duration;

pub type DbPool = DatabaseConnection;

pub async fn create_pool(config: &DatabaseConfig) -> AppResult<DbPool> {
    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections)
        .sqlx_logging(false);

    let pool = Database::connect(opt).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> AppResult<()> {
    Migrator::up(pool, None).await?;
    Ok(())
}

/// Runs `operation` under a deadline.
///
/// On expiry the operation future is dropped, which drops any transaction it
/// had open; sea-orm rolls an uncommitted transaction back on drop, so
/// nothing from the timed-out call is persisted.
pub async fn with_deadline<T, F>(deadline: Duration, operation: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(deadline, operation).await {
        Ok(result) => result,
        Err(_) => {
            log::warn!("Operation exceeded deadline of {deadline:?}, rolled back");
            Err(AppError::Timeout(deadline))
        }
    }
}
