//! Database layer for boardhop.
//!
//! Reads go through [`composer`] and [`hydrator`]; every repository call
//! takes a [`TxScope`] that decides which transaction it runs in.

pub mod composer;
pub mod entities;
pub mod hydrator;
pub mod migrations;
pub mod repositories;
pub mod test_utils;
pub mod transaction;
pub mod views;

pub use transaction::{TxScope, UnitOfWork};

use boardhop_common::{AppError, Config};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement,
    StatementBuilder,
};
use std::time::Duration;
use tracing::log::LevelFilter;

/// Initialize database connection.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    let mut opt = ConnectOptions::new(&config.database.url);

    opt.max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    Database::connect(opt).await.map_err(db_err("connect"))
}

/// Run pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    use sea_orm_migration::MigratorTrait;
    migrations::Migrator::up(db, None)
        .await
        .map_err(db_err("migrate"))
}

/// Wrap a driver error with the name of the failing operation.
pub(crate) fn db_err(op: &'static str) -> impl FnOnce(DbErr) -> AppError {
    move |e| AppError::Database(format!("{op}: {e}"))
}

/// Build `stmt` for the connection's backend.
pub(crate) fn statement<C, S>(conn: &C, stmt: &S) -> Statement
where
    C: ConnectionTrait,
    S: StatementBuilder,
{
    conn.get_database_backend().build(stmt)
}
