//! Order repository.

use std::sync::Arc;

use boardhop_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter};

use crate::{
    TxScope, UnitOfWork,
    composer::{self, OrderFilter},
    db_err,
    entities::{Order, order},
    hydrator, statement,
    views::{OrderAggregate, OrderSummary},
};

/// Order repository for database operations.
#[derive(Clone)]
pub struct OrderRepository {
    db: Arc<DatabaseConnection>,
}

impl OrderRepository {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Begin a unit of work on this repository's pool.
    pub async fn begin(&self) -> AppResult<UnitOfWork> {
        UnitOfWork::begin(&self.db).await
    }

    /// Insert an order row.
    pub async fn insert(&self, scope: TxScope<'_>, model: order::ActiveModel) -> AppResult<()> {
        let tx = scope.open(&self.db).await?;
        let result = Order::insert(model)
            .exec_without_returning(tx.conn())
            .await
            .map(|_| ())
            .map_err(db_err("insert order"));
        tx.settle(result).await
    }

    /// Find a live order by ID.
    pub async fn find_by_id(&self, scope: TxScope<'_>, id: &str) -> AppResult<Option<order::Model>> {
        let tx = scope.open(&self.db).await?;
        let result = Order::find_by_id(id)
            .filter(order::Column::DeletedAt.is_null())
            .one(tx.conn())
            .await
            .map_err(db_err("find order"));
        tx.settle(result).await
    }

    /// Get an order with its post and message thread.
    pub async fn get(&self, scope: TxScope<'_>, id: &str) -> AppResult<OrderAggregate> {
        let tx = scope.open(&self.db).await?;
        let result = async {
            let conn = tx.conn();
            let order = Order::find_by_id(id)
                .filter(order::Column::DeletedAt.is_null())
                .one(conn)
                .await
                .map_err(db_err("get order"))?
                .ok_or_else(|| AppError::OrderNotFound(id.to_string()))?;
            hydrator::hydrate_order(conn, order).await
        }
        .await;
        tx.settle(result).await
    }

    /// List a renter's orders, one page at a time.
    pub async fn list(
        &self,
        scope: TxScope<'_>,
        filter: &OrderFilter,
    ) -> AppResult<Vec<OrderSummary>> {
        let tx = scope.open(&self.db).await?;
        let conn = tx.conn();
        let result = OrderSummary::find_by_statement(statement(conn, &composer::order_list(filter)))
            .all(conn)
            .await
            .map_err(db_err("list orders"));
        tx.settle(result).await
    }
}
